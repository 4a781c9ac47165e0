use wgpu::util::DeviceExt;

use crate::renderer::Renderer;

use super::primitives::MeshData;

pub type IndexRange = (std::ops::Bound<u64>, std::ops::Bound<u64>);

const FULL_RANGE: IndexRange = (std::ops::Bound::Unbounded, std::ops::Bound::Unbounded);

/*
 * A mesh may be split into several draw calls sharing the same buffers, each
 * drawing a slice of them. Everything in the scene only ever uses one submesh,
 * since gltf primitives are imported as separate meshes.
 */
pub struct SubMesh {
    pub vertex_ranges: Vec<IndexRange>,
    pub index_range: Option<IndexRange>,
    pub num_elements: u32,
}

pub struct StaticMesh {
    pub vertex_buffers: Vec<wgpu::Buffer>,
    pub index_buffer: Option<wgpu::Buffer>,
    pub index_format: wgpu::IndexFormat,
    pub submeshes: Vec<SubMesh>,
}

impl StaticMesh {
    pub fn vertex_buffer_slices(&self, submesh_idx: usize) -> Vec<wgpu::BufferSlice> {
        self.vertex_buffers
            .iter()
            .zip(self.submeshes[submesh_idx].vertex_ranges.iter())
            .map(|(buffer, range)| buffer.slice(*range))
            .collect::<Vec<wgpu::BufferSlice>>()
    }

    pub fn index_buffer_slice(&self, submesh_idx: usize) -> Option<wgpu::BufferSlice> {
        let range = self.submeshes[submesh_idx].index_range?;
        self.index_buffer.as_ref().map(|buffer| buffer.slice(range))
    }

    pub fn num_elements(&self, submesh_idx: usize) -> u32 {
        self.submeshes[submesh_idx].num_elements
    }
}

// Helper struct for building meshes
pub struct MeshBuilder<'a> {
    renderer: &'a Renderer,
    label: wgpu::Label<'a>,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_format: wgpu::IndexFormat,
    submeshes: Vec<SubMesh>,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(renderer: &'a Renderer, name: Option<&'a str>) -> Self {
        Self {
            renderer,
            label: name,
            vertex_buffers: vec![],
            index_buffer: None,
            index_format: wgpu::IndexFormat::Uint32,
            submeshes: vec![],
        }
    }

    pub fn vertex_buffer<T: bytemuck::Pod>(&mut self, data: &[T]) -> &mut Self {
        let vertex_buffer =
            self.renderer
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: self.label,
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                });
        self.vertex_buffers.push(vertex_buffer);
        self
    }

    pub fn index_buffer<T: bytemuck::Pod>(
        &mut self,
        data: &[T],
        format: wgpu::IndexFormat,
    ) -> &mut Self {
        self.index_format = format;
        self.index_buffer = Some(self.renderer.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: self.label,
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
        self
    }

    pub fn indexed_submesh(
        &mut self,
        vertex_ranges: &[IndexRange],
        index_range: IndexRange,
        num_elements: u32,
    ) -> &mut Self {
        self.submeshes.push(SubMesh {
            vertex_ranges: Vec::from(vertex_ranges),
            index_range: Some(index_range),
            num_elements,
        });
        self
    }

    // positions, normals, uvs in that order, the way every scene shader reads them
    pub fn mesh_data(&mut self, mesh: &MeshData) -> &mut Self {
        self.vertex_buffer(&mesh.positions)
            .vertex_buffer(&mesh.normals)
            .vertex_buffer(&mesh.uvs)
            .index_buffer(&mesh.indices, wgpu::IndexFormat::Uint32)
            .indexed_submesh(&[FULL_RANGE; 3], FULL_RANGE, mesh.indices.len() as u32)
    }

    pub fn produce_static_mesh(&mut self) -> StaticMesh {
        StaticMesh {
            vertex_buffers: std::mem::take(&mut self.vertex_buffers),
            index_buffer: std::mem::take(&mut self.index_buffer),
            index_format: self.index_format,
            submeshes: std::mem::take(&mut self.submeshes),
        }
    }
}
