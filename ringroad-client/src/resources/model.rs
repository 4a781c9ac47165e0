use std::collections::VecDeque;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::primitives::MeshData;
use crate::error::AssetError;

/*
 * The CPU half of gltf loading: parsing the file, flattening the node hierarchy
 * and converting images. None of this touches the GPU, so it can run on a loader
 * thread while the rest of the scene is already drawing. See
 * ResourceManager::upload_model for the other half.
 */

pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub struct MaterialData {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub base_color_image: Option<usize>,
}

pub struct PrimitiveData {
    pub mesh: MeshData,
    pub material: Option<usize>,
}

pub struct ModelData {
    pub primitives: Vec<PrimitiveData>,
    pub materials: Vec<MaterialData>,
    pub images: Vec<ImageData>,
}

/// Expands a decoded gltf image to tightly packed RGBA8. Formats that do not map
/// cleanly are replaced by opaque white of the same size.
pub fn to_rgba8(format: gltf::image::Format, width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    match format {
        gltf::image::Format::R8G8B8A8 => pixels.to_vec(),
        gltf::image::Format::R8G8B8 => pixels
            .chunks(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        gltf::image::Format::R8 => pixels.iter().flat_map(|v| [*v, *v, *v, 255]).collect(),
        other => {
            warn!("unsupported texture format {:?}, using white", other);
            vec![255; (width * height * 4) as usize]
        }
    }
}

// meshes tagged with {"render": 0} in their extras are collision or helper geometry
fn render_flag(extras: &str) -> Result<bool, serde_json::Error> {
    let mesh_data: Value = serde_json::from_str(extras)?;
    Ok(mesh_data["render"] != 0)
}

fn should_render(mesh: &gltf::Mesh) -> bool {
    let extras = match mesh.extras().as_ref() {
        Some(extras) => extras,
        None => return true,
    };
    render_flag(extras.get()).unwrap_or_else(|err| {
        warn!(
            "ignoring unreadable extras on mesh '{}': {}",
            mesh.name().unwrap_or("<unnamed>"),
            err
        );
        true
    })
}

fn node_transform(node: &gltf::Node) -> glam::Mat4 {
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => glam::Mat4::from_cols_array_2d(&matrix),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => glam::Mat4::from_scale_rotation_translation(
            glam::Vec3::from(scale),
            glam::Quat::from_array(rotation),
            glam::Vec3::from(translation),
        ),
    }
}

fn read_primitive(
    buffers: &[gltf::buffer::Data],
    primitive: &gltf::Primitive,
    transform: glam::Mat4,
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let num_vertices = positions.len();

    // every scene shader reads all three attributes, so fill in what's missing
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; num_vertices]);
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; num_vertices]);
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..num_vertices as u32).collect(),
    };

    let mut mesh = MeshData {
        positions,
        normals,
        uvs,
        indices,
    };
    mesh.transform(transform);
    Some(mesh)
}

/*
 * Imports the meshes, materials and images of the first scene in a gltf file.
 * Node transforms are baked into the vertices, so the whole model can be placed
 * with a single model matrix.
 */
pub fn read_gltf(path: &Path) -> Result<ModelData, AssetError> {
    let path_name = path.display().to_string();
    info!("loading {}", path_name);

    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path_name.clone(),
        source,
    })?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::NoScene(path_name.clone()))?;

    let mut primitives = Vec::new();
    let mut queue: VecDeque<(gltf::Node, glam::Mat4)> = scene
        .nodes()
        .map(|n| (n, glam::Mat4::IDENTITY))
        .collect();

    while let Some((node, parent_transform)) = queue.pop_front() {
        let transform = parent_transform * node_transform(&node);

        if let Some(mesh) = node.mesh() {
            if should_render(&mesh) {
                for primitive in mesh.primitives() {
                    match read_primitive(&buffers, &primitive, transform) {
                        Some(mesh_data) => primitives.push(PrimitiveData {
                            mesh: mesh_data,
                            material: primitive.material().index(),
                        }),
                        None => warn!(
                            "primitive {} of mesh '{}' has no positions",
                            primitive.index(),
                            mesh.name().unwrap_or("<unnamed>")
                        ),
                    }
                }
            } else {
                debug!("skipping mesh '{}'", mesh.name().unwrap_or("<unnamed>"));
            }
        }

        for child in node.children() {
            queue.push_back((child, transform));
        }
    }

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            MaterialData {
                name: material.name().map(String::from),
                base_color_factor: pbr.base_color_factor(),
                base_color_image: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    let images = images
        .iter()
        .map(|img| ImageData {
            width: img.width,
            height: img.height,
            rgba: to_rgba8(img.format, img.width, img.height, &img.pixels),
        })
        .collect();

    info!(
        "loaded {} with {} primitives ({} vertices)",
        path_name,
        primitives.len(),
        primitives
            .iter()
            .map(|primitive| primitive.mesh.num_vertices())
            .sum::<usize>()
    );
    Ok(ModelData {
        primitives,
        materials,
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_expands_with_opaque_alpha() {
        let rgba = to_rgba8(gltf::image::Format::R8G8B8, 2, 1, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_grey_spreads_to_every_channel() {
        let rgba = to_rgba8(gltf::image::Format::R8, 2, 1, &[7, 9]);
        assert_eq!(rgba, vec![7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn test_unsupported_format_falls_back_to_white() {
        let rgba = to_rgba8(gltf::image::Format::R16G16B16, 2, 2, &[0; 24]);
        assert_eq!(rgba.len(), 16);
        assert!(rgba.iter().all(|v| *v == 255));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_gltf(Path::new("does/not/exist.gltf")).err().unwrap();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    #[test]
    fn test_render_flag() {
        assert!(!render_flag(r#"{"render": 0}"#).unwrap());
        assert!(render_flag(r#"{"render": 1}"#).unwrap());
        assert!(render_flag(r#"{"collider": true}"#).unwrap());
        assert!(render_flag("{render").is_err());
    }

    // one triangle drawn twice: a visible body lifted to y = 2 and a hidden helper
    const HELPER_MESH_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "mesh": 0 },
            { "mesh": 1, "translation": [0.0, 2.0, 0.0] }
        ],
        "meshes": [
            { "name": "collider", "extras": { "render": 0 }, "primitives": [{ "attributes": { "POSITION": 0 } }] },
            { "name": "body", "primitives": [{ "attributes": { "POSITION": 0 } }] }
        ],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    }"#;

    #[test]
    fn test_helper_meshes_are_left_out() {
        let path = std::env::temp_dir().join("ringroad_helper_mesh.gltf");
        std::fs::write(&path, HELPER_MESH_GLTF).unwrap();

        let model = read_gltf(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(model.primitives.len(), 1);
        let body = &model.primitives[0].mesh;
        assert_eq!(body.positions, vec![[0.0, 2.0, 0.0], [1.0, 2.0, 0.0], [0.0, 3.0, 0.0]]);
        // missing attributes are filled in for the shaders
        assert_eq!(body.normals.len(), 3);
        assert_eq!(body.uvs.len(), 3);
        assert_eq!(body.indices, vec![0, 1, 2]);
    }
}
