use std::f32::consts::PI;

use glam::{Mat4, Vec3};

/*
 * CPU side geometry, one array per vertex attribute to match how meshes are uploaded
 * (see MeshBuilder). Texture coordinates have v pointing up.
 */
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    // Bakes a node transform into the vertices
    pub fn transform(&mut self, transform: Mat4) {
        let normal_transform = transform.inverse().transpose();
        for position in self.positions.iter_mut() {
            *position = transform
                .transform_point3(Vec3::from(*position))
                .to_array();
        }
        for normal in self.normals.iter_mut() {
            *normal = normal_transform
                .transform_vector3(Vec3::from(*normal))
                .normalize_or_zero()
                .to_array();
        }
    }
}

/// Flat rectangle in the XY plane centered on the origin, facing +Z.
pub fn plane(width: f32, height: f32, segments_x: u32, segments_y: u32) -> MeshData {
    let segments_x = segments_x.max(1);
    let segments_y = segments_y.max(1);
    let row_len = segments_x + 1;

    let mut mesh = MeshData::default();
    for iy in 0..=segments_y {
        let v = iy as f32 / segments_y as f32;
        for ix in 0..=segments_x {
            let u = ix as f32 / segments_x as f32;
            mesh.positions
                .push([u * width - width / 2.0, height / 2.0 - v * height, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
            mesh.uvs.push([u, 1.0 - v]);
        }
    }

    for iy in 0..segments_y {
        for ix in 0..segments_x {
            let a = ix + row_len * iy;
            let b = ix + row_len * (iy + 1);
            let c = (ix + 1) + row_len * (iy + 1);
            let d = (ix + 1) + row_len * iy;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    mesh
}

/// UV sphere centered on the origin. The poles sit on the Y axis.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let row_len = width_segments + 1;

    let mut mesh = MeshData::default();
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * 2.0 * PI).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            mesh.positions.push((normal * radius).to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([u, 1.0 - v]);
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = row_len * iy + ix + 1;
            let b = row_len * iy + ix;
            let c = row_len * (iy + 1) + ix;
            let d = row_len * (iy + 1) + ix + 1;
            // the pole rows collapse to a single triangle per segment
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_layout() {
        let mesh = plane(300.0, 20.0, 1, 1);

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.positions[0], [-150.0, 10.0, 0.0]);
        assert_eq!(mesh.positions[3], [150.0, -10.0, 0.0]);
        assert_eq!(mesh.uvs[0], [0.0, 1.0]);
        assert_eq!(mesh.uvs[3], [1.0, 0.0]);
    }

    #[test]
    fn test_plane_faces_positive_z() {
        let mesh = plane(2.0, 2.0, 3, 2);

        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mesh = sphere(0.2, 32, 32);

        assert_eq!(mesh.num_vertices(), 33 * 33);
        assert_eq!(mesh.indices.len(), 6 * 32 * 31);
        for (position, normal) in mesh.positions.iter().zip(mesh.normals.iter()) {
            let position = Vec3::from(*position);
            assert!((position.length() - 0.2).abs() < 1e-5);
            assert!(position.normalize().abs_diff_eq(Vec3::from(*normal), 1e-4));
        }
        assert!(mesh
            .indices
            .iter()
            .all(|idx| (*idx as usize) < mesh.num_vertices()));
    }

    #[test]
    fn test_transform_moves_points_and_turns_normals() {
        let mut mesh = plane(2.0, 2.0, 1, 1);
        mesh.transform(
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)) * Mat4::from_rotation_x(-PI / 2.0),
        );

        for position in mesh.positions.iter() {
            assert!((position[1] - 1.0).abs() < 1e-6);
        }
        assert!(Vec3::from(mesh.normals[0]).abs_diff_eq(Vec3::Y, 1e-6));
    }
}
