use include_flate::flate;

// scene
flate!(pub static SKY: str from "src/assets/shaders/sky.wgsl");
flate!(pub static ROAD: str from "src/assets/shaders/road.wgsl");
flate!(pub static LIT_MESH: str from "src/assets/shaders/lit_mesh.wgsl");
flate!(pub static UNLIT: str from "src/assets/shaders/unlit.wgsl");
flate!(pub static GLOW: str from "src/assets/shaders/glow.wgsl");

// bloom stuff
flate!(pub static BLOOM_BRIGHT: str from "src/assets/shaders/bloom_bright.wgsl");
flate!(pub static KAWASE_BLUR_DOWN: str from "src/assets/shaders/kawase_blur_down.wgsl");
flate!(pub static KAWASE_BLUR_UP: str from "src/assets/shaders/kawase_blur_up.wgsl");
flate!(pub static COMPOSITE_BLOOM: str from "src/assets/shaders/composite_bloom.wgsl");

// overlay
flate!(pub static UI: str from "src/assets/shaders/ui.wgsl");

#[cfg(test)]
mod tests {
    use crate::renderer::reflection::shader_metadata;

    #[test]
    fn test_every_shader_parses() {
        let shaders: [(&str, &str); 10] = [
            ("sky", &*super::SKY),
            ("road", &*super::ROAD),
            ("lit_mesh", &*super::LIT_MESH),
            ("unlit", &*super::UNLIT),
            ("glow", &*super::GLOW),
            ("bloom_bright", &*super::BLOOM_BRIGHT),
            ("kawase_blur_down", &*super::KAWASE_BLUR_DOWN),
            ("kawase_blur_up", &*super::KAWASE_BLUR_UP),
            ("composite_bloom", &*super::COMPOSITE_BLOOM),
            ("ui", &*super::UI),
        ];

        for (name, source) in shaders {
            let metadata = shader_metadata(name, source).unwrap();
            // meshes always come with positions, normals and uvs
            assert_eq!(metadata.vertex_attributes.len(), 3, "{}", name);
        }
    }
}
