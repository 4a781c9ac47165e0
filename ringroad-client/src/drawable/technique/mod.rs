pub mod bloom;
pub mod glow;
pub mod lit_mesh;
pub mod road;
pub mod sky;
pub mod ui_layer;
pub mod unlit;

pub use bloom::*;
pub use glow::*;
pub use lit_mesh::*;
pub use road::*;
pub use sky::*;
pub use ui_layer::*;
pub use unlit::*;

use crate::drawable::*;
use crate::error::ShaderError;
use crate::renderer::*;

pub trait Technique {
    const PASS_NAME: &'static str;
    fn register(renderer: &mut Renderer) -> Result<(), ShaderError>;
    fn update_once(_: &Renderer, _: &RenderContext) {}
    fn render_item<'a>(&'a self, context: &RenderContext<'a>) -> render_job::RenderItem<'a>;
}
