use std::num::NonZeroU32;

pub struct FramebufferDescriptor {
    pub color_attachments: Vec<wgpu::TextureView>,
    pub depth_stencil_attachment: Option<wgpu::TextureView>,
    // None loads whatever is already there
    pub clear_color: Option<wgpu::Color>,
    pub clear_depth: bool,
}

/*
 * Everything needed for pipeline setup apart from what can be read off the shader
 * (bind group layouts and vertex buffers, see reflection.rs).
 */
pub struct RenderPassDescriptor<'a> {
    pub source: &'a str,
    pub push_constant_ranges: &'a [wgpu::PushConstantRange],
    // None renders straight to the surface
    pub targets: Option<&'a [wgpu::ColorTargetState]>,
    // blending against the surface, only read when targets is None
    pub surface_blend: wgpu::BlendState,
    pub primitive_state: wgpu::PrimitiveState,
    pub depth_stencil_state: Option<wgpu::DepthStencilState>,
    pub multisample_state: wgpu::MultisampleState,
    pub multiview: Option<NonZeroU32>,
}

pub(super) struct RenderPass {
    pub(super) render_pipeline: wgpu::RenderPipeline,
}

/*
 * A RenderItem stores all state for a draw call
 */
#[derive(Clone)]
pub struct RenderItem<'a> {
    pub pass_name: &'a str,
    pub framebuffer_name: String,
    pub num_elements: u32,
    pub vertex_buffers: Vec<wgpu::BufferSlice<'a>>,
    pub index_buffer: Option<wgpu::BufferSlice<'a>>,
    pub index_format: wgpu::IndexFormat,
    pub bind_group: Vec<&'a wgpu::BindGroup>,
}

/*
 * An ordered list of RenderItems. Items are drawn in the order they were added;
 * consecutive items that target the same framebuffer share one wgpu render pass,
 * and consecutive items in the same pass share a pipeline bind.
 */
#[derive(Default)]
pub struct RenderJob<'a> {
    items: Vec<RenderItem<'a>>,
}

impl<'a> RenderJob<'a> {
    pub fn new() -> Self {
        RenderJob { items: Vec::new() }
    }

    pub fn add_item(&mut self, item: RenderItem<'a>) {
        self.items.push(item);
    }

    pub(super) fn framebuffer_batches(&self) -> Vec<&[RenderItem<'a>]> {
        batch_by_key(&self.items, |item| item.framebuffer_name.as_str())
    }
}

// Splits a slice into maximal runs of neighbouring elements with equal keys.
pub(super) fn batch_by_key<'s, T, K, F>(items: &'s [T], key: F) -> Vec<&'s [T]>
where
    K: PartialEq,
    F: Fn(&'s T) -> K,
{
    let mut batches = Vec::new();
    let mut start = 0;
    for idx in 1..=items.len() {
        if idx == items.len() || key(&items[idx]) != key(&items[start]) {
            batches.push(&items[start..idx]);
            start = idx;
        }
    }
    batches
}
