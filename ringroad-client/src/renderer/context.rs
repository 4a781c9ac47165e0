use winit::dpi::PhysicalSize;

use crate::error::GraphicsError;

/*
 * The Context struct contains the data for both the window and the wgpu context.
 * It mostly just makes it easier to initialize everything in one function.
 */
#[allow(dead_code)] // instance is just here to be kept alive
pub struct Context {
    pub(super) window: winit::window::Window,
    pub(super) instance: wgpu::Instance,
    pub(super) surface: wgpu::Surface,
    pub(super) adapter: wgpu::Adapter,
}

impl Context {
    pub fn new(
        event_loop: &winit::event_loop::EventLoop<()>,
        size: PhysicalSize<u32>,
    ) -> Result<Self, GraphicsError> {
        let window = winit::window::WindowBuilder::new()
            .with_title("ringroad")
            .with_inner_size(size)
            .build(event_loop)?;

        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let surface = unsafe { instance.create_surface(&window) };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            // Request an adapter which can render to our surface
            compatible_surface: Some(&surface),
        }))
        .ok_or(GraphicsError::NoAdapter)?;

        Ok(Context {
            window,
            instance,
            surface,
            adapter,
        })
    }
}
