use anyhow::Result;
use tracing::{error, info};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::ControlFlow,
};

use ringroad_core::GLOBAL_CONFIG;

use crate::client_events::Watching;

mod application;
mod assets;
mod audio;
mod client_events;
mod drawable;
mod error;
mod graphics;
mod input;
mod renderer;
mod resources;
mod ui;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = &*GLOBAL_CONFIG;
    info!("{} waypoints on a {}m track", settings.waypoints.len(), settings.track_radius);

    let event_loop = winit::event_loop::EventLoop::new();
    let size = PhysicalSize::new(settings.window_width, settings.window_height);
    let context = renderer::context::Context::new(&event_loop, size)?;
    let renderer = renderer::Renderer::new(context)?;
    let graphics = graphics::GraphicsManager::new(renderer, settings, &settings.waypoints)?;
    let mut application = application::Application::new(graphics, settings);

    event_loop.run(move |event, _, control_flow| {
        match event {
            // Window changes
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                application.graphics.handle_resize(size);
            }

            Event::WindowEvent {
                event: WindowEvent::ScaleFactorChanged { new_inner_size, .. },
                ..
            } => {
                application.graphics.handle_resize(*new_inner_size);
            }

            // X button on window clicked
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => *control_flow = ControlFlow::Exit,

            // Keyboard input
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { input, .. },
                ..
            } => {
                if let Some(key) = input.virtual_keycode {
                    match input.state {
                        ElementState::Pressed => application.on_key_down(key),
                        ElementState::Released => application.on_key_up(key),
                    }
                }
            }

            // Mouse input
            Event::WindowEvent {
                event:
                    WindowEvent::MouseInput {
                        button: MouseButton::Left,
                        state,
                        ..
                    },
                ..
            } => application.on_left_mouse(state),

            Event::WindowEvent {
                event: WindowEvent::Touch(touch),
                ..
            } => application.on_touch(touch.phase),

            // held keys never see their release once focus is gone
            Event::WindowEvent {
                event: WindowEvent::Focused(false),
                ..
            } => {
                for key in application.pressed_keys.clone() {
                    application.on_key_up(key);
                }
            }

            Event::MainEventsCleared => {
                if *control_flow == ControlFlow::Exit {
                    return;
                }

                // sleep until the next tick is due
                match application.update() {
                    Ok(next_tick) => *control_flow = ControlFlow::WaitUntil(next_tick),
                    Err(err) => {
                        error!("giving up on rendering: {}", err);
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }

            _ => {}
        }
    });
}
