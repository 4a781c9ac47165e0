use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use glam::{DVec3, Mat4, Vec3};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;

use ringroad_core::camera::{CameraParams, FollowCamera};
use ringroad_core::entity_location::EntityLocation;
use ringroad_core::scene::SceneHost;
use ringroad_core::waypoints::{WaypointDescriptor, RED};
use ringroad_core::Settings;

use crate::drawable::technique::*;
use crate::drawable::*;
use crate::error::{AssetError, ShaderError};
use crate::renderer::*;
use crate::resources::framebuffer::scaled_size;
use crate::resources::model::{read_gltf, ModelData};
use crate::resources::*;
use crate::ui::markup::{parse_markup, plain_text, with_link_targets};

type ModelLoad = Result<ModelData, AssetError>;

pub fn register_passes(renderer: &mut Renderer) -> Result<(), ShaderError> {
    SkyTechnique::register(renderer)?;
    RoadTechnique::register(renderer)?;
    UnlitTechnique::register(renderer)?;
    CarDrawable::register(renderer)?;
    BloomDrawable::register(renderer)?;
    MessageDrawable::register(renderer)
}

fn register_framebuffers(renderer: &mut Renderer, resources: &mut ResourceManager) {
    resources.register_depth_surface_framebuffer(
        SCENE_FRAMEBUFFER,
        renderer,
        &[Renderer::SCENE_FORMAT],
        Some(wgpu::Color::TRANSPARENT),
    );

    let surface_size = renderer.surface_size();
    for (name, divisor) in [
        (BLOOM_BRIGHT_FRAMEBUFFER, 2),
        (BLOOM_BLUR_DOWN_FRAMEBUFFER, 4),
        (BLOOM_BLUR_UP_FRAMEBUFFER, 2),
    ] {
        resources.register_framebuffer(
            name,
            renderer,
            scaled_size(surface_size, divisor),
            &[Renderer::SCENE_FORMAT],
            Some(wgpu::Color::BLACK),
        );
    }
}

// gltf parsing is slow enough to stall the first frames, so it gets its own thread
fn spawn_model_loader(path: PathBuf) -> mpsc::Receiver<ModelLoad> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        // the receiver only goes away when the window does
        let _ = sender.send(read_gltf(&path));
    });
    receiver
}

fn car_model_matrix(location: &EntityLocation) -> Mat4 {
    Mat4::from_translation(location.position.as_vec3())
        * Mat4::from_rotation_y(location.heading as f32)
}

/*
 * Everything that ends up on screen: owns the renderer, the GPU resources and one
 * technique or drawable per thing in the scene. The scene logic talks to it only
 * through SceneHost.
 */
pub struct GraphicsManager {
    pub renderer: Renderer,
    pub resources: ResourceManager,

    camera_params: CameraParams,
    camera: FollowCamera,
    bloom_settings: BloomSettings,
    quad_handle: StaticMeshHandle,

    sky: SkyTechnique,
    road: RoadTechnique,
    waypoints: Vec<(Mat4, UnlitTechnique)>,
    car: Option<CarDrawable>,
    car_model: Mat4,
    bloom: BloomDrawable,
    message: MessageDrawable,

    car_loader: Option<mpsc::Receiver<ModelLoad>>,
    render_error: Option<wgpu::SurfaceError>,
}

impl GraphicsManager {
    pub fn new(
        mut renderer: Renderer,
        settings: &Settings,
        waypoints: &[WaypointDescriptor],
    ) -> Result<Self, ShaderError> {
        let mut resources = ResourceManager::new();

        register_passes(&mut renderer)?;
        register_framebuffers(&mut renderer, &mut resources);

        let quad_handle = resources.create_quad_mesh(&renderer);
        let bloom_settings = BloomSettings {
            strength: settings.bloom_strength,
            radius: settings.bloom_radius,
            threshold: settings.bloom_threshold,
        };
        let bloom = BloomDrawable::new(&renderer, &resources, quad_handle, &bloom_settings);

        let sky = SkyTechnique::new(&renderer, &mut resources);
        let road = RoadTechnique::new(&renderer, &mut resources);

        let marker_mesh =
            resources.upload_mesh(&renderer, "waypoint", &primitives::sphere(0.2, 32, 32));
        let waypoints = waypoints
            .iter()
            .map(|waypoint| {
                (
                    Mat4::from_translation(DVec3::from(waypoint.position).as_vec3()),
                    UnlitTechnique::new(&renderer, marker_mesh, RED),
                )
            })
            .collect();

        let message = MessageDrawable::new(&renderer);
        let camera_params = CameraParams::from(settings);
        let car_path = PathBuf::from(settings.get_resource_path(&settings.car_model));

        Ok(Self {
            renderer,
            resources,
            camera: FollowCamera::new(&camera_params),
            camera_params,
            bloom_settings,
            quad_handle,
            sky,
            road,
            waypoints,
            car: None,
            car_model: Mat4::IDENTITY,
            bloom,
            message,
            car_loader: Some(spawn_model_loader(car_path)),
            render_error: None,
        })
    }

    /// Uploads the car once the loader thread is done with it. A model that
    /// failed to load leaves the car missing for good.
    pub fn poll_car_model(&mut self) {
        let receiver = match &self.car_loader {
            Some(receiver) => receiver,
            None => return,
        };

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("car model loader exited without a result");
                self.car_loader = None;
                return;
            }
        };
        self.car_loader = None;

        match result {
            Ok(model) => {
                let parts =
                    self.resources
                        .upload_model(&self.renderer, LitMeshTechnique::PASS_NAME, &model);
                info!("car model ready ({} parts)", parts.len());
                self.car = Some(CarDrawable::new(
                    &self.renderer,
                    &mut self.resources,
                    &parts,
                ));
            }
            Err(err) => error!("car model failed to load, the car stays hidden: {}", err),
        }
    }

    pub fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.renderer.handle_surface_resize(size);
        register_framebuffers(&mut self.renderer, &mut self.resources);
        self.bloom = BloomDrawable::new(
            &self.renderer,
            &self.resources,
            self.quad_handle,
            &self.bloom_settings,
        );
        self.message.rebuild(&self.renderer, &mut self.resources);
    }

    /// Surface errors from the last frame that the renderer could not recover from.
    pub fn take_render_error(&mut self) -> Option<wgpu::SurfaceError> {
        self.render_error.take()
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let surface_size = self.renderer.surface_size();
        let aspect_ratio = surface_size.width as f32 / surface_size.height as f32;

        let context = RenderContext {
            resources: &self.resources,
            view: self.camera.view_mat4(&self.camera_params),
            proj: self.camera.proj_mat4(&self.camera_params, aspect_ratio),
        };
        let view_proj = context.view_proj();

        SkyTechnique::update_once(&self.renderer, &context);
        self.road.update(&self.renderer, &context);
        for (model, marker) in self.waypoints.iter() {
            marker.update_model(&self.renderer, view_proj, *model);
        }
        if let Some(car) = &self.car {
            car.update_model(&self.renderer, view_proj, self.car_model);
        }

        // sky first since it ignores depth, glows last since they don't write it,
        // the message box over the finished frame
        let mut render_job = RenderJob::new();
        render_job.add_item(self.sky.render_item(&context));
        render_job.add_item(self.road.render_item(&context));
        for (_, marker) in self.waypoints.iter() {
            render_job.add_item(marker.render_item(&context));
        }
        if let Some(car) = &self.car {
            car.render_items(&context, &mut render_job);
        }
        self.bloom.render_items(&context, &mut render_job);
        self.message.render_items(&context, &mut render_job);

        self.renderer.render(&render_job)
    }
}

impl SceneHost for GraphicsManager {
    fn car_ready(&self) -> bool {
        self.car.is_some()
    }

    fn set_car_location(&mut self, location: &EntityLocation) {
        self.car_model = car_model_matrix(location);
    }

    fn set_camera_position(&mut self, position: Vec3) {
        self.camera.position = position;
    }

    fn set_waypoint_color(&mut self, index: usize, color: Vec3) {
        match self.waypoints.get(index) {
            Some((_, marker)) => marker.set_color(&self.renderer, color),
            None => warn!("no waypoint marker {}", index),
        }
    }

    fn show_message(&mut self, text: &str) {
        let spans = with_link_targets(parse_markup(text));
        self.renderer.set_title(&plain_text(&spans));
        self.message
            .set_message(&self.renderer, &mut self.resources, spans);
    }

    fn render_frame(&mut self) {
        if let Err(err) = self.render() {
            warn!("dropped frame: {}", err);
            self.render_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_faces_along_the_track() {
        let location = EntityLocation::on_circle(5.0, std::f64::consts::FRAC_PI_2);
        let model = car_model_matrix(&location);

        assert!(model
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
        // the nose is +Z; at +Z on the circle, increasing angle heads toward -X
        assert!(model
            .transform_vector3(Vec3::Z)
            .abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_taillights_follow_the_body() {
        let location = EntityLocation {
            position: DVec3::new(5.0, 0.0, 0.0),
            heading: 0.0,
        };
        let light =
            car_model_matrix(&location) * Mat4::from_translation(Vec3::new(0.54, 0.66, -2.05));

        assert!(light
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(5.54, 0.66, -2.05), 1e-5));
    }
}
