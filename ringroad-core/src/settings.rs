use config::{Config, ConfigError, File};
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::camera::CameraParams;
use crate::engine_sound::EngineSoundParams;
use crate::kinematics::KinematicsParams;
use crate::orientation::OrientationParams;
use crate::waypoints::{default_waypoints, WaypointDescriptor, WaypointParams};

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub tick_hz: u32,

    pub track_radius: f64,
    pub start_angle_degrees: f64,
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,

    #[serde(default = "default_camera_base")]
    pub camera_base: [f32; 3],
    pub camera_pitch: f32,
    pub camera_fov_degrees: f32,
    pub camera_smoothing: f32,

    pub tilt_limit_degrees: f32,
    #[serde(default = "default_tilt_scale")]
    pub tilt_scale: [f32; 2],

    pub proximity_threshold: f64,
    pub color_rate: f32,
    #[serde(default = "default_waypoints")]
    pub waypoints: Vec<WaypointDescriptor>,

    pub engine_gain: f32,
    pub engine_rate: f32,

    pub resource_folder: String,
    pub car_model: String,
    pub engine_sound: String,

    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,

    pub window_width: u32,
    pub window_height: u32,
}

fn default_camera_base() -> [f32; 3] {
    CameraParams::default().base.to_array()
}

fn default_tilt_scale() -> [f32; 2] {
    OrientationParams::default().scale.to_array()
}

impl Settings {
    fn new() -> Result<Settings, ConfigError> {
        let kinematics = KinematicsParams::default();
        let camera = CameraParams::default();
        let orientation = OrientationParams::default();
        let waypoint = WaypointParams::default();
        let engine = EngineSoundParams::default();

        let config = Config::builder()
            .set_default("tick_hz", 60)?
            .set_default("track_radius", kinematics.radius)?
            .set_default("start_angle_degrees", 130.0)?
            .set_default("max_speed", kinematics.max_speed)?
            .set_default("acceleration", kinematics.acceleration)?
            .set_default("deceleration", kinematics.deceleration)?
            .set_default("camera_pitch", camera.pitch as f64)?
            .set_default("camera_fov_degrees", camera.fov_y_degrees as f64)?
            .set_default("camera_smoothing", camera.smoothing as f64)?
            .set_default("tilt_limit_degrees", orientation.limit_degrees as f64)?
            .set_default("proximity_threshold", waypoint.threshold)?
            .set_default("color_rate", waypoint.color_rate as f64)?
            .set_default("engine_gain", engine.gain as f64)?
            .set_default("engine_rate", engine.rate as f64)?
            .set_default("resource_folder", "resources")?
            .set_default("car_model", "models/ferrari_f40/scene.gltf")?
            .set_default("engine_sound", "sfx/engine_v10.mp3")?
            .set_default("bloom_strength", 0.5)?
            .set_default("bloom_radius", 1.0)?
            .set_default("bloom_threshold", 0.15)?
            .set_default("window_width", 1280)?
            .set_default("window_height", 720)?
            .add_source(File::with_name("config.yaml").required(false))
            .build()?;

        config.try_deserialize::<Settings>()?.validated()
    }

    fn validated(self) -> Result<Settings, ConfigError> {
        if !(self.tilt_limit_degrees.is_finite() && self.tilt_limit_degrees > 0.0) {
            return Err(ConfigError::Message(format!(
                "tilt_limit_degrees must be a positive number of degrees, got {}",
                self.tilt_limit_degrees
            )));
        }
        Ok(self)
    }

    pub fn start_angle(&self) -> f64 {
        self.start_angle_degrees.to_radians()
    }

    pub fn get_resource_path(&self, file: &str) -> String {
        format!("{}/{}", self.resource_folder, file)
    }
}

lazy_static! {
    pub static ref GLOBAL_CONFIG: Settings = Settings::new().expect("failed to read config file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_component_params() {
        // no config.yaml next to the core crate, so these are the built-ins
        let settings = Settings::new().unwrap();

        assert_eq!(KinematicsParams::from(&settings), KinematicsParams::default());
        assert_eq!(CameraParams::from(&settings), CameraParams::default());
        assert_eq!(OrientationParams::from(&settings), OrientationParams::default());
        assert_eq!(WaypointParams::from(&settings), WaypointParams::default());
        assert_eq!(EngineSoundParams::from(&settings), EngineSoundParams::default());
        assert_eq!(settings.waypoints, default_waypoints());
        assert_eq!(settings.tick_hz, 60);
    }

    #[test]
    fn test_non_positive_tilt_limit_is_rejected() {
        let mut settings = Settings::new().unwrap();
        settings.tilt_limit_degrees = 0.0;
        assert!(matches!(settings.validated(), Err(ConfigError::Message(_))));

        let mut settings = Settings::new().unwrap();
        settings.tilt_limit_degrees = 12.5;
        assert!(settings.validated().is_ok());
    }
}
