pub mod camera;
pub mod engine_sound;
pub mod entity_location;
pub mod kinematics;
pub mod orientation;
pub mod player_inputs;
pub mod scene;
mod settings;
pub mod waypoints;

pub use settings::{Settings, GLOBAL_CONFIG};
