use glam::{Vec2, Vec3};
use tracing::info;

use crate::camera::{CameraParams, FollowCamera};
use crate::engine_sound::{AudioBackend, EngineSoundGate, EngineSoundParams};
use crate::entity_location::EntityLocation;
use crate::kinematics::{CarState, KinematicsParams};
use crate::orientation::{sample_orientation, OrientationParams};
use crate::player_inputs::{InputEvent, InputState};
use crate::settings::Settings;
use crate::waypoints::{highlight_nearby, Waypoint, WaypointDescriptor, WaypointParams};

#[cfg(test)]
mod tests;

/*
 * Everything the scene needs from the outside world each tick. The client
 * implements this on top of its renderer and window; tests implement it with
 * a recorder.
 */
pub trait SceneHost {
    // false until the car model is loaded (and forever if loading failed)
    fn car_ready(&self) -> bool;
    fn set_car_location(&mut self, location: &EntityLocation);
    fn set_camera_position(&mut self, position: Vec3);
    fn set_waypoint_color(&mut self, index: usize, color: Vec3);
    // text is shown verbatim; it may carry markup
    fn show_message(&mut self, text: &str);
    fn render_frame(&mut self);
}

pub struct SceneParams {
    pub kinematics: KinematicsParams,
    pub camera: CameraParams,
    pub orientation: OrientationParams,
    pub waypoint: WaypointParams,
    pub engine: EngineSoundParams,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            kinematics: KinematicsParams::default(),
            camera: CameraParams::default(),
            orientation: OrientationParams::default(),
            waypoint: WaypointParams::default(),
            engine: EngineSoundParams::default(),
        }
    }
}

impl From<&Settings> for SceneParams {
    fn from(settings: &Settings) -> Self {
        Self {
            kinematics: KinematicsParams::from(settings),
            camera: CameraParams::from(settings),
            orientation: OrientationParams::from(settings),
            waypoint: WaypointParams::from(settings),
            engine: EngineSoundParams::from(settings),
        }
    }
}

/// All per-frame mutable state, owned by whoever drives the loop.
pub struct Scene<H> {
    pub params: SceneParams,
    pub input: InputState,
    pub camera_offset: Vec2,
    pub car: CarState,
    pub camera: FollowCamera,
    pub waypoints: Vec<Waypoint>,
    pub engine_sound: EngineSoundGate<H>,
    displayed_message: Option<String>,
}

impl<H> Scene<H> {
    pub fn new(params: SceneParams, start_angle: f64, waypoints: &[WaypointDescriptor]) -> Self {
        Self {
            input: InputState::new(),
            camera_offset: Vec2::ZERO,
            car: CarState::new(start_angle),
            camera: FollowCamera::new(&params.camera),
            waypoints: waypoints.iter().map(Waypoint::from).collect(),
            engine_sound: EngineSoundGate::new(),
            displayed_message: None,
            params,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            SceneParams::from(settings),
            settings.start_angle(),
            &settings.waypoints,
        )
    }

    pub fn displayed_message(&self) -> Option<&str> {
        self.displayed_message.as_deref()
    }

    pub fn car_location(&self) -> EntityLocation {
        self.car.location(&self.params.kinematics)
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::SetIntent(direction) => self.input.set_intent(direction),
            InputEvent::ClearIntent => self.input.clear_intent(),
            InputEvent::ReleaseIntent(direction) => self.input.release(direction),
            InputEvent::Orientation { gamma, beta } => {
                self.camera_offset = sample_orientation(gamma, beta, &self.params.orientation);
            }
        }
    }

    /*
     * One tick of the loop: apply queued input, move the car, restyle the
     * waypoints, ease the camera, gate the engine sound, then draw.
     */
    pub fn tick<I, S, B>(&mut self, events: I, host: &mut S, audio: &mut B)
    where
        I: IntoIterator<Item = InputEvent>,
        S: SceneHost,
        B: AudioBackend<Handle = H>,
    {
        for event in events {
            self.handle_input(event);
        }

        // nothing to drive or highlight until the car exists
        if host.car_ready() {
            self.car
                .advance(self.input.intent(), &self.params.kinematics);
            let location = self.car_location();
            host.set_car_location(&location);

            let surfaced = highlight_nearby(
                location.position,
                &mut self.waypoints,
                self.params.waypoint.threshold,
            );
            if let Some(message) = surfaced {
                if self.displayed_message.as_deref() != Some(message) {
                    info!("showing message: {}", message);
                    host.show_message(message);
                    self.displayed_message = Some(message.to_string());
                }
            }
        }

        for (idx, waypoint) in self.waypoints.iter_mut().enumerate() {
            waypoint.tick_color(self.params.waypoint.color_rate);
            host.set_waypoint_color(idx, waypoint.current_color);
        }

        self.camera.follow(self.camera_offset, &self.params.camera);
        host.set_camera_position(self.camera.position);

        if host.car_ready() {
            self.engine_sound
                .update(self.car.speed, audio, &self.params.engine);
        }

        host.render_frame();
    }
}
