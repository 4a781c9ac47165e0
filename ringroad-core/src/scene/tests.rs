use glam::{Vec2, Vec3};

use crate::engine_sound::tests::FakeAudio;
use crate::entity_location::EntityLocation;
use crate::player_inputs::{Direction, InputEvent};
use crate::scene::{Scene, SceneHost, SceneParams};
use crate::waypoints::{default_waypoints, WaypointDescriptor, GREEN, RED};

#[derive(Default)]
struct RecordingHost {
    car_ready: bool,
    car_location: Option<EntityLocation>,
    camera_position: Vec3,
    waypoint_colors: Vec<Vec3>,
    messages: Vec<String>,
    frames: usize,
}

impl RecordingHost {
    fn with_car() -> Self {
        RecordingHost {
            car_ready: true,
            ..Default::default()
        }
    }
}

impl SceneHost for RecordingHost {
    fn car_ready(&self) -> bool {
        self.car_ready
    }

    fn set_car_location(&mut self, location: &EntityLocation) {
        self.car_location = Some(*location);
    }

    fn set_camera_position(&mut self, position: Vec3) {
        self.camera_position = position;
    }

    fn set_waypoint_color(&mut self, index: usize, color: Vec3) {
        if self.waypoint_colors.len() <= index {
            self.waypoint_colors.resize(index + 1, Vec3::ZERO);
        }
        self.waypoint_colors[index] = color;
    }

    fn show_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn render_frame(&mut self) {
        self.frames += 1;
    }
}

fn default_scene() -> Scene<usize> {
    Scene::new(
        SceneParams::default(),
        130f64.to_radians(),
        &default_waypoints(),
    )
}

fn no_input() -> Vec<InputEvent> {
    Vec::new()
}

#[test]
fn test_tick_renders_once_per_call() {
    let mut scene = default_scene();
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();

    for _ in 0..5 {
        scene.tick(no_input(), &mut host, &mut audio);
    }

    assert_eq!(host.frames, 5);
    assert_eq!(host.waypoint_colors.len(), 3);
    assert!(host.car_location.is_some());
}

#[test]
fn test_driving_forward_starts_engine_and_moves_car() {
    let mut scene = default_scene();
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();
    let start_angle = scene.car.angle;

    scene.tick(
        vec![InputEvent::SetIntent(Direction::Forward)],
        &mut host,
        &mut audio,
    );
    for _ in 0..199 {
        scene.tick(no_input(), &mut host, &mut audio);
    }

    assert_eq!(scene.car.speed, scene.params.kinematics.max_speed);
    assert!(scene.car.angle > start_angle);
    assert!(scene.engine_sound.is_playing());
    assert_eq!(audio.started.len(), 1);

    let location = host.car_location.unwrap();
    assert!((location.position.length() - 5.0).abs() < 1e-9);
}

#[test]
fn test_releasing_intent_stops_engine_after_cycle() {
    let mut scene = default_scene();
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();

    scene.tick(
        vec![InputEvent::SetIntent(Direction::Forward)],
        &mut host,
        &mut audio,
    );
    for _ in 0..9 {
        scene.tick(no_input(), &mut host, &mut audio);
    }

    scene.tick(
        vec![InputEvent::ReleaseIntent(Direction::Forward)],
        &mut host,
        &mut audio,
    );
    // coasting; engine still looping until speed hits zero
    assert!(scene.car.is_moving());
    assert!(scene.engine_sound.is_playing());

    while scene.car.is_moving() {
        scene.tick(no_input(), &mut host, &mut audio);
    }
    assert!(scene.engine_sound.is_stopping());

    audio.cycle_length = 0;
    audio.ticks_left_in_cycle = 0;
    scene.tick(no_input(), &mut host, &mut audio);
    assert!(scene.engine_sound.is_silent());
    assert_eq!(audio.released, 1);
}

#[test]
fn test_nothing_moves_until_car_is_loaded() {
    let mut scene = default_scene();
    let mut host = RecordingHost::default();
    let mut audio = FakeAudio::ready();
    let start_angle = scene.car.angle;

    scene.tick(
        vec![InputEvent::SetIntent(Direction::Forward)],
        &mut host,
        &mut audio,
    );
    for _ in 0..20 {
        scene.tick(no_input(), &mut host, &mut audio);
    }

    assert_eq!(scene.car.angle, start_angle);
    assert_eq!(scene.car.speed, 0.0);
    assert!(host.car_location.is_none());
    assert!(audio.started.is_empty());
    // the rest of the scene keeps drawing
    assert_eq!(host.frames, 21);
}

#[test]
fn test_nearby_waypoint_shows_message_once() {
    let waypoints = vec![
        WaypointDescriptor {
            position: [5.0, 0.0, 0.0],
            message: "start line".to_string(),
        },
        WaypointDescriptor {
            position: [-5.0, 0.0, 0.0],
            message: "far side".to_string(),
        },
    ];
    let mut scene: Scene<usize> = Scene::new(SceneParams::default(), 0.0, &waypoints);
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();

    for _ in 0..10 {
        scene.tick(no_input(), &mut host, &mut audio);
    }

    assert_eq!(host.messages, vec!["start line".to_string()]);
    assert_eq!(scene.displayed_message(), Some("start line"));
    assert_eq!(scene.waypoints[0].target_color, GREEN);
    assert_eq!(scene.waypoints[1].target_color, RED);

    // current color is on its way to green but not there yet
    let shown = host.waypoint_colors[0];
    assert!(shown.y > 0.0 && shown != GREEN);
}

#[test]
fn test_message_stays_after_leaving_range() {
    let mut scene = default_scene();
    scene.car.angle = 0.0;
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();

    scene.tick(no_input(), &mut host, &mut audio);
    assert_eq!(host.messages.len(), 1);

    // half a lap round to the (-5, 0, 0) waypoint
    scene.car.angle = std::f64::consts::PI;
    scene.tick(no_input(), &mut host, &mut audio);

    assert_eq!(host.messages.len(), 2);
    assert!(host.messages[1].starts_with("Email me at"));
    assert_eq!(scene.waypoints[0].target_color, RED);

    scene.car.angle = 1.2 * std::f64::consts::PI;
    scene.tick(no_input(), &mut host, &mut audio);
    assert!(scene.displayed_message().unwrap().starts_with("Email me at"));
}

#[test]
fn test_orientation_offsets_camera() {
    let mut scene = default_scene();
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();

    scene.tick(
        vec![InputEvent::Orientation {
            gamma: Some(45.0),
            beta: Some(-40.0),
        }],
        &mut host,
        &mut audio,
    );
    assert_eq!(scene.camera_offset, Vec2::new(1.2, -0.7));

    for _ in 0..300 {
        scene.tick(no_input(), &mut host, &mut audio);
    }
    let expected = Vec3::new(1.2, 4.3, 13.0);
    assert!(host.camera_position.abs_diff_eq(expected, 1e-3));
}

#[test]
fn test_car_stays_on_track() {
    let mut scene = default_scene();
    let mut host = RecordingHost::with_car();
    let mut audio = FakeAudio::ready();

    scene.tick(
        vec![InputEvent::SetIntent(Direction::Backward)],
        &mut host,
        &mut audio,
    );
    for _ in 0..500 {
        scene.tick(no_input(), &mut host, &mut audio);
        let position = host.car_location.unwrap().position;
        assert!((position.length() - 5.0).abs() < 1e-9);
        assert_eq!(position.y, 0.0);
    }
    assert!(scene.car.angle < 130f64.to_radians());
}
