use glam::{DVec3, Vec3};
use serde::Deserialize;

use crate::settings::Settings;

pub const RED: Vec3 = glam::const_vec3!([1.0, 0.0, 0.0]);
// css "green", not pure green
pub const GREEN: Vec3 = glam::const_vec3!([0.0, 128.0 / 255.0, 0.0]);

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WaypointDescriptor {
    pub position: [f64; 3],
    pub message: String,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WaypointParams {
    pub threshold: f64,
    pub color_rate: f32,
}

impl Default for WaypointParams {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            color_rate: 0.04,
        }
    }
}

impl From<&Settings> for WaypointParams {
    fn from(settings: &Settings) -> Self {
        Self {
            threshold: settings.proximity_threshold,
            color_rate: settings.color_rate,
        }
    }
}

/// A fixed point of interest next to the track. Position and message never
/// change; the colors are animated every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub position: DVec3,
    pub message: String,
    pub current_color: Vec3,
    pub target_color: Vec3,
}

impl Waypoint {
    pub fn new(position: DVec3, message: impl Into<String>) -> Self {
        Waypoint {
            position,
            message: message.into(),
            current_color: RED,
            target_color: RED,
        }
    }

    /// Eases the displayed color toward the target. Exponential, so it gets
    /// arbitrarily close without ever landing on it.
    pub fn tick_color(&mut self, rate: f32) {
        self.current_color = self.current_color.lerp(self.target_color, rate);
    }
}

impl From<&WaypointDescriptor> for Waypoint {
    fn from(descriptor: &WaypointDescriptor) -> Self {
        Waypoint::new(DVec3::from(descriptor.position), descriptor.message.as_str())
    }
}

pub fn default_waypoints() -> Vec<WaypointDescriptor> {
    vec![
        WaypointDescriptor {
            position: [5.0, 0.0, 0.0],
            message: "Hi, I'm a Daniil Demchenko".to_string(),
        },
        WaypointDescriptor {
            position: [-5.0, 0.0, 0.0],
            message: "Email me at <a href='mailto:dan9m@ya.ru'>dan9m@ya.ru</a>".to_string(),
        },
        WaypointDescriptor {
            position: [0.0, 0.0, 5.0],
            message: "It's my test three.js project".to_string(),
        },
    ]
}

/*
 * Re-targets every waypoint's color based on how close the car is, and returns
 * the message that should be on screen this tick, if any. When several
 * waypoints are in range at once, the last one in iteration order wins.
 */
pub fn highlight_nearby<'a>(
    car_position: DVec3,
    waypoints: &'a mut [Waypoint],
    threshold: f64,
) -> Option<&'a str> {
    let mut surfaced = None;
    for (idx, waypoint) in waypoints.iter_mut().enumerate() {
        if car_position.distance(waypoint.position) < threshold {
            waypoint.target_color = GREEN;
            surfaced = Some(idx);
        } else {
            waypoint.target_color = RED;
        }
    }

    match surfaced {
        Some(idx) => Some(waypoints[idx].message.as_str()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_waypoints() -> Vec<Waypoint> {
        vec![
            Waypoint::new(DVec3::new(2.5, 0.0, 0.0), "near"),
            Waypoint::new(DVec3::new(0.0, 0.0, 4.0), "far"),
        ]
    }

    #[test]
    fn test_waypoint_in_range_turns_green() {
        let mut waypoints = two_waypoints();
        let message = highlight_nearby(DVec3::ZERO, &mut waypoints, 3.0).map(String::from);

        assert_eq!(message.as_deref(), Some("near"));
        assert_eq!(waypoints[0].target_color, GREEN);
        assert_eq!(waypoints[1].target_color, RED);
    }

    #[test]
    fn test_last_waypoint_in_range_wins() {
        let mut waypoints = vec![
            Waypoint::new(DVec3::new(1.0, 0.0, 0.0), "first"),
            Waypoint::new(DVec3::new(-1.0, 0.0, 0.0), "second"),
        ];
        let message = highlight_nearby(DVec3::ZERO, &mut waypoints, 3.0);
        assert_eq!(message, Some("second"));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut waypoints = vec![Waypoint::new(DVec3::new(3.0, 0.0, 0.0), "edge")];
        assert_eq!(highlight_nearby(DVec3::ZERO, &mut waypoints, 3.0), None);
        assert_eq!(waypoints[0].target_color, RED);
    }

    #[test]
    fn test_leaving_range_retargets_red() {
        let mut waypoints = two_waypoints();
        highlight_nearby(DVec3::ZERO, &mut waypoints, 3.0);
        highlight_nearby(DVec3::new(-10.0, 0.0, 0.0), &mut waypoints, 3.0);
        assert!(waypoints.iter().all(|w| w.target_color == RED));
    }

    #[test]
    fn test_color_converges_monotonically() {
        let mut waypoint = Waypoint::new(DVec3::ZERO, "");
        waypoint.target_color = GREEN;

        let mut last_gap = waypoint.current_color.distance(waypoint.target_color);
        for _ in 0..100 {
            waypoint.tick_color(0.04);
            assert_ne!(waypoint.current_color, waypoint.target_color);

            let gap = waypoint.current_color.distance(waypoint.target_color);
            assert!(gap < last_gap);
            last_gap = gap;
        }
    }

    #[test]
    fn test_default_set_has_three_red_waypoints() {
        let waypoints: Vec<Waypoint> = default_waypoints().iter().map(Waypoint::from).collect();
        assert_eq!(waypoints.len(), 3);
        assert!(waypoints
            .iter()
            .all(|w| w.current_color == RED && w.target_color == RED));
        assert!(waypoints[1].message.contains("<a href="));
    }
}
