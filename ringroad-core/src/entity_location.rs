use glam::DVec3;

// EntityLocation is what the kinematics hand to the renderer: where to draw
// the car and which way it faces
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EntityLocation {
    pub position: DVec3,
    pub heading: f64, // rotation about +Y, in radians
}

impl EntityLocation {
    /// The pose of something sitting on a circle of `radius` around the
    /// origin at `angle` radians, facing along the track.
    pub fn on_circle(radius: f64, angle: f64) -> Self {
        EntityLocation {
            position: DVec3::new(radius * angle.cos(), 0.0, radius * angle.sin()),
            heading: -angle,
        }
    }
}
