use glam::{Vec2, Vec3};

use crate::settings::Settings;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub base: Vec3,
    pub smoothing: f32,
    // fixed pitch about X in radians
    pub pitch: f32,
    pub fov_y_degrees: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            base: Vec3::new(0.0, 5.0, 13.0),
            smoothing: 0.08,
            pitch: 6.0,
            fov_y_degrees: 75.0,
        }
    }
}

impl From<&Settings> for CameraParams {
    fn from(settings: &Settings) -> Self {
        Self {
            base: Vec3::from(settings.camera_base),
            smoothing: settings.camera_smoothing,
            pitch: settings.camera_pitch,
            fov_y_degrees: settings.camera_fov_degrees,
        }
    }
}

/// A camera that eases toward its base position shifted by the current tilt
/// offset. Only x and y follow; z stays where it started.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FollowCamera {
    pub position: Vec3,
}

impl FollowCamera {
    pub fn new(params: &CameraParams) -> Self {
        Self {
            position: params.base,
        }
    }

    pub fn follow(&mut self, offset: Vec2, params: &CameraParams) {
        self.position = follow(self.position, params.base, offset, params.smoothing);
    }

    pub fn view_mat4(&self, params: &CameraParams) -> glam::Mat4 {
        let world = glam::Mat4::from_translation(self.position)
            * glam::Mat4::from_rotation_x(params.pitch);
        world.inverse()
    }

    pub fn proj_mat4(&self, params: &CameraParams, aspect: f32) -> glam::Mat4 {
        glam::Mat4::perspective_rh(params.fov_y_degrees.to_radians(), aspect, 0.1, 1000.0)
    }
}

pub fn follow(position: Vec3, base: Vec3, offset: Vec2, smoothing: f32) -> Vec3 {
    let target = base.truncate() + offset;
    let eased = position.truncate() + (target - position.truncate()) * smoothing;
    eased.extend(position.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_without_overshoot() {
        let params = CameraParams::default();
        let mut camera = FollowCamera::new(&params);
        let offset = Vec2::new(1.2, -0.7);
        let target = params.base.truncate() + offset;

        let mut last_gap = (target - camera.position.truncate()).length();
        for _ in 0..200 {
            camera.follow(offset, &params);
            let gap = target - camera.position.truncate();
            // never passes the target on either axis
            assert!(gap.x >= 0.0 && gap.y <= 0.0);
            assert!(gap.length() <= last_gap);
            last_gap = gap.length();
        }
        assert!(last_gap < 1e-4);
    }

    #[test]
    fn test_z_is_untouched() {
        let moved = follow(Vec3::new(3.0, 1.0, 42.0), Vec3::new(0.0, 5.0, 13.0), Vec2::ZERO, 0.08);
        assert_eq!(moved.z, 42.0);
        assert!(moved.abs_diff_eq(Vec3::new(2.76, 1.32, 42.0), 1e-5));
    }

    #[test]
    fn test_recenters_without_offset() {
        let params = CameraParams::default();
        let mut camera = FollowCamera {
            position: Vec3::new(1.2, 4.3, 13.0),
        };
        for _ in 0..400 {
            camera.follow(Vec2::ZERO, &params);
        }
        assert!(camera.position.abs_diff_eq(params.base, 1e-4));
    }
}
