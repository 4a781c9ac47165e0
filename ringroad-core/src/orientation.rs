use glam::Vec2;

use crate::settings::Settings;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrientationParams {
    /// Tilt beyond this many degrees (either way) is treated as this many.
    pub limit_degrees: f32,
    /// Camera offset at full tilt, x from gamma (left/right) and y from beta
    /// (forward/back).
    pub scale: Vec2,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            limit_degrees: 30.0,
            scale: Vec2::new(1.2, 0.7),
        }
    }
}

impl From<&Settings> for OrientationParams {
    fn from(settings: &Settings) -> Self {
        Self {
            limit_degrees: settings.tilt_limit_degrees,
            scale: Vec2::from(settings.tilt_scale),
        }
    }
}

/// Turns a device tilt sample into a camera offset. Each sample replaces the
/// previous offset entirely. A limit that is not a positive number turns tilt off.
pub fn sample_orientation(
    gamma: Option<f32>,
    beta: Option<f32>,
    params: &OrientationParams,
) -> Vec2 {
    let limit = params.limit_degrees;
    if !(limit.is_finite() && limit > 0.0) {
        return Vec2::ZERO;
    }
    let clamp = |degrees: Option<f32>| {
        let degrees = degrees.filter(|d| d.is_finite()).unwrap_or(0.0);
        degrees.clamp(-limit, limit) / limit
    };

    Vec2::new(clamp(gamma), clamp(beta)) * params.scale
}
