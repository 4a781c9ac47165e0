use crate::entity_location::EntityLocation;
use crate::player_inputs::{Direction, MovementIntent};
use crate::settings::Settings;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KinematicsParams {
    pub radius: f64,
    pub max_speed: f64,
    // both in radians per tick, per tick
    pub acceleration: f64,
    pub deceleration: f64,
}

impl Default for KinematicsParams {
    fn default() -> Self {
        Self {
            radius: 5.0,
            max_speed: 0.02,
            acceleration: 0.0002,
            deceleration: 0.0002,
        }
    }
}

impl From<&Settings> for KinematicsParams {
    fn from(settings: &Settings) -> Self {
        Self {
            radius: settings.track_radius,
            max_speed: settings.max_speed,
            acceleration: settings.acceleration,
            deceleration: settings.deceleration,
        }
    }
}

/*
 * The car only ever moves along a circle around the origin, so its whole
 * state is an angle on that circle and a (non-negative) angular speed.
 * Speed is integrated in fixed per-tick increments; the client is responsible
 * for calling advance() at a steady tick rate.
 */
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CarState {
    pub angle: f64,
    pub speed: f64,
    // the direction the car was last driven in, so that it keeps rolling the
    // same way after the intent is released
    pub direction: Direction,
}

impl CarState {
    pub fn new(start_angle: f64) -> Self {
        CarState {
            angle: start_angle,
            speed: 0.0,
            direction: Direction::Forward,
        }
    }

    pub fn advance(&mut self, intent: MovementIntent, params: &KinematicsParams) {
        match intent {
            MovementIntent::Moving(direction) => {
                self.direction = direction;
                self.speed = (self.speed + params.acceleration).min(params.max_speed);
            }
            MovementIntent::Idle => {
                self.speed = (self.speed - params.deceleration).max(0.0);
            }
        }

        if self.speed > 0.0 {
            self.angle += self.speed * self.direction.sign();
        }
    }

    pub fn is_moving(&self) -> bool {
        self.speed > 0.0
    }

    pub fn location(&self, params: &KinematicsParams) -> EntityLocation {
        EntityLocation::on_circle(params.radius, self.angle)
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;

    const FORWARD: MovementIntent = MovementIntent::Moving(Direction::Forward);
    const BACKWARD: MovementIntent = MovementIntent::Moving(Direction::Backward);

    #[test]
    fn test_speed_saturates_after_100_ticks() {
        let params = KinematicsParams::default();
        let mut car = CarState::new(0.0);

        let mut speeds = Vec::new();
        for _ in 0..200 {
            car.advance(FORWARD, &params);
            speeds.push(car.speed);
        }

        // non-decreasing the whole way
        assert!(speeds.windows(2).all(|pair| pair[1] >= pair[0]));
        // still climbing just before the 100th tick, and capped from then on
        assert!(speeds[98] < params.max_speed);
        assert!((speeds[99] - params.max_speed).abs() < 1e-12);
        assert!(speeds[100..].iter().all(|&s| s == params.max_speed));
    }

    #[test]
    fn test_release_decelerates_to_exactly_zero() {
        let params = KinematicsParams::default();
        let mut car = CarState::new(0.0);
        for _ in 0..150 {
            car.advance(FORWARD, &params);
        }

        let mut last_speed = car.speed;
        for _ in 0..300 {
            car.advance(MovementIntent::Idle, &params);
            assert!(car.speed <= last_speed);
            assert!(car.speed >= 0.0);
            last_speed = car.speed;
        }
        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn test_angle_only_changes_while_moving() {
        let params = KinematicsParams::default();
        let mut car = CarState::new(1.0);

        car.advance(MovementIntent::Idle, &params);
        assert_eq!(car.angle, 1.0);

        car.advance(FORWARD, &params);
        assert!(car.angle > 1.0);

        let mut reverse = CarState::new(1.0);
        reverse.advance(BACKWARD, &params);
        assert!(reverse.angle < 1.0);
    }

    #[test]
    fn test_released_car_coasts_in_driven_direction() {
        let params = KinematicsParams::default();
        let mut car = CarState::new(0.0);
        for _ in 0..10 {
            car.advance(BACKWARD, &params);
        }

        let angle_at_release = car.angle;
        car.advance(MovementIntent::Idle, &params);
        assert!(car.is_moving());
        assert!(car.angle < angle_at_release);

        // once stopped it stays put
        for _ in 0..20 {
            car.advance(MovementIntent::Idle, &params);
        }
        let stopped_angle = car.angle;
        car.advance(MovementIntent::Idle, &params);
        assert_eq!(car.angle, stopped_angle);
    }

    #[test]
    fn test_location_lies_on_track() {
        let params = KinematicsParams::default();
        let car = CarState::new(130f64.to_radians());
        let location = car.location(&params);

        assert!((location.position.length() - params.radius).abs() < 1e-9);
        assert_eq!(location.position.y, 0.0);
        assert_eq!(location.heading, -car.angle);

        let quarter = CarState::new(std::f64::consts::FRAC_PI_2).location(&params);
        assert!(quarter
            .position
            .abs_diff_eq(DVec3::new(0.0, 0.0, 5.0), 1e-9));
    }
}
