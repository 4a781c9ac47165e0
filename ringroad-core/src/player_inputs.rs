use serde::{Deserialize, Serialize};

/// Which way around the track the car is being driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementIntent {
    Idle,
    Moving(Direction),
}

impl Default for MovementIntent {
    fn default() -> Self {
        MovementIntent::Idle
    }
}

impl MovementIntent {
    pub fn direction(self) -> Option<Direction> {
        match self {
            MovementIntent::Idle => None,
            MovementIntent::Moving(direction) => Some(direction),
        }
    }

    pub fn is_idle(self) -> bool {
        self == MovementIntent::Idle
    }
}

// InputEvents are queued by the client as they arrive from the window system
// and handed to the scene at the top of the next tick
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    // key down, button press, touch start
    SetIntent(Direction),
    // button release, touch end
    ClearIntent,
    // key up: only stops the car if that key is the one driving it
    ReleaseIntent(Direction),
    // raw device tilt in degrees; a missing axis reads as level
    Orientation { gamma: Option<f32>, beta: Option<f32> },
}

/// Latches the most recent movement intent. Single writer (the event queue),
/// read once per tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct InputState {
    intent: MovementIntent,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent(&self) -> MovementIntent {
        self.intent
    }

    pub fn set_intent(&mut self, direction: Direction) {
        self.intent = MovementIntent::Moving(direction);
    }

    pub fn clear_intent(&mut self) {
        self.intent = MovementIntent::Idle;
    }

    pub fn release(&mut self, direction: Direction) {
        if self.intent == MovementIntent::Moving(direction) {
            self.clear_intent();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latches_last_intent() {
        let mut input = InputState::new();
        assert_eq!(input.intent(), MovementIntent::Idle);

        input.set_intent(Direction::Forward);
        input.set_intent(Direction::Backward);
        assert_eq!(input.intent(), MovementIntent::Moving(Direction::Backward));

        input.clear_intent();
        assert!(input.intent().is_idle());
    }

    #[test]
    fn test_release_of_other_key_keeps_driving() {
        let mut input = InputState::new();
        input.set_intent(Direction::Backward);

        // releasing ArrowUp while ArrowDown is what's driving changes nothing
        input.release(Direction::Forward);
        assert_eq!(input.intent().direction(), Some(Direction::Backward));

        input.release(Direction::Backward);
        assert_eq!(input.intent().direction(), None);
    }
}
