use gilrs::{Axis, Button, EventType};
use tracing::info;
use winit::event::{ElementState, TouchPhase, VirtualKeyCode};

use ringroad_core::player_inputs::{Direction, InputEvent};

use crate::application::Application;
use crate::client_events::Watching;

// full stick deflection reads as this much device tilt
pub const STICK_TILT_DEGREES: f32 = 30.0;

pub fn key_direction(key: VirtualKeyCode) -> Option<Direction> {
    match key {
        VirtualKeyCode::Up => Some(Direction::Forward),
        VirtualKeyCode::Down => Some(Direction::Backward),
        _ => None,
    }
}

pub fn pointer_event(state: ElementState) -> InputEvent {
    match state {
        ElementState::Pressed => InputEvent::SetIntent(Direction::Forward),
        ElementState::Released => InputEvent::ClearIntent,
    }
}

pub fn touch_event(phase: TouchPhase) -> Option<InputEvent> {
    match phase {
        TouchPhase::Started => Some(InputEvent::SetIntent(Direction::Forward)),
        TouchPhase::Ended | TouchPhase::Cancelled => Some(InputEvent::ClearIntent),
        TouchPhase::Moved => None,
    }
}

// Button values are in [0, 1]; triggers report partial presses
pub fn button_event(button: Button, value: f32) -> Option<InputEvent> {
    let direction = match button {
        Button::RightTrigger2 | Button::South => Direction::Forward,
        Button::LeftTrigger2 => Direction::Backward,
        _ => return None,
    };

    Some(if value > 0.0 {
        InputEvent::SetIntent(direction)
    } else {
        InputEvent::ReleaseIntent(direction)
    })
}

/// The right stick stands in for tilting the device. Axes arrive one at a
/// time, so the last value of each is kept to report both together.
#[derive(Copy, Clone, Debug, Default)]
pub struct StickTilt {
    x: f32,
    y: f32,
}

impl StickTilt {
    // Axis values are in [-1, 1]
    pub fn update(&mut self, axis: Axis, value: f32) -> Option<InputEvent> {
        match axis {
            Axis::RightStickX => self.x = value,
            Axis::RightStickY => self.y = value,
            _ => return None,
        }

        Some(InputEvent::Orientation {
            gamma: Some(self.x * STICK_TILT_DEGREES),
            beta: Some(self.y * STICK_TILT_DEGREES),
        })
    }
}

impl Watching for Application {
    fn on_key_down(&mut self, key: VirtualKeyCode) {
        // winit repeats keydown while a key is held
        if !self.pressed_keys.insert(key) {
            return;
        }

        if let Some(direction) = key_direction(key) {
            self.queue_input(InputEvent::SetIntent(direction));
        }
    }

    fn on_key_up(&mut self, key: VirtualKeyCode) {
        self.pressed_keys.remove(&key);

        if let Some(direction) = key_direction(key) {
            self.queue_input(InputEvent::ReleaseIntent(direction));
        }
    }

    fn on_left_mouse(&mut self, state: ElementState) {
        self.queue_input(pointer_event(state));
    }

    fn on_touch(&mut self, phase: TouchPhase) {
        if let Some(event) = touch_event(phase) {
            self.queue_input(event);
        }
    }

    fn on_gamepad(&mut self, event: gilrs::Event) {
        let input_event = match event.event {
            EventType::ButtonChanged(button, value, _) => button_event(button, value),
            EventType::AxisChanged(axis, value, _) => self.stick_tilt.update(axis, value),
            EventType::Connected => {
                info!("connected gamepad #{}", event.id);
                None
            }
            EventType::Disconnected => {
                info!("gamepad #{} disconnected", event.id);
                None
            }
            _ => None,
        };

        if let Some(input_event) = input_event {
            self.queue_input(input_event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_keys_pick_a_direction() {
        assert_eq!(key_direction(VirtualKeyCode::Up), Some(Direction::Forward));
        assert_eq!(key_direction(VirtualKeyCode::Down), Some(Direction::Backward));
        assert_eq!(key_direction(VirtualKeyCode::W), None);
    }

    #[test]
    fn test_pointer_release_clears_intent() {
        assert_eq!(
            pointer_event(ElementState::Pressed),
            InputEvent::SetIntent(Direction::Forward)
        );
        assert_eq!(pointer_event(ElementState::Released), InputEvent::ClearIntent);
    }

    #[test]
    fn test_touch_drag_is_ignored() {
        assert_eq!(touch_event(TouchPhase::Moved), None);
        assert_eq!(touch_event(TouchPhase::Cancelled), Some(InputEvent::ClearIntent));
    }

    #[test]
    fn test_trigger_release_only_drops_its_own_direction() {
        assert_eq!(
            button_event(Button::LeftTrigger2, 0.4),
            Some(InputEvent::SetIntent(Direction::Backward))
        );
        assert_eq!(
            button_event(Button::RightTrigger2, 0.0),
            Some(InputEvent::ReleaseIntent(Direction::Forward))
        );
        assert_eq!(button_event(Button::Start, 1.0), None);
    }

    #[test]
    fn test_stick_reports_both_axes() {
        let mut tilt = StickTilt::default();
        tilt.update(Axis::RightStickX, 0.5);

        assert_eq!(
            tilt.update(Axis::RightStickY, -1.0),
            Some(InputEvent::Orientation {
                gamma: Some(15.0),
                beta: Some(-30.0),
            })
        );
        assert_eq!(tilt.update(Axis::LeftStickX, 1.0), None);
    }
}
