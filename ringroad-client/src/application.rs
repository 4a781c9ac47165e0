use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use gilrs::Gilrs;
use tracing::{debug, warn};
use winit::event::VirtualKeyCode;

use ringroad_core::player_inputs::InputEvent;
use ringroad_core::scene::Scene;
use ringroad_core::Settings;

use crate::audio::{EngineAudio, EngineHandle};
use crate::client_events::Watching;
use crate::graphics::GraphicsManager;
use crate::input::StickTilt;

// catching up after a long stall (window drag, breakpoint) is capped at this many ticks
const MAX_TICKS_PER_UPDATE: u32 = 5;

/// Splits banked time into whole ticks. Returns the number of ticks to run and
/// the time left over for the next call; past `max_ticks` the leftover is dropped.
fn due_ticks(accumulated: Duration, tick_length: Duration, max_ticks: u32) -> (u32, Duration) {
    let whole = accumulated.as_nanos() / tick_length.as_nanos().max(1);
    if whole > max_ticks as u128 {
        return (max_ticks, Duration::ZERO);
    }

    let ticks = whole as u32;
    (ticks, accumulated - tick_length * ticks)
}

pub struct Application {
    pub graphics: GraphicsManager,
    pub pressed_keys: HashSet<VirtualKeyCode>,
    pub stick_tilt: StickTilt,
    audio: EngineAudio,
    gilrs: Option<Gilrs>,
    scene: Scene<EngineHandle>,
    pending_inputs: Vec<InputEvent>,
    tick_length: Duration,
    last_update: Instant,
    accumulated: Duration,
}

impl Application {
    pub fn new(graphics: GraphicsManager, settings: &Settings) -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(err) => {
                warn!("gamepad support unavailable: {}", err);
                None
            }
        };

        let audio = EngineAudio::new(PathBuf::from(
            settings.get_resource_path(&settings.engine_sound),
        ));

        Self {
            graphics,
            pressed_keys: HashSet::new(),
            stick_tilt: StickTilt::default(),
            audio,
            gilrs,
            scene: Scene::from_settings(settings),
            pending_inputs: Vec::new(),
            tick_length: Duration::from_secs_f64(1.0 / settings.tick_hz.max(1) as f64),
            last_update: Instant::now(),
            accumulated: Duration::ZERO,
        }
    }

    pub fn queue_input(&mut self, event: InputEvent) {
        self.pending_inputs.push(event);
    }

    fn poll_gamepads(&mut self) {
        let mut events = Vec::new();
        if let Some(gilrs) = self.gilrs.as_mut() {
            while let Some(event) = gilrs.next_event() {
                events.push(event);
            }
        }

        for event in events {
            self.on_gamepad(event);
        }
    }

    /// Runs however many fixed ticks have come due since the last call and
    /// returns when the next one is due. Each tick draws a frame. Only an
    /// out-of-memory surface is reported back.
    pub fn update(&mut self) -> Result<Instant, wgpu::SurfaceError> {
        self.poll_gamepads();
        self.graphics.poll_car_model();

        let now = Instant::now();
        let banked = self.accumulated + (now - self.last_update);
        let (ticks, leftover) = due_ticks(banked, self.tick_length, MAX_TICKS_PER_UPDATE);
        if banked >= self.tick_length * (MAX_TICKS_PER_UPDATE + 1) {
            debug!("dropping {:?} of simulation time", banked - self.tick_length * ticks);
        }
        self.accumulated = leftover;
        self.last_update = now;

        for _ in 0..ticks {
            let inputs = std::mem::take(&mut self.pending_inputs);
            self.scene.tick(inputs, &mut self.graphics, &mut self.audio);

            if let Some(err) = self.graphics.take_render_error() {
                if matches!(err, wgpu::SurfaceError::OutOfMemory) {
                    return Err(err);
                }
            }
        }

        Ok(self.next_tick_due())
    }

    pub fn next_tick_due(&self) -> Instant {
        self.last_update + self.tick_length.saturating_sub(self.accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_one_tick_keeps_the_remainder() {
        let (ticks, leftover) = due_ticks(Duration::from_millis(13), TICK, MAX_TICKS_PER_UPDATE);

        assert_eq!(ticks, 1);
        assert_eq!(leftover, Duration::from_millis(3));
    }

    #[test]
    fn test_short_of_a_tick_runs_nothing() {
        let (ticks, leftover) = due_ticks(Duration::from_millis(7), TICK, MAX_TICKS_PER_UPDATE);

        assert_eq!(ticks, 0);
        assert_eq!(leftover, Duration::from_millis(7));
    }

    #[test]
    fn test_late_update_catches_up() {
        let (ticks, leftover) = due_ticks(Duration::from_millis(35), TICK, MAX_TICKS_PER_UPDATE);

        assert_eq!(ticks, 3);
        assert_eq!(leftover, Duration::from_millis(5));
    }

    #[test]
    fn test_exactly_at_the_cap_keeps_the_remainder() {
        let (ticks, leftover) = due_ticks(Duration::from_millis(54), TICK, MAX_TICKS_PER_UPDATE);

        assert_eq!(ticks, 5);
        assert_eq!(leftover, Duration::from_millis(4));
    }

    #[test]
    fn test_stall_is_capped_and_dropped() {
        let (ticks, leftover) = due_ticks(Duration::from_secs(2), TICK, MAX_TICKS_PER_UPDATE);

        assert_eq!(ticks, MAX_TICKS_PER_UPDATE);
        assert_eq!(leftover, Duration::ZERO);
    }
}
