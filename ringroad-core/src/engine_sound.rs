use tracing::debug;

use crate::settings::Settings;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineSoundParams {
    pub gain: f32,
    pub rate: f32,
}

impl Default for EngineSoundParams {
    fn default() -> Self {
        Self {
            gain: 0.12,
            rate: 1.0,
        }
    }
}

impl From<&Settings> for EngineSoundParams {
    fn from(settings: &Settings) -> Self {
        Self {
            gain: settings.engine_gain,
            rate: settings.engine_rate,
        }
    }
}

/*
 * Whatever actually makes noise. The engine sound is one decoded buffer that
 * gets played as a looping instance; an instance can be told to stop looping,
 * at which point it finishes its current cycle and reports itself finished.
 */
pub trait AudioBackend {
    type Handle;

    // false until the buffer has finished decoding (or forever, if it failed)
    fn is_ready(&self) -> bool;
    fn start_loop(&mut self, gain: f32, rate: f32) -> Option<Self::Handle>;
    fn end_loop(&mut self, handle: &Self::Handle);
    fn has_finished(&self, handle: &Self::Handle) -> bool;
    fn release(&mut self, handle: Self::Handle);
}

pub enum EngineSoundState<H> {
    Silent,
    Playing(H),
    Stopping(H),
}

impl<H> EngineSoundState<H> {
    pub fn name(&self) -> &'static str {
        match self {
            EngineSoundState::Silent => "silent",
            EngineSoundState::Playing(_) => "playing",
            EngineSoundState::Stopping(_) => "stopping",
        }
    }
}

/// Owns the (at most one) engine sound instance and decides when it plays.
pub struct EngineSoundGate<H> {
    state: EngineSoundState<H>,
}

impl<H> Default for EngineSoundGate<H> {
    fn default() -> Self {
        Self {
            state: EngineSoundState::Silent,
        }
    }
}

impl<H> EngineSoundGate<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineSoundState<H> {
        &self.state
    }

    pub fn is_silent(&self) -> bool {
        matches!(self.state, EngineSoundState::Silent)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, EngineSoundState::Playing(_))
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self.state, EngineSoundState::Stopping(_))
    }

    /// Called once per tick with the car's speed after it has been integrated.
    pub fn update<B>(&mut self, speed: f64, backend: &mut B, params: &EngineSoundParams)
    where
        B: AudioBackend<Handle = H>,
    {
        self.poll_finished(backend);

        if speed > 0.0 {
            self.request_start(backend, params);
        } else {
            self.request_stop(backend);
        }
    }

    fn request_start<B>(&mut self, backend: &mut B, params: &EngineSoundParams)
    where
        B: AudioBackend<Handle = H>,
    {
        // anything other than silent already has an instance alive
        if !self.is_silent() || !backend.is_ready() {
            return;
        }

        if let Some(handle) = backend.start_loop(params.gain, params.rate) {
            debug!("engine sound: silent -> playing");
            self.state = EngineSoundState::Playing(handle);
        }
    }

    fn request_stop<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend<Handle = H>,
    {
        let state = std::mem::replace(&mut self.state, EngineSoundState::Silent);
        self.state = match state {
            EngineSoundState::Playing(handle) => {
                backend.end_loop(&handle);
                debug!("engine sound: playing -> stopping");
                EngineSoundState::Stopping(handle)
            }
            other => other,
        };
    }

    /// The playback-end notification: a stopping instance that has run out is
    /// released and the gate goes back to silent.
    pub fn poll_finished<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend<Handle = H>,
    {
        let finished = match &self.state {
            EngineSoundState::Stopping(handle) => backend.has_finished(handle),
            _ => false,
        };

        if finished {
            if let EngineSoundState::Stopping(handle) =
                std::mem::replace(&mut self.state, EngineSoundState::Silent)
            {
                backend.release(handle);
                debug!("engine sound: stopping -> silent");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // A backend whose instances play for a fixed number of polls after their
    // loop is switched off.
    #[derive(Default)]
    pub struct FakeAudio {
        pub ready: bool,
        pub started: Vec<(f32, f32)>,
        pub released: usize,
        pub looping: bool,
        pub ticks_left_in_cycle: u32,
        pub cycle_length: u32,
    }

    impl FakeAudio {
        pub fn ready() -> Self {
            FakeAudio {
                ready: true,
                cycle_length: 3,
                ..Default::default()
            }
        }

        // advance playback by one tick
        pub fn play(&mut self) {
            if self.ticks_left_in_cycle > 0 {
                self.ticks_left_in_cycle -= 1;
            }
        }
    }

    impl AudioBackend for FakeAudio {
        type Handle = usize;

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn start_loop(&mut self, gain: f32, rate: f32) -> Option<usize> {
            self.started.push((gain, rate));
            self.looping = true;
            self.ticks_left_in_cycle = self.cycle_length;
            Some(self.started.len() - 1)
        }

        fn end_loop(&mut self, _: &usize) {
            self.looping = false;
        }

        fn has_finished(&self, _: &usize) -> bool {
            !self.looping && self.ticks_left_in_cycle == 0
        }

        fn release(&mut self, _: usize) {
            self.released += 1;
        }
    }

    #[test]
    fn test_starts_once_when_moving() {
        let mut audio = FakeAudio::ready();
        let mut gate = EngineSoundGate::new();
        let params = EngineSoundParams::default();

        gate.update(0.001, &mut audio, &params);
        gate.update(0.002, &mut audio, &params);
        gate.update(0.003, &mut audio, &params);

        assert!(gate.is_playing());
        assert_eq!(audio.started, vec![(0.12, 1.0)]);
    }

    #[test]
    fn test_start_before_decode_is_dropped() {
        let mut audio = FakeAudio::default();
        let mut gate = EngineSoundGate::new();
        let params = EngineSoundParams::default();

        gate.update(0.01, &mut audio, &params);
        assert!(gate.is_silent());

        // no queued request fires once the buffer shows up; only the next
        // moving tick starts it
        audio.ready = true;
        assert!(audio.started.is_empty());
        gate.update(0.01, &mut audio, &params);
        assert!(gate.is_playing());
    }

    #[test]
    fn test_stop_waits_for_cycle_to_finish() {
        let mut audio = FakeAudio::ready();
        let mut gate = EngineSoundGate::new();
        let params = EngineSoundParams::default();

        gate.update(0.01, &mut audio, &params);
        gate.update(0.0, &mut audio, &params);
        assert!(gate.is_stopping());
        assert!(!audio.looping);

        // still sounding while the last cycle plays out
        audio.play();
        gate.update(0.0, &mut audio, &params);
        assert!(gate.is_stopping());
        audio.play();
        gate.update(0.0, &mut audio, &params);
        assert!(gate.is_stopping());

        audio.play();
        gate.update(0.0, &mut audio, &params);
        assert!(gate.is_silent());
        assert_eq!(audio.released, 1);
    }

    #[test]
    fn test_no_second_instance_while_stopping() {
        let mut audio = FakeAudio::ready();
        let mut gate = EngineSoundGate::new();
        let params = EngineSoundParams::default();

        gate.update(0.01, &mut audio, &params);
        gate.update(0.0, &mut audio, &params);
        gate.update(0.01, &mut audio, &params);
        assert!(gate.is_stopping());
        assert_eq!(audio.started.len(), 1);

        for _ in 0..3 {
            audio.play();
        }
        // the finished instance is released first, then a fresh one starts
        gate.update(0.01, &mut audio, &params);
        assert!(gate.is_playing());
        assert_eq!(audio.released, 1);
        assert_eq!(audio.started.len(), 2);
    }
}
