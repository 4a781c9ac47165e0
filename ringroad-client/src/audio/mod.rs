use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use once_cell::sync::OnceCell;
use rodio::{source::Buffered, Decoder, Sink, Source};
use tracing::{error, info, warn};

use ringroad_core::engine_sound::AudioBackend;

use crate::error::{AssetError, AudioError};

pub mod context;
pub mod loop_source;

use context::AudioCtx;
use loop_source::LoopingSource;

// Buffered Audio Source
pub type AudioBuffer = Buffered<Decoder<BufReader<File>>>;

pub fn decode_buffer(path: &Path) -> Result<AudioBuffer, AssetError> {
    let path_name = path.display().to_string();
    let file = File::open(path).map_err(|source| AssetError::Io {
        path: path_name.clone(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|source| AssetError::Decode {
        path: path_name,
        source,
    })?;

    let buffer = decoder.buffered();
    // walking a clone decodes every frame into the shared buffer
    buffer.clone().for_each(drop);
    Ok(buffer)
}

// One playing instance of the engine loop
pub struct EngineHandle {
    sink: Sink,
    looping: Arc<AtomicBool>,
}

/*
 * The engine sound backend. Decoding happens on its own thread; until it is done
 * (or if there is no output device at all) the backend reports itself as not
 * ready and the car simply drives in silence.
 */
pub struct EngineAudio {
    ctx: Option<AudioCtx>,
    buffer: Arc<OnceCell<AudioBuffer>>,
}

impl EngineAudio {
    pub fn new(path: PathBuf) -> Self {
        let ctx = match AudioCtx::new() {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                warn!("engine sound disabled: {}", err);
                None
            }
        };

        let buffer = Arc::new(OnceCell::new());
        if ctx.is_some() {
            let cell = buffer.clone();
            thread::spawn(move || match decode_buffer(&path) {
                Ok(decoded) => {
                    info!("decoded {}", path.display());
                    let _ = cell.set(decoded);
                }
                Err(err) => error!("engine sound unavailable: {}", err),
            });
        }

        Self { ctx, buffer }
    }
}

impl AudioBackend for EngineAudio {
    type Handle = EngineHandle;

    fn is_ready(&self) -> bool {
        self.ctx.is_some() && self.buffer.get().is_some()
    }

    fn start_loop(&mut self, gain: f32, rate: f32) -> Option<EngineHandle> {
        let ctx = self.ctx.as_ref()?;
        let buffer = self.buffer.get()?;

        let sink = match Sink::try_new(&ctx.stream_handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!("{}", AudioError::from(err));
                return None;
            }
        };

        let looping = Arc::new(AtomicBool::new(true));
        sink.set_volume(gain);
        sink.append(LoopingSource::new(buffer.clone(), looping.clone()).speed(rate));

        Some(EngineHandle { sink, looping })
    }

    fn end_loop(&mut self, handle: &EngineHandle) {
        handle.looping.store(false, Ordering::Relaxed);
    }

    fn has_finished(&self, handle: &EngineHandle) -> bool {
        handle.sink.empty()
    }

    fn release(&mut self, handle: EngineHandle) {
        handle.sink.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sound_file_is_an_io_error() {
        let err = decode_buffer(Path::new("does/not/exist.mp3")).err().unwrap();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
