use rodio::{OutputStream, OutputStreamHandle};

use crate::error::AudioError;

// Keeps the output stream alive for as long as sounds are played through the handle
pub struct AudioCtx {
    _stream: OutputStream,
    pub stream_handle: OutputStreamHandle,
}

impl AudioCtx {
    pub fn new() -> Result<Self, AudioError> {
        let (_stream, stream_handle) = OutputStream::try_default()?;

        Ok(Self {
            _stream,
            stream_handle,
        })
    }
}
