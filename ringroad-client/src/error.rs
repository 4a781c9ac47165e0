use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("no graphics adapter can present to this window")]
    NoAdapter,
    #[error("failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface is not compatible with the adapter")]
    IncompatibleSurface,
}

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("failed to parse shader for pass {pass}:\n{message}")]
    Parse { pass: String, message: String },
    #[error("unsupported {0} in shader")]
    Unsupported(&'static str),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to import {path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("{0} has no scenes")]
    NoScene(String),
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: rodio::decoder::DecoderError,
    },
    #[error("no system font to draw text with: {0}")]
    FontSelection(#[from] font_kit::error::SelectionError),
    #[error("failed to load font: {0}")]
    FontLoad(#[from] font_kit::error::FontLoadingError),
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("failed to open audio sink: {0}")]
    Play(#[from] rodio::PlayError),
}
