use std::io;
use thiserror::Error;

/// Errors raised by the canvas engine.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("canvas size {width}x{height} is not drawable")]
    InvalidCanvasSize { width: u32, height: u32 },

    #[error("element {index} does not exist")]
    NoSuchElement { index: usize },

    #[error("cannot replace a {existing} element with a {replacement} element")]
    VariantMismatch {
        existing: &'static str,
        replacement: &'static str,
    },

    #[error("unsupported image source: {0}")]
    UnsupportedImageSource(String),

    #[error("image is {size} bytes, limit is {limit}")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("font {path} could not be loaded: {reason}")]
    Font { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EditorError>;
