//! Waveform transform error types

use thiserror::Error;

/// Errors raised by the extract / remap / render / serialize pipeline.
///
/// All of these are structural input problems; none are worth retrying.
#[derive(Error, Debug)]
pub enum WaveformError {
    /// Raster missing, undecodable, or smaller than the requested scan area
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    /// Nearest-color lookup against an empty palette
    #[error("No palette color to match {0}")]
    ColorNotFound(String),

    /// Amplitude outside [0, height] or a sequence shorter than the canvas
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Raster cannot be written losslessly as an indexed image
    #[error("Unsupported color depth: {0}")]
    UnsupportedColorDepth(String),

    /// Hex color string that could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// PNG encoder failure
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),

    /// JSON serialization failure
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WaveformError>;
