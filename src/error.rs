use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Palette quantization error: {0}")]
    Quantization(String),

    #[error("JPEG encoding error: {0}")]
    JpegEncoding(String),

    #[error("WebP encoding error: {0}")]
    WebPEncoding(String),

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("Invalid resize specification: {0}. Use WIDTHxHEIGHT (e.g. 800x600)")]
    InvalidResize(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to parse config file {0}: {1}")]
    ConfigParse(PathBuf, String),
}

pub type Result<T> = std::result::Result<T, CompressionError>;
