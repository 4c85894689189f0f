/// Target-format resolution.
///
/// An explicit `--format` override always wins. Without one, the source
/// extension decides: jpg/jpeg, png and webp map to their own encoders,
/// while the remaining allow-listed extensions (tiff, bmp) resolve to
/// `Unchanged` and are re-encoded with the source format's own defaults.
use crate::error::{CompressionError, Result};
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
    Png,
    WebP,
    /// Keep the source format; tiff/bmp land here.
    Unchanged,
}

impl TargetFormat {
    /// File extension used when rewriting output names.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            TargetFormat::Jpeg => Some("jpg"),
            TargetFormat::Png => Some("png"),
            TargetFormat::WebP => Some("webp"),
            TargetFormat::Unchanged => None,
        }
    }

    pub fn to_image_format(&self) -> Option<ImageFormat> {
        match self {
            TargetFormat::Jpeg => Some(ImageFormat::Jpeg),
            TargetFormat::Png => Some(ImageFormat::Png),
            TargetFormat::WebP => Some(ImageFormat::WebP),
            TargetFormat::Unchanged => None,
        }
    }

    /// Format names accepted by the CLI `--format` option.
    pub fn format_names() -> Vec<&'static str> {
        vec!["jpeg", "png", "webp"]
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Png => "PNG",
            TargetFormat::WebP => "WebP",
            TargetFormat::Unchanged => "unchanged",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TargetFormat {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::WebP),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Resolve the encoding target for one source file.
pub fn resolve_format(source: &Path, format_override: Option<TargetFormat>) -> TargetFormat {
    if let Some(fmt) = format_override {
        return fmt;
    }

    match source
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => TargetFormat::Jpeg,
        Some("png") => TargetFormat::Png,
        Some("webp") => TargetFormat::WebP,
        _ => TargetFormat::Unchanged,
    }
}
