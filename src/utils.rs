use crate::constants::SUPPORTED_EXTENSIONS;
use crate::error::{CompressionError, Result};
use std::path::Path;

/// Check whether a path carries one of the supported image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// Parse a `WIDTHxHEIGHT` resize specification like `800x600`.
pub fn parse_resize_option(spec: &str) -> Result<(u32, u32)> {
    let invalid = || CompressionError::InvalidResize(spec.to_string());

    let (w, h) = spec.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    let height: u32 = h.parse().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

/// Format file size in human-readable units.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Signed percentage change from input to output size, rounded to the
/// nearest integer. Positive means the file shrank. Zero when the input
/// size is zero.
pub fn reduction_percent(input_size: u64, output_size: u64) -> i32 {
    if input_size == 0 {
        return 0;
    }
    ((1.0 - output_size as f64 / input_size as f64) * 100.0).round() as i32
}
