use crate::codec::{Codec, EncodeParams, EncodeRequest};
use crate::constants::{
    DEFAULT_MIN_SIZE, DEFAULT_QUALITY, MAX_QUALITY, PROGRESSIVE_JPEG_THRESHOLD, WEBP_QUALITY_DROP,
    WEBP_QUALITY_FLOOR,
};
use crate::error::{CompressionError, Result};
use crate::formats::{resolve_format, TargetFormat};
use crate::strategy::{select_best_png, PngContext, PngMethod};
use crate::utils::reduction_percent;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Resolved per-run options, immutable once the batch starts.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub quality: u8,
    pub resize: Option<(u32, u32)>,
    pub format: Option<TargetFormat>,
    pub skip_small: bool,
    pub min_size: u64,
    pub aggressive_png: bool,
    pub ultra_png: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        ProcessOptions {
            quality: DEFAULT_QUALITY,
            resize: None,
            format: None,
            skip_small: true,
            min_size: DEFAULT_MIN_SIZE,
            aggressive_png: false,
            ultra_png: false,
        }
    }
}

impl ProcessOptions {
    /// Defensive check at the processing boundary; the CLI validates
    /// earlier, but config files can carry arbitrary numbers.
    pub fn validate(&self) -> Result<()> {
        if self.quality > MAX_QUALITY {
            return Err(CompressionError::InvalidQuality(self.quality));
        }
        if let Some((w, h)) = self.resize {
            if w == 0 || h == 0 {
                return Err(CompressionError::InvalidResize(format!("{}x{}", w, h)));
            }
        }
        Ok(())
    }
}

/// Terminal state of one file. The three cases are mutually exclusive by
/// construction; a result can never carry both a skip reason and an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Compressed { method: Option<PngMethod> },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub input_size: u64,
    pub output_size: u64,
    pub reduction_percent: i32,
    pub processing_time: Duration,
    pub outcome: Outcome,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed { .. })
    }

    pub fn skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    pub(crate) fn failure(
        input_path: &Path,
        output_path: &Path,
        processing_time: Duration,
        error: String,
    ) -> Self {
        ProcessResult {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            input_size: 0,
            output_size: 0,
            reduction_percent: 0,
            processing_time,
            outcome: Outcome::Failed { error },
        }
    }
}

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CompressionError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Skip condition for the size gate.
pub fn should_skip_small(input_size: u64, options: &ProcessOptions) -> bool {
    options.skip_small && input_size < options.min_size
}

/// WebP quality after the cross-format "try harder" adjustment. The
/// aggressive flag is named for PNG but intentionally read here too.
pub fn webp_quality(quality: u8, aggressive: bool) -> u8 {
    if aggressive {
        quality
            .saturating_sub(WEBP_QUALITY_DROP)
            .max(WEBP_QUALITY_FLOOR)
    } else {
        quality
    }
}

/// Process one file: size gate, format dispatch, encode, write, result.
/// Never panics and never returns an error; every failure is folded into
/// the file's own `ProcessResult`.
pub fn process_image(
    codec: &dyn Codec,
    input: &Path,
    output: &Path,
    options: &ProcessOptions,
) -> ProcessResult {
    let started = Instant::now();
    match process_inner(codec, input, output, options) {
        Ok(mut result) => {
            result.processing_time = started.elapsed();
            result
        }
        Err(e) => ProcessResult::failure(input, output, started.elapsed(), e.to_string()),
    }
}

fn process_inner(
    codec: &dyn Codec,
    input: &Path,
    output: &Path,
    options: &ProcessOptions,
) -> Result<ProcessResult> {
    options.validate()?;
    validate_file_exists(input)?;

    let input_size = fs::metadata(input)?.len();

    if should_skip_small(input_size, options) {
        copy_verbatim(input, output)?;
        return Ok(ProcessResult {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            input_size,
            output_size: input_size,
            reduction_percent: 0,
            processing_time: Duration::ZERO,
            outcome: Outcome::Skipped {
                reason: format!(
                    "file below minimum size ({} bytes, min: {})",
                    input_size, options.min_size
                ),
            },
        });
    }

    let target = resolve_format(input, options.format);

    let (bytes, method) = match target {
        TargetFormat::Png => {
            let metadata = codec.decode_metadata(input)?;
            let selection = select_best_png(
                codec,
                &PngContext {
                    source: input,
                    resize: options.resize,
                    input_size,
                    quality: options.quality,
                    aggressive: options.aggressive_png,
                    ultra: options.ultra_png,
                    metadata: &metadata,
                },
            )?;
            (selection.buffer, Some(selection.method))
        }
        TargetFormat::Jpeg => {
            let request = EncodeRequest {
                resize: options.resize,
                params: EncodeParams::Jpeg {
                    quality: options.quality,
                    progressive: input_size > PROGRESSIVE_JPEG_THRESHOLD,
                },
            };
            (codec.encode(input, &request)?, None)
        }
        TargetFormat::WebP => {
            let request = EncodeRequest {
                resize: options.resize,
                params: EncodeParams::WebP {
                    quality: webp_quality(options.quality, options.aggressive_png),
                    effort_boost: options.aggressive_png,
                },
            };
            (codec.encode(input, &request)?, None)
        }
        TargetFormat::Unchanged => {
            let request = EncodeRequest {
                resize: options.resize,
                params: EncodeParams::Original,
            };
            (codec.encode(input, &request)?, None)
        }
    };

    codec.write_file(output, &bytes)?;
    let output_size = bytes.len() as u64;

    Ok(ProcessResult {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        input_size,
        output_size,
        reduction_percent: reduction_percent(input_size, output_size),
        processing_time: Duration::ZERO,
        outcome: Outcome::Compressed { method },
    })
}

/// The gate copies source bytes exactly; skipped files are never
/// re-encoded.
fn copy_verbatim(input: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .map_err(|_| CompressionError::DirectoryCreationFailed(parent.to_path_buf()))?;
    }
    fs::copy(input, output)?;
    Ok(())
}
