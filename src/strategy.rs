//! Multi-strategy PNG selection.
//!
//! A PNG target is encoded up to three times with escalating
//! aggressiveness; the smallest buffer wins. The cheap standard attempt
//! always runs, the expensive ones only when a flag forces them or the
//! best result so far has not compressed well enough relative to the
//! source file. A failing optional attempt is logged and dropped, never
//! propagated.

use crate::codec::{Codec, EncodeParams, EncodeRequest, ImageMetadata, PngParams};
use crate::constants::{
    AGGRESSIVE_ALPHA_MAX_COLORS, AGGRESSIVE_QUALITY_DROP, AGGRESSIVE_QUALITY_FLOOR,
    AGGRESSIVE_TRIGGER_PERCENT, MAX_PNG_COMPRESSION_LEVEL, ULTRA_ALPHA_MAX_COLORS,
    ULTRA_OPAQUE_MAX_COLORS, ULTRA_QUALITY_DROP, ULTRA_QUALITY_FLOOR, ULTRA_TRIGGER_PERCENT,
};
use crate::error::Result;
use crate::warn_msg;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngMethod {
    Standard,
    Aggressive,
    Ultra,
}

impl PngMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PngMethod::Standard => "standard",
            PngMethod::Aggressive => "aggressive",
            PngMethod::Ultra => "ultra",
        }
    }
}

impl fmt::Display for PngMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the selector needs to know about one PNG job.
#[derive(Debug, Clone)]
pub struct PngContext<'a> {
    pub source: &'a Path,
    pub resize: Option<(u32, u32)>,
    pub input_size: u64,
    pub quality: u8,
    pub aggressive: bool,
    pub ultra: bool,
    pub metadata: &'a ImageMetadata,
}

#[derive(Debug, Clone)]
pub struct PngSelection {
    pub buffer: Vec<u8>,
    pub method: PngMethod,
}

/// Map perceptual quality 0-100 onto deflate level 9-0 (rounded).
pub fn standard_compression_level(quality: u8) -> u8 {
    let raw = ((100 - quality as u32) * 9 + 50) / 100;
    raw.min(MAX_PNG_COMPRESSION_LEVEL as u32) as u8
}

pub fn standard_params(quality: u8, metadata: &ImageMetadata) -> PngParams {
    PngParams {
        compression_level: standard_compression_level(quality),
        palette: metadata.channels == 3,
        max_colors: None,
        dithering: false,
        quality,
        max_effort: false,
    }
}

pub fn aggressive_params(quality: u8, metadata: &ImageMetadata) -> PngParams {
    PngParams {
        compression_level: MAX_PNG_COMPRESSION_LEVEL,
        palette: true,
        max_colors: metadata.has_alpha.then_some(AGGRESSIVE_ALPHA_MAX_COLORS),
        dithering: true,
        quality: quality
            .saturating_sub(AGGRESSIVE_QUALITY_DROP)
            .max(AGGRESSIVE_QUALITY_FLOOR),
        max_effort: true,
    }
}

pub fn ultra_params(quality: u8, metadata: &ImageMetadata) -> PngParams {
    PngParams {
        compression_level: MAX_PNG_COMPRESSION_LEVEL,
        palette: true,
        max_colors: Some(if metadata.has_alpha {
            ULTRA_ALPHA_MAX_COLORS
        } else {
            ULTRA_OPAQUE_MAX_COLORS
        }),
        dithering: true,
        quality: quality
            .saturating_sub(ULTRA_QUALITY_DROP)
            .max(ULTRA_QUALITY_FLOOR),
        max_effort: true,
    }
}

/// Exact integer form of `size >= input * percent / 100`.
fn exceeds_ratio(size: u64, input_size: u64, percent: u64) -> bool {
    size.saturating_mul(100) >= input_size.saturating_mul(percent)
}

/// Run the strategy ladder and return the smallest encoded buffer.
///
/// The standard attempt's error is the caller's error; aggressive and
/// ultra attempts degrade gracefully. The winning buffer may still be
/// larger than the source file; that is a valid outcome, not a fallback
/// to the original bytes.
pub fn select_best_png(codec: &dyn Codec, ctx: &PngContext<'_>) -> Result<PngSelection> {
    let request = |params: PngParams| EncodeRequest {
        resize: ctx.resize,
        params: EncodeParams::Png(params),
    };

    let buffer = codec.encode(ctx.source, &request(standard_params(ctx.quality, ctx.metadata)))?;
    let mut best = PngSelection {
        buffer,
        method: PngMethod::Standard,
    };

    if ctx.aggressive
        || exceeds_ratio(
            best.buffer.len() as u64,
            ctx.input_size,
            AGGRESSIVE_TRIGGER_PERCENT,
        )
    {
        match codec.encode(ctx.source, &request(aggressive_params(ctx.quality, ctx.metadata))) {
            Ok(buf) if buf.len() < best.buffer.len() => {
                best = PngSelection {
                    buffer: buf,
                    method: PngMethod::Aggressive,
                };
            }
            Ok(_) => {}
            Err(e) => {
                warn_msg!("aggressive PNG attempt failed for {:?}: {}", ctx.source, e);
            }
        }
    }

    if ctx.ultra
        || exceeds_ratio(
            best.buffer.len() as u64,
            ctx.input_size,
            ULTRA_TRIGGER_PERCENT,
        )
    {
        match codec.encode(ctx.source, &request(ultra_params(ctx.quality, ctx.metadata))) {
            Ok(buf) if buf.len() < best.buffer.len() => {
                best = PngSelection {
                    buffer: buf,
                    method: PngMethod::Ultra,
                };
            }
            Ok(_) => {}
            Err(e) => {
                warn_msg!("ultra PNG attempt failed for {:?}: {}", ctx.source, e);
            }
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{buffer, classify, rgb_metadata, rgba_metadata, AttemptKind, FakeCodec};
    use crate::error::CompressionError;

    fn context<'a>(
        metadata: &'a ImageMetadata,
        input_size: u64,
        quality: u8,
        aggressive: bool,
        ultra: bool,
    ) -> PngContext<'a> {
        PngContext {
            source: Path::new("/in/test.png"),
            resize: None,
            input_size,
            quality,
            aggressive,
            ultra,
            metadata,
        }
    }

    fn sized_script(
        standard: usize,
        aggressive: Result<usize>,
        ultra: Result<usize>,
    ) -> impl Fn(&EncodeRequest) -> Result<Vec<u8>> + Send + Sync {
        move |request| match classify(request) {
            AttemptKind::StandardPng => Ok(buffer(standard)),
            AttemptKind::AggressivePng => match &aggressive {
                Ok(len) => Ok(buffer(*len)),
                Err(_) => Err(CompressionError::PngOptimization("scripted".to_string())),
            },
            AttemptKind::UltraPng => match &ultra {
                Ok(len) => Ok(buffer(*len)),
                Err(_) => Err(CompressionError::PngOptimization("scripted".to_string())),
            },
            other => panic!("unexpected attempt {:?}", other),
        }
    }

    #[test]
    fn test_standard_compression_level_mapping() {
        assert_eq!(standard_compression_level(100), 0);
        assert_eq!(standard_compression_level(80), 2);
        assert_eq!(standard_compression_level(50), 5);
        assert_eq!(standard_compression_level(0), 9);
    }

    #[test]
    fn test_standard_palette_follows_channel_count() {
        assert!(standard_params(80, &rgb_metadata()).palette);
        assert!(!standard_params(80, &rgba_metadata()).palette);
    }

    #[test]
    fn test_aggressive_quality_drop_and_floor() {
        assert_eq!(aggressive_params(80, &rgb_metadata()).quality, 50);
        assert_eq!(aggressive_params(30, &rgb_metadata()).quality, 20);
        assert_eq!(aggressive_params(10, &rgb_metadata()).quality, 20);
    }

    #[test]
    fn test_aggressive_color_cap_only_with_alpha() {
        assert_eq!(aggressive_params(80, &rgb_metadata()).max_colors, None);
        assert_eq!(
            aggressive_params(80, &rgba_metadata()).max_colors,
            Some(AGGRESSIVE_ALPHA_MAX_COLORS)
        );
    }

    #[test]
    fn test_ultra_quality_and_palette_caps() {
        assert_eq!(ultra_params(80, &rgb_metadata()).quality, 20);
        assert_eq!(ultra_params(50, &rgb_metadata()).quality, 5);
        assert_eq!(
            ultra_params(80, &rgb_metadata()).max_colors,
            Some(ULTRA_OPAQUE_MAX_COLORS)
        );
        assert_eq!(
            ultra_params(80, &rgba_metadata()).max_colors,
            Some(ULTRA_ALPHA_MAX_COLORS)
        );
    }

    #[test]
    fn test_good_standard_result_runs_alone() {
        // 10000/50000 = 20% of the input: both gates stay closed.
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(metadata.clone(), sized_script(10_000, Ok(1), Ok(1)));

        let selection =
            select_best_png(&codec, &context(&metadata, 50_000, 80, false, false)).unwrap();

        assert_eq!(selection.method, PngMethod::Standard);
        assert_eq!(selection.buffer.len(), 10_000);
        assert_eq!(codec.attempts(), vec![AttemptKind::StandardPng]);
    }

    #[test]
    fn test_escalation_chain_at_exact_thresholds() {
        // Standard 45000/50000 = 0.9 >= 0.8 opens the aggressive gate;
        // aggressive 30000/50000 lands exactly on the 0.6 ultra boundary.
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(metadata.clone(), sized_script(45_000, Ok(30_000), Ok(25_000)));

        let selection =
            select_best_png(&codec, &context(&metadata, 50_000, 80, false, false)).unwrap();

        assert_eq!(
            codec.attempts(),
            vec![
                AttemptKind::StandardPng,
                AttemptKind::AggressivePng,
                AttemptKind::UltraPng
            ]
        );
        assert_eq!(selection.method, PngMethod::Ultra);
        assert_eq!(selection.buffer.len(), 25_000);
    }

    #[test]
    fn test_flags_force_attempts_even_when_standard_wins() {
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(metadata.clone(), sized_script(1_000, Ok(5_000), Ok(5_000)));

        let selection =
            select_best_png(&codec, &context(&metadata, 50_000, 80, true, true)).unwrap();

        assert_eq!(codec.attempts().len(), 3);
        assert_eq!(selection.method, PngMethod::Standard);
        assert_eq!(selection.buffer.len(), 1_000);
    }

    #[test]
    fn test_selection_is_strictly_smaller_only() {
        // An equal-sized aggressive result must not displace standard.
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(metadata.clone(), sized_script(45_000, Ok(45_000), Ok(50_000)));

        let selection =
            select_best_png(&codec, &context(&metadata, 50_000, 80, false, false)).unwrap();

        assert_eq!(selection.method, PngMethod::Standard);
        assert_eq!(selection.buffer.len(), 45_000);
    }

    #[test]
    fn test_failed_optional_attempt_keeps_best() {
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(
            metadata.clone(),
            sized_script(
                45_000,
                Err(CompressionError::PngOptimization("boom".to_string())),
                Ok(20_000),
            ),
        );

        let selection =
            select_best_png(&codec, &context(&metadata, 50_000, 80, false, false)).unwrap();

        // Aggressive died quietly; ultra still ran and won.
        assert_eq!(codec.attempts().len(), 3);
        assert_eq!(selection.method, PngMethod::Ultra);
        assert_eq!(selection.buffer.len(), 20_000);
    }

    #[test]
    fn test_all_optional_attempts_failing_is_not_an_error() {
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(
            metadata.clone(),
            sized_script(
                45_000,
                Err(CompressionError::PngOptimization("boom".to_string())),
                Err(CompressionError::PngOptimization("boom".to_string())),
            ),
        );

        let selection =
            select_best_png(&codec, &context(&metadata, 50_000, 80, false, false)).unwrap();

        assert_eq!(selection.method, PngMethod::Standard);
        assert_eq!(selection.buffer.len(), 45_000);
    }

    #[test]
    fn test_standard_failure_propagates() {
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(metadata.clone(), |request| match classify(request) {
            AttemptKind::StandardPng => {
                Err(CompressionError::PngOptimization("broken".to_string()))
            }
            _ => Ok(buffer(1)),
        });

        let result = select_best_png(&codec, &context(&metadata, 50_000, 80, false, false));
        assert!(result.is_err());
    }

    #[test]
    fn test_growth_still_succeeds_with_best_buffer() {
        // Every attempt larger than the 1000-byte input: the selector must
        // hand back the smallest buffer anyway.
        let metadata = rgb_metadata();
        let codec = FakeCodec::new(metadata.clone(), sized_script(3_000, Ok(2_500), Ok(2_800)));

        let selection =
            select_best_png(&codec, &context(&metadata, 1_000, 80, false, false)).unwrap();

        assert_eq!(selection.method, PngMethod::Aggressive);
        assert_eq!(selection.buffer.len(), 2_500);
    }
}
