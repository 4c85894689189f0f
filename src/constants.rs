pub const DEFAULT_QUALITY: u8 = 80;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// File extensions accepted by discovery. Anything else is ignored, not an error.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tiff", "bmp"];

/// Escalation gates for the PNG strategy ladder, as percentages of the
/// original file size. Cost/benefit knobs, not correctness knobs.
pub const AGGRESSIVE_TRIGGER_PERCENT: u64 = 80;
pub const ULTRA_TRIGGER_PERCENT: u64 = 60;

/// Quality drops applied by the escalating PNG strategies.
pub const AGGRESSIVE_QUALITY_DROP: u8 = 30;
pub const AGGRESSIVE_QUALITY_FLOOR: u8 = 20;
pub const ULTRA_QUALITY_DROP: u8 = 60;
pub const ULTRA_QUALITY_FLOOR: u8 = 5;

/// Palette ceilings for the escalating strategies. The caps depend on the
/// decoded source having an alpha channel, not on the target format.
pub const AGGRESSIVE_ALPHA_MAX_COLORS: u32 = 256;
pub const ULTRA_ALPHA_MAX_COLORS: u32 = 64;
pub const ULTRA_OPAQUE_MAX_COLORS: u32 = 128;

/// WebP "try harder" adjustments, driven by the same aggressive flag.
pub const WEBP_QUALITY_DROP: u8 = 20;
pub const WEBP_QUALITY_FLOOR: u8 = 20;

/// JPEG switches to progressive scan above this source size.
pub const PROGRESSIVE_JPEG_THRESHOLD: u64 = 10_000;

pub const MAX_PNG_COMPRESSION_LEVEL: u8 = 9;

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;

/// Config files recognized by the ancestor search, nearest directory wins.
pub const CONFIG_FILENAMES: &[&str] = &[
    "img-press.config.json",
    ".img-press.json",
    ".img-pressrc",
];
