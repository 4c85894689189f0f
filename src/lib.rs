pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod formats;
pub mod logger;
pub mod processing;
pub mod report;
pub mod strategy;
pub mod utils;

pub use batch::{collect_image_files, generate_output_path, run_batch, DiscoveryFilters};
pub use codec::{Codec, EncodeParams, EncodeRequest, ImageMetadata, NativeCodec, PngParams};
pub use config::{load_config, merge_settings, write_sample_config, CliOverrides, ConfigFile};
pub use error::{CompressionError, Result};
pub use formats::{resolve_format, TargetFormat};
pub use processing::{
    process_image, validate_file_exists, Outcome, ProcessOptions, ProcessResult,
};
pub use report::{format_result_line, Summary};
pub use strategy::{select_best_png, PngContext, PngMethod, PngSelection};
