//! Config-file discovery and option merging.
//!
//! A run looks for a recognized config file by walking ancestor
//! directories from the working directory, nearest file wins. A file
//! that exists but fails to parse is reported and the search continues
//! upward. Precedence when merging: CLI > config file > built-in
//! defaults.

use crate::constants::{CONFIG_FILENAMES, DEFAULT_MIN_SIZE, DEFAULT_QUALITY};
use crate::error::{CompressionError, Result};
use crate::formats::TargetFormat;
use crate::processing::ProcessOptions;
use crate::utils::parse_resize_option;
use crate::warn_msg;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    pub quality: Option<u8>,
    pub format: Option<String>,
    pub resize: Option<String>,
    pub aggressive_png: Option<bool>,
    pub ultra_png: Option<bool>,
    pub skip_small: Option<bool>,
    pub min_size: Option<u64>,
    pub output: Option<PathBuf>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

/// Raw values from the command line. `None`/`false` means the flag was
/// not given, so the config file (then the default) decides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub quality: Option<u8>,
    pub resize: Option<String>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub aggressive_png: bool,
    pub ultra_png: bool,
    pub no_skip_small: bool,
    pub min_size: Option<u64>,
}

/// Everything a batch run needs after merging.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub options: ProcessOptions,
    pub output: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Search ancestor directories for a recognized config file.
pub fn load_config(start_dir: &Path) -> Option<ConfigFile> {
    for dir in start_dir.ancestors() {
        for filename in CONFIG_FILENAMES {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                match parse_config_file(&candidate) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        warn_msg!("ignoring config file {:?}: {}", candidate, e);
                    }
                }
            }
        }
    }
    None
}

fn parse_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CompressionError::ConfigParse(path.to_path_buf(), e.to_string()))
}

/// Merge CLI values over config values over defaults. Validation errors
/// raised here are fatal to the whole run.
pub fn merge_settings(cli: &CliOverrides, config: Option<&ConfigFile>) -> Result<RunSettings> {
    let empty = ConfigFile::default();
    let config = config.unwrap_or(&empty);

    let quality = cli
        .quality
        .or(config.quality)
        .unwrap_or(DEFAULT_QUALITY);

    let resize = match cli.resize.as_ref().or(config.resize.as_ref()) {
        Some(spec) => Some(parse_resize_option(spec)?),
        None => None,
    };

    let format = match cli.format.as_ref().or(config.format.as_ref()) {
        Some(name) => Some(TargetFormat::from_str(name)?),
        None => None,
    };

    let skip_small = if cli.no_skip_small {
        false
    } else {
        config.skip_small.unwrap_or(true)
    };

    let options = ProcessOptions {
        quality,
        resize,
        format,
        skip_small,
        min_size: cli
            .min_size
            .or(config.min_size)
            .unwrap_or(DEFAULT_MIN_SIZE),
        aggressive_png: cli.aggressive_png || config.aggressive_png.unwrap_or(false),
        ultra_png: cli.ultra_png || config.ultra_png.unwrap_or(false),
    };
    options.validate()?;

    Ok(RunSettings {
        options,
        output: cli
            .output
            .clone()
            .or_else(|| config.output.clone())
            .unwrap_or_else(|| PathBuf::from("./output")),
        include: config.include.clone().unwrap_or_default(),
        exclude: config.exclude.clone().unwrap_or_default(),
    })
}

/// Write a commented starting-point config next to the user's project.
pub fn write_sample_config(path: &Path) -> Result<()> {
    let sample = ConfigFile {
        quality: Some(DEFAULT_QUALITY),
        format: Some("webp".to_string()),
        resize: None,
        aggressive_png: Some(false),
        ultra_png: Some(false),
        skip_small: Some(true),
        min_size: Some(DEFAULT_MIN_SIZE),
        output: Some(PathBuf::from("./compressed")),
        include: Some(vec![
            "**/*.jpg".to_string(),
            "**/*.jpeg".to_string(),
            "**/*.png".to_string(),
            "**/*.webp".to_string(),
        ]),
        exclude: Some(vec!["**/*.tmp".to_string(), "**/temp/**".to_string()]),
    };

    let content = serde_json::to_string_pretty(&sample)
        .map_err(|e| CompressionError::ConfigParse(path.to_path_buf(), e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}
