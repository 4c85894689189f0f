use crate::codec::Codec;
use crate::error::{CompressionError, Result};
use crate::formats::TargetFormat;
use crate::processing::{process_image, ProcessOptions, ProcessResult};
use crate::report::format_result_line;
use crate::utils::is_image_file;
use crate::{info, logger};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Include/exclude filters sourced from the config file. Empty include
/// list means "everything the extension allow-list accepts".
#[derive(Debug, Default)]
pub struct DiscoveryFilters {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl DiscoveryFilters {
    pub fn from_patterns(include: &[String], exclude: &[String]) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Pattern>> {
            patterns
                .iter()
                .map(|p| {
                    Pattern::new(p).map_err(|e| CompressionError::InvalidPattern {
                        pattern: p.clone(),
                        message: e.to_string(),
                    })
                })
                .collect()
        };
        Ok(DiscoveryFilters {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.exclude.iter().any(|p| p.matches_path(path)) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        self.include.iter().any(|p| p.matches_path(path))
    }
}

/// Collect image files from a directory tree, a single file, or a glob
/// pattern, in deterministic order.
pub fn collect_image_files(input: &str, filters: &DiscoveryFilters) -> Result<Vec<PathBuf>> {
    let input_path = Path::new(input);
    let mut image_files = Vec::new();

    if input_path.is_file() {
        if is_image_file(input_path) && filters.accepts(input_path) {
            image_files.push(input_path.to_path_buf());
        }
    } else if input_path.is_dir() {
        // The hidden-entry filter must not apply to the root the user
        // explicitly asked for.
        let walker = WalkDir::new(input_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_image_file(path) && filters.accepts(path) {
                image_files.push(path.to_path_buf());
            }
        }
    } else if let Ok(matches) = glob::glob(input) {
        for entry in matches.flatten() {
            if entry.is_file() && is_image_file(&entry) && filters.accepts(&entry) {
                image_files.push(entry);
            }
        }
        image_files.sort();
    } else {
        return Err(CompressionError::NoImageFilesFound(input.to_string()));
    }

    Ok(image_files)
}

/// Map an input file into the mirrored output tree, rewriting the
/// extension when a format override changes the container. A `None`
/// input root (glob input) flattens into the output directory.
pub fn generate_output_path(
    input_path: &Path,
    input_root: Option<&Path>,
    output_root: &Path,
    format: Option<TargetFormat>,
) -> Result<PathBuf> {
    let relative = match input_root {
        Some(root) => input_path.strip_prefix(root).unwrap_or(input_path),
        None => Path::new(
            input_path
                .file_name()
                .ok_or_else(|| CompressionError::UnsupportedFormat("invalid file name".to_string()))?,
        ),
    };

    let mut output = output_root.join(relative);
    if let Some(ext) = format.and_then(|f| f.extension()) {
        output.set_extension(ext);
    }
    Ok(output)
}

/// Process every discovered file against the output tree. Results come
/// back in input order; per-file failures are recorded, not raised.
pub fn run_batch(
    codec: &dyn Codec,
    input: &str,
    output_root: &Path,
    options: &ProcessOptions,
    filters: &DiscoveryFilters,
) -> Result<Vec<ProcessResult>> {
    let started = Instant::now();

    let image_files = collect_image_files(input, filters)?;
    if image_files.is_empty() {
        info!("⚠️  No image files found in the input path");
        return Ok(Vec::new());
    }

    info!("📊 Found {} image file(s) to process", image_files.len());

    fs::create_dir_all(output_root)
        .map_err(|_| CompressionError::DirectoryCreationFailed(output_root.to_path_buf()))?;

    let input_root = if Path::new(input).is_dir() {
        Some(PathBuf::from(input))
    } else if Path::new(input).is_file() {
        Path::new(input).parent().map(Path::to_path_buf)
    } else {
        None
    };

    let progress = if logger::is_quiet() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(image_files.len() as u64);
        pb.set_style(ProgressStyle::default_bar());
        pb
    };

    let results: Vec<ProcessResult> = image_files
        .par_iter()
        .map(|input_path| {
            let per_file = Instant::now();
            let result = match generate_output_path(
                input_path,
                input_root.as_deref(),
                output_root,
                options.format,
            ) {
                Ok(output_path) => process_image(codec, input_path, &output_path, options),
                Err(e) => ProcessResult::failure(
                    input_path,
                    output_root,
                    per_file.elapsed(),
                    e.to_string(),
                ),
            };
            if !logger::is_quiet() {
                progress.println(format_result_line(&result));
            }
            progress.inc(1);
            result
        })
        .collect();

    progress.finish_and_clear();
    info!("⏱️  Batch finished in {:.2?}", started.elapsed());

    Ok(results)
}
