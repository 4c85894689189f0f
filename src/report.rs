//! Pure result formatting. Nothing in here touches the filesystem; the
//! caller decides where the text goes.

use crate::processing::{Outcome, ProcessResult};
use crate::strategy::PngMethod;
use crate::utils::format_file_size;
use std::time::Duration;

/// One console line for a single file result.
pub fn format_result_line(result: &ProcessResult) -> String {
    let name = result
        .input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.input_path.display().to_string());

    match &result.outcome {
        Outcome::Compressed { method } => {
            let sign = if result.reduction_percent >= 0 { "-" } else { "+" };
            let mut line = format!(
                "✅ {} {} → {} ({}{}%)",
                name,
                format_file_size(result.input_size),
                format_file_size(result.output_size),
                sign,
                result.reduction_percent.abs()
            );
            if let Some(method) = method {
                if *method != PngMethod::Standard {
                    line.push_str(&format!(" [{}]", method));
                }
            }
            if result.output_size > result.input_size {
                line.push_str(&format!(
                    "\n  ⚠️  file size increased by {} bytes",
                    result.output_size - result.input_size
                ));
            }
            line
        }
        Outcome::Skipped { reason } => format!("⏭️  {} ({})", name, reason),
        Outcome::Failed { error } => format!("❌ {} - {}", name, error),
    }
}

/// Aggregate over one batch. Byte totals cover non-skipped successful
/// results only; skipped files moved bytes but compressed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub compressed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    pub total_time: Duration,
}

impl Summary {
    pub fn from_results(results: &[ProcessResult]) -> Self {
        let mut summary = Summary {
            compressed: 0,
            skipped: 0,
            failed: 0,
            total_input_bytes: 0,
            total_output_bytes: 0,
            total_time: Duration::ZERO,
        };

        for result in results {
            summary.total_time += result.processing_time;
            match &result.outcome {
                Outcome::Compressed { .. } => {
                    summary.compressed += 1;
                    summary.total_input_bytes += result.input_size;
                    summary.total_output_bytes += result.output_size;
                }
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Overall percentage saved; zero when nothing was compressed.
    pub fn saved_percent(&self) -> f64 {
        if self.total_input_bytes == 0 {
            return 0.0;
        }
        (self.total_input_bytes as f64 - self.total_output_bytes as f64)
            / self.total_input_bytes as f64
            * 100.0
    }

    pub fn render(&self) -> String {
        let mut out = String::from("\n📊 Processing Summary\n============================\n");
        out.push_str(&format!("✅ Compressed: {}\n", self.compressed));
        if self.skipped > 0 {
            out.push_str(&format!("⏭️  Skipped: {}\n", self.skipped));
        }
        if self.failed > 0 {
            out.push_str(&format!("❌ Failed: {}\n", self.failed));
        }
        if self.compressed > 0 {
            let saved = self
                .total_input_bytes
                .saturating_sub(self.total_output_bytes);
            out.push_str(&format!(
                "📦 Original size: {}\n",
                format_file_size(self.total_input_bytes)
            ));
            out.push_str(&format!(
                "📦 Compressed size: {}\n",
                format_file_size(self.total_output_bytes)
            ));
            out.push_str(&format!(
                "🎯 Space saved: {} ({:.1}%)\n",
                format_file_size(saved),
                self.saved_percent()
            ));
        }
        out.push_str(&format!("⏱️  Total time: {:.2?}", self.total_time));
        out
    }
}
