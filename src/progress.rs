//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del mirror.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Progress bar con `indicatif` (nascosta in modalità JSON)
//! - `MirrorStats`: Statistiche cumulative della run
//!
//! ## Statistiche tracciate:
//! - **directories_created**: Directory create nel mirror
//! - **files_copied**: File copiati (tutti i tipi)
//! - **jpegs_optimized** / **pngs_optimized**: Ottimizzazioni riuscite
//! - **failures**: Ottimizzazioni o verifiche fallite (policy continue)
//! - **total_original_size** / **total_output_size**: Byte prima e dopo
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 90/150 (60%) icon.png: 31.4% saved
//! ```

use crate::file_manager::{FileKind, FileManager};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages progress reporting for a mirror run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Statistics for one mirror run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorStats {
    pub directories_created: usize,
    pub files_copied: usize,
    pub jpegs_optimized: usize,
    pub pngs_optimized: usize,
    pub failures: usize,
    pub total_original_size: u64,
    pub total_output_size: u64,
}

impl MirrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directory(&mut self) {
        self.directories_created += 1;
    }

    pub fn add_copied(&mut self, original_size: u64, output_size: u64) {
        self.files_copied += 1;
        self.total_original_size += original_size;
        self.total_output_size += output_size;
    }

    pub fn add_optimized(&mut self, kind: FileKind) {
        match kind {
            FileKind::Jpeg => self.jpegs_optimized += 1,
            FileKind::Png => self.pngs_optimized += 1,
            FileKind::Other => {}
        }
    }

    pub fn add_failure(&mut self) {
        self.failures += 1;
    }

    pub fn bytes_saved(&self) -> u64 {
        self.total_original_size.saturating_sub(self.total_output_size)
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_size, self.total_output_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Copied: {} files | JPEG optimized: {} | PNG optimized: {} | Failures: {} | Total saved: {} ({:.2}%)",
            self.files_copied,
            self.jpegs_optimized,
            self.pngs_optimized,
            self.failures,
            FileManager::format_size(self.bytes_saved()),
            self.overall_reduction_percent()
        )
    }
}
