//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico
//! (script di build, CI).
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del mirroring
//! - `file_complete`: Fine elaborazione di un file
//! - `complete`: Fine processo con statistiche finali
//! - `error`: Errore fatale

use crate::file_manager::{FileKind, FileManager};
use crate::progress::MirrorStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        dry_run: bool,
    },

    FileComplete {
        path: PathBuf,
        kind: FileKind,
        original_size: u64,
        final_size: u64,
        reduction_percent: f64,
        error: Option<String>,
    },

    Complete {
        directories_created: usize,
        files_copied: usize,
        jpegs_optimized: usize,
        pngs_optimized: usize,
        failures: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input_dir: PathBuf, output_dir: PathBuf, total_files: usize, dry_run: bool) -> Self {
        Self::Start {
            input_dir,
            output_dir,
            total_files,
            dry_run,
        }
    }

    pub fn file_complete(
        path: PathBuf,
        kind: FileKind,
        original_size: u64,
        final_size: u64,
        error: Option<String>,
    ) -> Self {
        Self::FileComplete {
            path,
            kind,
            original_size,
            final_size,
            reduction_percent: FileManager::calculate_reduction(original_size, final_size),
            error,
        }
    }

    pub fn complete(stats: &MirrorStats, duration_seconds: f64) -> Self {
        Self::Complete {
            directories_created: stats.directories_created,
            files_copied: stats.files_copied,
            jpegs_optimized: stats.jpegs_optimized,
            pngs_optimized: stats.pngs_optimized,
            failures: stats.failures,
            total_bytes_saved: stats.bytes_saved(),
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
