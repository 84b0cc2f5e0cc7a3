//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi con path e tool coinvolti
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io` / `Walk`: Errori di filesystem (sempre fatali)
//! - `MissingDependency`: Tool esterno mancante (jpegoptim, optipng) - fatale
//! - `ToolFailed` / `ToolTimeout`: Il tool è terminato male - gestito dalla `FailurePolicy`
//! - `Verification`: L'output non corrisponde all'input - gestito dalla `FailurePolicy`
//! - `Validation` / `Config`: Configurazione non valida
//!
//! ## Esempio:
//! ```rust,ignore
//! if resolver.resolve_tool("optipng").is_none() {
//!     return Err(OptimizeError::MissingDependency("optipng".to_string()));
//! }
//! ```

use std::path::PathBuf;
use std::process::ExitStatus;

/// Custom error types for mirroring and optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("{tool} failed on {} ({status}): {stderr}", .path.display())]
    ToolFailed {
        tool: String,
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} timed out after {secs}s on {}", .path.display())]
    ToolTimeout {
        tool: String,
        path: PathBuf,
        secs: u64,
    },

    #[error("Verification failed for {}: {reason}", .path.display())]
    Verification { path: PathBuf, reason: String },

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Configuration file error: {0}")]
    Config(#[from] serde_json::Error),
}

impl OptimizeError {
    /// Whether the failure policy decides what happens with this error.
    ///
    /// Everything else aborts the run.
    pub fn is_optimizer_failure(&self) -> bool {
        matches!(
            self,
            Self::ToolFailed { .. } | Self::ToolTimeout { .. } | Self::Verification { .. }
        )
    }
}
