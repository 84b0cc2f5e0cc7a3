//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path nel mirror: ogni path sotto la root di
//! input viene mappato sullo stesso path relativo sotto la root di output.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps paths under the input root onto the output root
pub struct PathResolver;

impl PathResolver {
    /// Path of `path` relative to `input_root` (empty for the root itself)
    pub fn relative_path<'a>(input_root: &Path, path: &'a Path) -> Result<&'a Path> {
        path.strip_prefix(input_root).map_err(|_| {
            anyhow!(
                "{} is not inside input directory {}",
                path.display(),
                input_root.display()
            )
        })
    }

    /// Destination of `path` inside the mirror
    pub fn output_path(input_root: &Path, output_root: &Path, path: &Path) -> Result<PathBuf> {
        let relative = Self::relative_path(input_root, path)?;
        let result = if relative.as_os_str().is_empty() {
            output_root.to_path_buf()
        } else {
            output_root.join(relative)
        };
        debug!("Resolved output path: {} -> {}", path.display(), result.display());
        Ok(result)
    }

    /// Crea la directory se necessario (nessun errore se esiste già)
    pub async fn ensure_dir(path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| anyhow!("Failed to create directory {}: {}", path.display(), e))
    }
}
