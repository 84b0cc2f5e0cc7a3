//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui singoli file del mirror.
//!
//! ## Responsabilità:
//! - Classificazione file per estensione (JPEG, PNG, altro)
//! - Copia verbatim dei file verso il mirror
//! - Hash SHA-256 per la verifica delle copie
//! - Utilità per dimensioni e percentuali
//!
//! ## Classificazione:
//! - **JPEG**: `.jpg`, `.jpeg` (case-insensitive)
//! - **PNG**: `.png` (case-insensitive)
//! - **Altro**: tutto il resto, inclusi file senza estensione
//!
//! ## Esempio:
//! ```rust,ignore
//! match FileManager::classify(&path) {
//!     FileKind::Jpeg | FileKind::Png => { /* copia + ottimizza */ }
//!     FileKind::Other => { /* solo copia */ }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Category deciding which action a file gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Jpeg,
    Png,
    Other,
}

impl FileKind {
    pub fn is_image(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Manages file operations on the mirror
pub struct FileManager;

impl FileManager {
    /// Classify a file by its extension, case-insensitively
    pub fn classify(path: &Path) -> FileKind {
        let Some(ext) = path.extension() else {
            return FileKind::Other;
        };
        match ext.to_string_lossy().to_lowercase().as_str() {
            "jpg" | "jpeg" => FileKind::Jpeg,
            "png" => FileKind::Png,
            _ => FileKind::Other,
        }
    }

    /// Copy a file verbatim, overwriting the destination. Permission bits come along.
    pub async fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
        fs::copy(source, destination).await.with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                destination.display()
            )
        })
    }

    pub async fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path)
            .await
            .with_context(|| format!("Failed to read metadata of {}", path.display()))?;
        Ok(metadata.len())
    }

    /// Hex encoded SHA-256 of a file's contents
    pub async fn sha256(path: &Path) -> Result<String> {
        let mut file = fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];

        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Percentage reduction; negative when the file grew
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(FileManager::classify(Path::new("a/photo.JPG")), FileKind::Jpeg);
        assert_eq!(FileManager::classify(Path::new("photo.jpeg")), FileKind::Jpeg);
        assert_eq!(FileManager::classify(Path::new("photo.JpEg")), FileKind::Jpeg);
        assert_eq!(FileManager::classify(Path::new("a/b/icon.png")), FileKind::Png);
        assert_eq!(FileManager::classify(Path::new("ICON.PNG")), FileKind::Png);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(FileManager::classify(Path::new("readme.txt")), FileKind::Other);
        assert_eq!(FileManager::classify(Path::new("Makefile")), FileKind::Other);
        assert_eq!(FileManager::classify(Path::new("anim.webp")), FileKind::Other);
        assert_eq!(FileManager::classify(Path::new("photo.jpg.bak")), FileKind::Other);
        assert_eq!(FileManager::classify(Path::new(".png")), FileKind::Other);
    }

    #[tokio::test]
    async fn test_copy_overwrites_and_preserves_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.bin");
        let destination: PathBuf = temp_dir.path().join("dest.bin");
        std::fs::write(&source, [0u8, 1, 2, 255]).unwrap();
        std::fs::write(&destination, b"stale content that is longer").unwrap();

        let copied = FileManager::copy_file(&source, &destination).await.unwrap();
        assert_eq!(copied, 4);
        assert_eq!(std::fs::read(&destination).unwrap(), vec![0u8, 1, 2, 255]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("script.sh");
        let destination = temp_dir.path().join("copy.sh");
        std::fs::write(&source, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o755)).unwrap();

        FileManager::copy_file(&source, &destination).await.unwrap();
        let mode = std::fs::metadata(&destination).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileManager::copy_file(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("dest"),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sha256() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(
            FileManager::sha256(&path).await.unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(1536), "1.50 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(FileManager::calculate_reduction(0, 10), 0.0);
        assert_eq!(FileManager::calculate_reduction(200, 150), 25.0);
        assert_eq!(FileManager::calculate_reduction(100, 110), -10.0);
    }
}
