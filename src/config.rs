//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del mirroring
//! - Fornisce validazione dei parametri di input prima di qualsiasi scrittura
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `input_dir`: Directory sorgente (default: `./public/images-pre/`)
//! - `output_dir`: Directory mirror (default: `./public/images/`)
//! - `jpeg_tool`: Ottimizzatore JPEG (default: `jpegoptim --strip-all`)
//! - `png_tool`: Ottimizzatore PNG (default: `optipng`)
//! - `failure_policy`: Cosa fare quando un tool fallisce (default: continue)
//! - `tool_timeout_secs`: Timeout per singola invocazione (default: nessuno)
//! - `verify`: Verifica output dopo ogni file (default: false)
//! - `dry_run`: Simulazione senza modifiche (default: false)
//! - `json_output`: Eventi JSON su stdout (default: false)
//!
//! ## Validazione:
//! - La directory di input deve esistere ed essere una directory
//! - Input e output non possono essere annidati l'una nell'altra
//! - I programmi dei tool non possono essere vuoti
//! - Il timeout, se presente, deve essere > 0
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     input_dir: PathBuf::from("assets/raw"),
//!     output_dir: PathBuf::from("assets/web"),
//!     verify: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::OptimizeError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_DIR: &str = "./public/images-pre/";
pub const DEFAULT_OUTPUT_DIR: &str = "./public/images/";

/// What to do when an external optimizer fails on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run on the first failure
    FailFast,
    /// Log the failure, keep the tool's output and move on
    #[default]
    Continue,
}

/// An external program plus the fixed arguments placed before the file path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `jpegoptim --strip-all <path>`
    pub fn jpegoptim() -> Self {
        Self::new("jpegoptim", crate::args!["--strip-all"])
    }

    /// `optipng <path>`
    pub fn optipng() -> Self {
        Self::new("optipng", Vec::new())
    }

    /// Short name used in logs and error messages
    pub fn name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }
}

/// Configuration for a mirror run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to mirror (read only)
    pub input_dir: PathBuf,
    /// Directory receiving the mirror, created on demand
    pub output_dir: PathBuf,
    /// Optimizer run on copied `.jpg`/`.jpeg` files
    pub jpeg_tool: ToolCommand,
    /// Optimizer run on copied `.png` files
    pub png_tool: ToolCommand,
    pub failure_policy: FailurePolicy,
    /// Kill an optimizer that runs longer than this (None = wait forever)
    pub tool_timeout_secs: Option<u64>,
    /// Check copies are byte identical and images still decode to the same pixels
    pub verify: bool,
    /// Dry run - log planned actions without touching the output
    pub dry_run: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            jpeg_tool: ToolCommand::jpegoptim(),
            png_tool: ToolCommand::optipng(),
            failure_policy: FailurePolicy::default(),
            tool_timeout_secs: None,
            verify: false,
            dry_run: false,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !self.input_dir.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Input directory does not exist: {}",
                self.input_dir.display()
            )));
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Output path is not a directory: {}",
                self.output_dir.display()
            )));
        }

        let input = self.input_dir.canonicalize()?;
        let output = resolve_existing_prefix(&self.output_dir)?;
        if output.starts_with(&input) {
            return Err(OptimizeError::Validation(format!(
                "Output directory {} must not be inside input directory {}",
                self.output_dir.display(),
                self.input_dir.display()
            )));
        }

        if input.starts_with(&output) {
            return Err(OptimizeError::Validation(format!(
                "Input directory {} must not be inside output directory {}",
                self.input_dir.display(),
                self.output_dir.display()
            )));
        }

        for tool in [&self.jpeg_tool, &self.png_tool] {
            if tool.program.trim().is_empty() {
                return Err(OptimizeError::Validation(
                    "Optimizer program name must not be empty".to_string(),
                ));
            }
        }

        if self.tool_timeout_secs == Some(0) {
            return Err(OptimizeError::Validation(
                "Tool timeout must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Default location of the config file (`<config dir>/image-mirror/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-mirror").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content).map_err(OptimizeError::from)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest,
/// so a not-yet-created output directory can still be compared with the input.
fn resolve_existing_prefix(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in missing.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(temp_dir: &TempDir) -> Config {
        let input_dir = temp_dir.path().join("images-pre");
        std::fs::create_dir_all(&input_dir).unwrap();
        Config {
            input_dir,
            output_dir: temp_dir.path().join("images"),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.input_dir, PathBuf::from("./public/images-pre/"));
        assert_eq!(config.output_dir, PathBuf::from("./public/images/"));
        assert_eq!(config.jpeg_tool.program, "jpegoptim");
        assert_eq!(config.jpeg_tool.args, vec!["--strip-all".to_string()]);
        assert_eq!(config.png_tool.program, "optipng");
        assert!(config.png_tool.args.is_empty());
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert!(config.tool_timeout_secs.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_config_validation() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_for(&temp_dir);
        assert!(config.validate().is_ok());

        config.tool_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.tool_timeout_secs = Some(10);
        config.png_tool.program = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_input_dir_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            input_dir: temp_dir.path().join("nope"),
            output_dir: temp_dir.path().join("out"),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OptimizeError::Validation(_))));
    }

    #[test]
    fn test_output_inside_input_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_for(&temp_dir);
        config.output_dir = config.input_dir.join("nested").join("out");
        assert!(config.validate().is_err());

        config.output_dir = config.input_dir.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_input_inside_output_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let site = temp_dir.path().join("site");
        let raw = site.join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(raw.join("notes.txt"), "ORIGINAL INPUT").unwrap();

        let config = Config {
            input_dir: raw.clone(),
            output_dir: site,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OptimizeError::Validation(msg)) if msg.contains("inside output")));
        assert_eq!(std::fs::read_to_string(raw.join("notes.txt")).unwrap(), "ORIGINAL INPUT");
    }

    #[test]
    fn test_output_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_for(&temp_dir);
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        config.output_dir = file;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tool_name() {
        assert_eq!(ToolCommand::jpegoptim().name(), "jpegoptim");
        assert_eq!(ToolCommand::new("/usr/local/bin/optipng", vec![]).name(), "optipng");
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            input_dir: PathBuf::from("raw"),
            output_dir: PathBuf::from("web"),
            failure_policy: FailurePolicy::FailFast,
            tool_timeout_secs: Some(30),
            verify: true,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.input_dir, PathBuf::from("raw"));
        assert_eq!(loaded_config.output_dir, PathBuf::from("web"));
        assert_eq!(loaded_config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(loaded_config.tool_timeout_secs, Some(30));
        assert!(loaded_config.verify);
        assert_eq!(loaded_config.jpeg_tool, ToolCommand::jpegoptim());
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "failure_policy": "fail_fast", "png_tool": { "program": "oxipng" } }"#).unwrap();

        let config = tokio_test::block_on(Config::from_file(&config_path)).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.png_tool.program, "oxipng");
        assert!(config.png_tool.args.is_empty());
        assert_eq!(config.jpeg_tool, ToolCommand::jpegoptim());
        assert_eq!(config.input_dir, PathBuf::from(DEFAULT_INPUT_DIR));
    }

    #[tokio::test]
    async fn test_missing_config_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();
        assert!(tokio_test::block_on(Config::from_file(&config_path)).is_err());
    }
}
