//! # Image Processing Module
//!
//! Questo modulo esegue gli ottimizzatori esterni sui file già copiati nel mirror.
//! Nessuna elaborazione in memoria: il file di destinazione viene riscritto
//! in-place dal tool.
//!
//! ## Tool utilizzati
//!
//! | Formato | Tool (default)          | Invocazione                       |
//! |---------|-------------------------|-----------------------------------|
//! | JPEG    | jpegoptim               | `jpegoptim --strip-all <path>`    |
//! | PNG     | optipng                 | `optipng <path>`                  |
//! | Altri   | -                       | nessuna                           |
//!
//! ## Error Handling
//!
//! - **Tool non disponibile**: `MissingDependency` (fatale)
//! - **Exit code != 0**: `ToolFailed` con stderr catturato
//! - **Timeout**: `ToolTimeout`, il processo figlio viene terminato
//!
//! La decisione se interrompere o continuare spetta all'orchestratore
//! (vedi `FailurePolicy`).

use crate::config::{Config, ToolCommand};
use crate::error::OptimizeError;
use crate::file_manager::FileKind;
use crate::tool_resolver::ToolPathResolver;
use crate::utils::to_string_vec;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Result of a successful optimizer invocation
#[derive(Debug)]
pub struct ToolRun {
    pub tool: String,
    pub status: ExitStatus,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Runs the configured external optimizers on single files.
pub struct ImageProcessor {
    jpeg_tool: ToolCommand,
    png_tool: ToolCommand,
    jpeg_path: Option<PathBuf>,
    png_path: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ImageProcessor {
    /// Create a processor resolving tools from the process `PATH`
    pub fn new(config: &Config) -> Self {
        Self::with_resolver(config, &ToolPathResolver::new())
    }

    pub fn with_resolver(config: &Config, resolver: &ToolPathResolver) -> Self {
        Self {
            jpeg_path: resolver.resolve_tool(&config.jpeg_tool.program),
            png_path: resolver.resolve_tool(&config.png_tool.program),
            jpeg_tool: config.jpeg_tool.clone(),
            png_tool: config.png_tool.clone(),
            timeout: config.tool_timeout_secs.map(Duration::from_secs),
        }
    }

    /// The optimizer configured for `kind`, if any
    pub fn tool_for(&self, kind: FileKind) -> Option<&ToolCommand> {
        match kind {
            FileKind::Jpeg => Some(&self.jpeg_tool),
            FileKind::Png => Some(&self.png_tool),
            FileKind::Other => None,
        }
    }

    /// Optimize `path` in place with the tool matching `kind`.
    ///
    /// Returns `Ok(None)` for files that have no optimizer.
    pub async fn optimize(&self, kind: FileKind, path: &Path) -> Result<Option<ToolRun>, OptimizeError> {
        let (tool, resolved) = match kind {
            FileKind::Jpeg => (&self.jpeg_tool, &self.jpeg_path),
            FileKind::Png => (&self.png_tool, &self.png_path),
            FileKind::Other => return Ok(None),
        };

        let Some(executable) = resolved else {
            return Err(OptimizeError::MissingDependency(
                ToolPathResolver::missing_tool_message(&tool.program),
            ));
        };

        // The path goes through as an OsStr so non-UTF-8 names reach the tool intact
        let args = to_string_vec(&tool.args);
        debug!("Running {} {:?} {}", executable.display(), args, path.display());

        self.run_tool(tool, executable, &args, path).await.map(Some)
    }

    async fn run_tool(
        &self,
        tool: &ToolCommand,
        executable: &Path,
        args: &[String],
        path: &Path,
    ) -> Result<ToolRun, OptimizeError> {
        let name = tool.name();
        let start_time = Instant::now();

        let child = Command::new(executable)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OptimizeError::MissingDependency(ToolPathResolver::missing_tool_message(&tool.program))
                }
                _ => OptimizeError::Io(e),
            })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("{} timed out after {:?} on {}", name, limit, path.display());
                    return Err(OptimizeError::ToolTimeout {
                        tool: name,
                        path: path.to_path_buf(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await?,
        };
        let elapsed = start_time.elapsed();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            debug!("{} completed successfully in {:?}", name, elapsed);
            Ok(ToolRun {
                tool: name,
                status: output.status,
                stderr,
                elapsed,
            })
        } else {
            warn!("{} failed after {:?} on {}", name, elapsed, path.display());
            Err(OptimizeError::ToolFailed {
                tool: name,
                path: path.to_path_buf(),
                status: output.status,
                stderr,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::args;
    use tempfile::TempDir;

    /// `sh -c <script> sh <path>`: the script sees the target file as `$1`
    fn shell_tool(script: &str) -> ToolCommand {
        ToolCommand::new("sh", args!["-c", script, "sh"])
    }

    fn processor(jpeg: ToolCommand, png: ToolCommand, timeout: Option<u64>) -> ImageProcessor {
        let config = Config {
            jpeg_tool: jpeg,
            png_tool: png,
            tool_timeout_secs: timeout,
            ..Default::default()
        };
        ImageProcessor::new(&config)
    }

    #[tokio::test]
    async fn test_tool_receives_path_last() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        std::fs::write(&file, b"jpeg").unwrap();

        let processor = processor(shell_tool("printf '+jpeg' >> \"$1\""), shell_tool("exit 9"), None);
        let run = processor.optimize(FileKind::Jpeg, &file).await.unwrap().unwrap();

        assert_eq!(run.tool, "sh");
        assert!(run.status.success());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "jpeg+jpeg");
    }

    #[tokio::test]
    async fn test_non_utf8_path_reaches_tool_unchanged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(OsStr::from_bytes(b"caf\xe9.png"));
        if std::fs::write(&file, b"png").is_err() {
            // Filesystem refuses non-UTF-8 names (e.g. some macOS volumes)
            return;
        }

        let processor = processor(shell_tool("true"), shell_tool("printf '[png]' >> \"$1\""), None);
        processor.optimize(FileKind::Png, &file).await.unwrap().unwrap();

        assert_eq!(std::fs::read(&file).unwrap(), b"png[png]");
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_other_files_have_no_tool() {
        let processor = processor(shell_tool("exit 1"), shell_tool("exit 1"), None);
        let result = processor.optimize(FileKind::Other, Path::new("readme.txt")).await.unwrap();
        assert!(result.is_none());
        assert!(processor.tool_for(FileKind::Other).is_none());
    }

    #[tokio::test]
    async fn test_non_zero_exit_captures_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("icon.png");
        std::fs::write(&file, b"png").unwrap();

        let processor = processor(shell_tool("true"), shell_tool("echo 'not a PNG file' >&2; exit 3"), None);
        let err = processor.optimize(FileKind::Png, &file).await.unwrap_err();

        match err {
            OptimizeError::ToolFailed { tool, path, status, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(path, file);
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "not a PNG file");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_tool_is_missing_dependency() {
        let processor = processor(
            ToolCommand::new("definitely-not-a-real-optimizer", vec![]),
            shell_tool("true"),
            None,
        );
        let err = processor.optimize(FileKind::Jpeg, Path::new("a.jpg")).await.unwrap_err();
        assert!(matches!(err, OptimizeError::MissingDependency(msg) if msg.contains("definitely-not-a-real-optimizer")));
    }

    #[tokio::test]
    async fn test_hung_tool_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("slow.png");
        std::fs::write(&file, b"png").unwrap();

        let processor = processor(shell_tool("true"), shell_tool("sleep 30"), Some(1));
        let started = Instant::now();
        let err = processor.optimize(FileKind::Png, &file).await.unwrap_err();

        assert!(matches!(err, OptimizeError::ToolTimeout { secs: 1, .. }));
        assert!(started.elapsed() < Duration::from_secs(20));
    }
}
