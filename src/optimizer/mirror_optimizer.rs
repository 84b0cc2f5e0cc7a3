//! # Directory Mirror Orchestrator
//!
//! Orchestratore principale: percorre la directory di input, ricrea la stessa
//! struttura nella directory di output, copia ogni file e lancia
//! l'ottimizzatore esterno sulle copie JPEG e PNG.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: `Config::validate` prima di qualsiasi scrittura
//! 2. **Discovery**: walk ricorsivo ordinato per nome (per log riproducibili)
//! 3. **Directory**: creazione idempotente di ogni directory nel mirror
//! 4. **File**: copia verbatim → ottimizzazione in-place → verifica opzionale
//! 5. **Report**: statistiche finali (testo o JSON)
//!
//! ## Gestione errori:
//! - Errori di filesystem e tool mancanti interrompono sempre la run
//! - Tool falliti, timeout e verifiche fallite seguono la `FailurePolicy`
//!
//! L'elaborazione è strettamente sequenziale: ogni file è copiato e
//! ottimizzato prima di passare al successivo.
//!
//! ## Esempio:
//! ```rust,ignore
//! let mirror = DirectoryMirror::new(config)?;
//! let stats = mirror.run().await?;
//! ```

use crate::{
    config::{Config, FailurePolicy},
    error::OptimizeError,
    file_manager::{FileKind, FileManager},
    image_processor::ImageProcessor,
    json_output::JsonMessage,
    optimizer::path_resolver::PathResolver,
    progress::{MirrorStats, ProgressManager},
    tool_resolver::ToolPathResolver,
    validation::Validator,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

/// What happened to a file after it was copied
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerOutcome {
    /// Not a JPEG or PNG
    NotApplicable,
    Optimized { tool: String, elapsed: Duration },
    /// Optimizer or verification failed and the run continued
    Failed(String),
    /// Dry run
    Planned,
}

/// Per-file result of a mirror run
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub relative_path: PathBuf,
    pub kind: FileKind,
    pub original_size: u64,
    pub final_size: u64,
    pub optimizer: OptimizerOutcome,
}

/// Mirrors an input tree into an output tree, optimizing images on the way
pub struct DirectoryMirror {
    config: Config,
    image_processor: ImageProcessor,
}

impl DirectoryMirror {
    /// Create a new mirror, resolving optimizers from `PATH`
    pub fn new(config: Config) -> Result<Self> {
        Self::with_resolver(config, &ToolPathResolver::new())
    }

    pub fn with_resolver(config: Config, resolver: &ToolPathResolver) -> Result<Self> {
        config.validate()?;
        let image_processor = ImageProcessor::with_resolver(&config, resolver);

        Ok(Self {
            config,
            image_processor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the mirror over the whole input tree
    pub async fn run(&self) -> Result<MirrorStats> {
        let start_time = Instant::now();
        self.log_configuration();

        let entries = self.collect_entries()?;
        let total_files = entries.iter().filter(|entry| !entry.file_type().is_dir()).count();
        info!("Found {} files to mirror", total_files);

        if self.config.json_output {
            JsonMessage::start(
                self.config.input_dir.clone(),
                self.config.output_dir.clone(),
                total_files,
                self.config.dry_run,
            )
            .emit();
        }

        let progress = if self.config.json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(total_files as u64)
        };
        let mut stats = MirrorStats::new();

        for entry in &entries {
            if entry.file_type().is_dir() {
                self.mirror_directory(entry.path(), &mut stats).await?;
                continue;
            }

            let outcome = match self.mirror_file(entry.path(), &mut stats).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Failed to mirror {}: {:#}", entry.path().display(), e);
                    progress.finish(&stats.format_summary());
                    return Err(e);
                }
            };

            self.report_file(&outcome, &progress);
        }

        let duration = start_time.elapsed();
        progress.finish(&stats.format_summary());
        self.print_final_stats(&stats, duration);

        Ok(stats)
    }

    /// Walk the input tree, keeping directories and regular files
    fn collect_entries(&self) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.config.input_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(OptimizeError::from)?;
            let file_type = entry.file_type();

            if file_type.is_dir() || file_type.is_file() {
                entries.push(entry);
            } else if file_type.is_symlink() && entry.path().is_file() {
                entries.push(entry);
            } else {
                warn!("Skipping {} (not a regular file or directory)", entry.path().display());
            }
        }

        Ok(entries)
    }

    async fn mirror_directory(&self, path: &Path, stats: &mut MirrorStats) -> Result<()> {
        let destination = PathResolver::output_path(&self.config.input_dir, &self.config.output_dir, path)?;
        if destination.is_dir() {
            debug!("Directory already exists: {}", destination.display());
            return Ok(());
        }

        if self.config.dry_run {
            info!("[dry-run] Would create directory {}", destination.display());
        } else {
            PathResolver::ensure_dir(&destination).await?;
            debug!("Created directory {}", destination.display());
        }
        stats.add_directory();
        Ok(())
    }

    /// Copy one file into the mirror and run its optimizer
    async fn mirror_file(&self, path: &Path, stats: &mut MirrorStats) -> Result<FileOutcome> {
        let relative_path = PathResolver::relative_path(&self.config.input_dir, path)?.to_path_buf();
        let destination = self.config.output_dir.join(&relative_path);
        let kind = FileManager::classify(path);
        let original_size = FileManager::file_size(path).await?;

        if self.config.dry_run {
            match self.image_processor.tool_for(kind) {
                Some(tool) => info!("[dry-run] Would copy {} and run {}", relative_path.display(), tool.name()),
                None => info!("[dry-run] Would copy {}", relative_path.display()),
            }
            stats.add_copied(original_size, original_size);
            return Ok(FileOutcome {
                relative_path,
                kind,
                original_size,
                final_size: original_size,
                optimizer: OptimizerOutcome::Planned,
            });
        }

        FileManager::copy_file(path, &destination).await?;
        debug!("Copied {} ({})", relative_path.display(), FileManager::format_size(original_size));

        let optimizer = match self.optimize_and_verify(kind, path, &destination).await {
            Ok(outcome) => {
                if matches!(outcome, OptimizerOutcome::Optimized { .. }) {
                    stats.add_optimized(kind);
                }
                outcome
            }
            Err(e) if Self::is_tolerated(&e, self.config.failure_policy) => {
                warn!("Continuing after failure on {}: {:#}", relative_path.display(), e);
                stats.add_failure();
                OptimizerOutcome::Failed(format!("{:#}", e))
            }
            Err(e) => return Err(e),
        };

        let final_size = FileManager::file_size(&destination).await?;
        stats.add_copied(original_size, final_size);

        Ok(FileOutcome {
            relative_path,
            kind,
            original_size,
            final_size,
            optimizer,
        })
    }

    async fn optimize_and_verify(&self, kind: FileKind, source: &Path, destination: &Path) -> Result<OptimizerOutcome> {
        let outcome = match self.image_processor.optimize(kind, destination).await? {
            Some(run) => {
                if !run.stderr.is_empty() {
                    debug!("{} stderr: {}", run.tool, run.stderr);
                }
                OptimizerOutcome::Optimized {
                    tool: run.tool,
                    elapsed: run.elapsed,
                }
            }
            None => OptimizerOutcome::NotApplicable,
        };

        if self.config.verify {
            if kind.is_image() {
                let (source, destination) = (source.to_path_buf(), destination.to_path_buf());
                tokio::task::spawn_blocking(move || Validator::verify_image(&source, &destination))
                    .await
                    .map_err(|e| OptimizeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
            } else {
                Validator::verify_copy(source, destination).await?;
            }
        }

        Ok(outcome)
    }

    /// Whether `policy` lets the run continue past `err`
    fn is_tolerated(err: &anyhow::Error, policy: FailurePolicy) -> bool {
        policy == FailurePolicy::Continue
            && err
                .downcast_ref::<OptimizeError>()
                .is_some_and(OptimizeError::is_optimizer_failure)
    }

    fn report_file(&self, outcome: &FileOutcome, progress: &ProgressManager) {
        let name = outcome.relative_path.display().to_string();

        if self.config.json_output {
            let error = match &outcome.optimizer {
                OptimizerOutcome::Failed(message) => Some(message.clone()),
                _ => None,
            };
            JsonMessage::file_complete(
                outcome.relative_path.clone(),
                outcome.kind,
                outcome.original_size,
                outcome.final_size,
                error,
            )
            .emit();
        }

        let message = match &outcome.optimizer {
            OptimizerOutcome::Optimized { tool, elapsed } => {
                debug!("{} optimized {} in {:?}", tool, name, elapsed);
                format!(
                    "{}: {:.1}% saved",
                    name,
                    FileManager::calculate_reduction(outcome.original_size, outcome.final_size)
                )
            }
            OptimizerOutcome::Failed(_) => format!("{}: failed", name),
            OptimizerOutcome::NotApplicable | OptimizerOutcome::Planned => name,
        };
        progress.update(&message);
    }

    fn log_configuration(&self) {
        info!(
            "Mirroring {} -> {}",
            self.config.input_dir.display(),
            self.config.output_dir.display()
        );
        info!(
            "JPEG optimizer: {} {}",
            self.config.jpeg_tool.program,
            self.config.jpeg_tool.args.join(" ")
        );
        info!(
            "PNG optimizer: {} {}",
            self.config.png_tool.program,
            self.config.png_tool.args.join(" ")
        );
        match self.config.failure_policy {
            FailurePolicy::FailFast => info!("Failure policy: stop on first optimizer failure"),
            FailurePolicy::Continue => info!("Failure policy: log optimizer failures and continue"),
        }
        if let Some(secs) = self.config.tool_timeout_secs {
            info!("Tool timeout: {}s", secs);
        }
        if self.config.verify {
            info!("Verification enabled");
        }
        if self.config.dry_run {
            info!("Dry run mode: No files will be modified");
        }
    }

    fn print_final_stats(&self, stats: &MirrorStats, duration: Duration) {
        if self.config.json_output {
            JsonMessage::complete(stats, duration.as_secs_f64()).emit();
            return;
        }

        info!("=== Mirror Complete ===");
        info!("Directories created: {}", stats.directories_created);
        info!("Files copied: {}", stats.files_copied);
        info!("JPEG files optimized: {}", stats.jpegs_optimized);
        info!("PNG files optimized: {}", stats.pngs_optimized);
        info!("Failures: {}", stats.failures);
        info!("Bytes saved: {}", FileManager::format_size(stats.bytes_saved()));
        info!("Average reduction: {:.2}%", stats.overall_reduction_percent());
        info!("Duration: {:.2}s", duration.as_secs_f64());
    }
}
