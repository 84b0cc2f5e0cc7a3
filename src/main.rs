//! # Image Mirror Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Costruzione della configurazione (file JSON + override da CLI)
//! - Avvio del mirror e traduzione del risultato in exit code
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO, DEBUG con `--verbose`, o `RUST_LOG`)
//! 3. Carica la configurazione e applica gli override
//! 4. Crea `DirectoryMirror` e avvia il processo
//! 5. Exit code != 0 se la run fallisce o se un ottimizzatore ha fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-mirror ./public/images-pre ./public/images --verify --timeout 60
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use image_mirror_optimizer::{
    json_output::JsonMessage, tool_resolver::ToolPathResolver, Config, DirectoryMirror, FailurePolicy,
    ToolCommand,
};

#[derive(Parser)]
#[command(name = "image-mirror")]
#[command(about = "Mirror a directory tree and losslessly optimize its JPEG and PNG files")]
struct Args {
    /// Directory to mirror [default: ./public/images-pre/]
    input: Option<PathBuf>,

    /// Directory receiving the mirror [default: ./public/images/]
    output: Option<PathBuf>,

    /// JSON configuration file (defaults to the user config dir if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop at the first optimizer failure instead of logging it and continuing
    #[arg(long)]
    fail_fast: bool,

    /// JPEG optimizer program; a path to jpegoptim keeps `--strip-all`, other programs run as `<program> <path>`
    #[arg(long)]
    jpeg_tool: Option<String>,

    /// PNG optimizer program; other programs than optipng run as `<program> <path>`
    #[arg(long)]
    png_tool: Option<String>,

    /// Kill an optimizer running longer than this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Verify copies are identical and images still decode to the same pixels
    #[arg(long)]
    verify: bool,

    /// Dry run - log planned actions without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Emit line-delimited JSON events on stdout
    #[arg(long)]
    json: bool,

    /// Print optimizer availability and exit
    #[arg(long)]
    check_tools: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for JSON events
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args).await?;

    if args.check_tools {
        let report = ToolPathResolver::new()
            .tools_report(&[("JPEG", &config.jpeg_tool), ("PNG", &config.png_tool)]);
        print!("{}", report);
        return Ok(ExitCode::SUCCESS);
    }

    let json_output = config.json_output;
    match run(config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            // Reported here once; returning the error would print it again
            error!("{:#}", e);
            if json_output {
                JsonMessage::error(e.to_string(), Some(format!("{:#}", e))).emit();
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let mirror = DirectoryMirror::new(config)?;
    let stats = mirror.run().await?;

    if stats.failures > 0 {
        anyhow::bail!("{} file(s) failed optimization or verification", stats.failures);
    }

    info!("{}", stats.format_summary());
    Ok(())
}

/// Config file first, then CLI overrides
async fn load_config(args: &Args) -> Result<Config> {
    let mut config = match (&args.config, Config::default_path()) {
        (Some(path), _) => {
            if !path.exists() {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            Config::from_file(path).await?
        }
        (None, Some(path)) if path.exists() => {
            info!("Using config file {}", path.display());
            Config::from_file(&path).await?
        }
        _ => Config::default(),
    };

    if let Some(ref input) = args.input {
        config.input_dir = input.clone();
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    if args.fail_fast {
        config.failure_policy = FailurePolicy::FailFast;
    }
    if let Some(ref program) = args.jpeg_tool {
        config.jpeg_tool = override_tool(program, &config.jpeg_tool, ToolCommand::jpegoptim());
    }
    if let Some(ref program) = args.png_tool {
        config.png_tool = override_tool(program, &config.png_tool, ToolCommand::optipng());
    }
    if args.timeout.is_some() {
        config.tool_timeout_secs = args.timeout;
    }
    config.verify |= args.verify;
    config.dry_run |= args.dry_run;
    config.json_output |= args.json;

    Ok(config)
}

/// Swap the program of a tool, keeping arguments when the program is the same tool
fn override_tool(program: &str, current: &ToolCommand, default: ToolCommand) -> ToolCommand {
    let name = Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let args = match name {
        Some(name) if name == current.name() => current.args.clone(),
        Some(name) if name == default.name() => default.args,
        _ => Vec::new(),
    };
    ToolCommand::new(program, args)
}
