//! # Image Mirror Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `file_manager`: Classificazione, copia e hash dei file
//! - `tool_resolver`: Ricerca degli ottimizzatori esterni nel `PATH`
//! - `image_processor`: Esecuzione di jpegoptim / optipng
//! - `validation`: Verifica opzionale dell'output
//! - `optimizer`: Orchestratore del mirror
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use image_mirror_optimizer::{Config, DirectoryMirror};
//!
//! let mirror = DirectoryMirror::new(Config::default())?;
//! let stats = mirror.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod tool_resolver;
pub mod utils;
pub mod validation;

pub use config::{Config, FailurePolicy, ToolCommand};
pub use error::OptimizeError;
pub use file_manager::FileKind;
pub use optimizer::DirectoryMirror;
pub use progress::MirrorStats;
