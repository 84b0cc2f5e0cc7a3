//! # Optimizer Module
//!
//! - `mirror_optimizer`: Orchestratore principale (walk → copia → ottimizza)
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod mirror_optimizer;
pub mod path_resolver;

pub use mirror_optimizer::{DirectoryMirror, FileOutcome, OptimizerOutcome};
pub use path_resolver::PathResolver;
