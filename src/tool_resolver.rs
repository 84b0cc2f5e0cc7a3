//! # Tool Path Resolver
//!
//! Finds the external optimizer executables. A program given with a path
//! separator is used as-is; a bare name is looked up in `PATH`.

use crate::config::ToolCommand;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tool path resolver over a fixed search path
pub struct ToolPathResolver {
    search_path: Vec<PathBuf>,
}

impl ToolPathResolver {
    /// Resolver over the current process `PATH`
    pub fn new() -> Self {
        let search_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self { search_path }
    }

    /// Resolver over an explicit list of directories
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, program: &str) -> Option<PathBuf> {
        debug!("Resolving tool: {}", program);

        let as_path = Path::new(program);
        if as_path.components().count() > 1 {
            if as_path.is_file() {
                return Some(as_path.to_path_buf());
            }
            warn!("Tool not found at explicit path: {}", as_path.display());
            return None;
        }

        let found = self.find_in_search_path(program);
        match &found {
            Some(path) => debug!("Using system tool: {} -> {:?}", program, path),
            None => warn!("Tool not found: {}", program),
        }
        found
    }

    fn find_in_search_path(&self, program: &str) -> Option<PathBuf> {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        let file_name = if program.ends_with(extension) {
            program.to_string()
        } else {
            format!("{}{}", program, extension)
        };

        self.search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    pub fn is_tool_available(&self, program: &str) -> bool {
        self.resolve_tool(program).is_some()
    }

    /// Get installation instructions for a tool
    pub fn install_hint(program: &str) -> String {
        let name = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.to_string());

        match name.as_str() {
            "jpegoptim" => "sudo apt-get install jpegoptim  # macOS: brew install jpegoptim".to_string(),
            "optipng" => "sudo apt-get install optipng  # macOS: brew install optipng".to_string(),
            _ => format!("install '{}' and make sure it is on PATH", name),
        }
    }

    /// Error text for a missing tool, including installation instructions
    pub fn missing_tool_message(program: &str) -> String {
        format!(
            "Tool '{}' not found in system PATH.\nTo install, run:\n  {}",
            program,
            Self::install_hint(program)
        )
    }

    /// Get a report of tool availability
    pub fn tools_report(&self, tools: &[(&str, &ToolCommand)]) -> String {
        let mut report = String::from("Optimizer availability:\n");

        for (category, tool) in tools {
            match self.resolve_tool(&tool.program) {
                Some(path) => {
                    report.push_str(&format!("  ✅ {} ({}) -> {}\n", category, tool.name(), path.display()));
                }
                None => {
                    report.push_str(&format!(
                        "  ❌ {} ({}) not found (install with: {})\n",
                        category,
                        tool.name(),
                        Self::install_hint(&tool.program)
                    ));
                }
            }
        }

        report
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}
