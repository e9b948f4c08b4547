//! Execution options for a verification session.
//!
//! Options are read from TOML; every field has a default so an empty file is
//! a valid configuration.

use std::path::Path;

use miette::Report;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type ConfigError = Report;

fn config_msg(message: impl Into<String>) -> ConfigError {
    Report::msg(message.into())
}

const MIB: usize = 1024 * 1024;

/// Whether and how earlier verification results are reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    #[default]
    Off,
    On,
    /// Reuse only results whose outcome was `Correct`.
    CorrectOnly,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Prune axioms and functions unreachable from each implementation
    #[serde(default = "default_prune")]
    pub prune: bool,

    #[serde(default)]
    pub cache_mode: CacheMode,

    /// Worker threads of the verification runtime
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Units allowed to hold a solver session at once; defaults to `max_threads`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_units: Option<usize>,

    /// Stack size of each worker thread, in bytes
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,

    /// Default per-implementation time limit in seconds; 0 means none
    #[serde(default)]
    pub time_limit: u64,

    #[serde(default)]
    pub trace: bool,

    #[serde(default)]
    pub trace_proof_obligations: bool,

    /// Implementation name patterns to check; `*` matches any run of characters
    #[serde(default)]
    pub check_only: Vec<String>,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_prune() -> bool {
    true
}

fn default_max_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_stack_size() -> usize {
    16 * MIB
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions {
            prune: default_prune(),
            cache_mode: CacheMode::default(),
            max_threads: default_max_threads(),
            max_concurrent_units: None,
            stack_size: default_stack_size(),
            time_limit: 0,
            trace: false,
            trace_proof_obligations: false,
            check_only: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

impl ExecutionOptions {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_msg(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let options: ExecutionOptions =
            toml::from_str(content).map_err(|e| config_msg(format!("Invalid TOML: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| config_msg(format!("Failed to serialize options: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 {
            return Err(config_msg("max_threads must be at least 1"));
        }
        if self.max_concurrent_units == Some(0) {
            return Err(config_msg("max_concurrent_units must be at least 1"));
        }
        if self.stack_size < MIB {
            return Err(config_msg(format!(
                "stack_size must be at least {} bytes, got {}",
                MIB, self.stack_size
            )));
        }
        Ok(())
    }

    pub fn max_concurrent_units(&self) -> usize {
        self.max_concurrent_units.unwrap_or(self.max_threads).max(1)
    }

    pub fn routine_filter(&self) -> Result<RoutineFilter, ConfigError> {
        RoutineFilter::new(&self.check_only)
    }
}

/// Compiled `check_only` patterns. An empty filter accepts every name.
#[derive(Clone, Debug, Default)]
pub struct RoutineFilter {
    patterns: Vec<Regex>,
}

impl RoutineFilter {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let body = p
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                Regex::new(&format!("^{body}$"))
                    .map_err(|e| config_msg(format!("Invalid routine pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(name))
    }
}
