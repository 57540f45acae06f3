use crate::error::BenchError;
use crate::strategy::StrategyKind;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_DATASET_SIZE: i64 = 1_000_000;

/// Configuration as written in a TOML file or on the command line.
///
/// Sizes are signed so that negative input reaches [`RawConfig::validate`]
/// instead of failing to parse. `None` means "scale to this machine".
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub dataset_size: i64,
    pub group_size: Option<i64>,
    pub process_workers: Option<i64>,
    pub thread_workers: Option<i64>,
    pub library_workers: Option<i64>,
    pub strict_thread_per_group: bool,
    pub strategies: Option<Vec<StrategyKind>>,
    pub log_measurements: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            dataset_size: DEFAULT_DATASET_SIZE,
            group_size: None,
            process_workers: None,
            thread_workers: None,
            library_workers: None,
            strict_thread_per_group: false,
            strategies: None,
            log_measurements: false,
        }
    }
}

impl RawConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, BenchError> {
        toml::from_str(content).map_err(|err| BenchError::Config {
            path: "<inline>".to_string(),
            message: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = fs::read_to_string(path).map_err(|err| BenchError::Config {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

        toml::from_str(&content).map_err(|err| BenchError::Config {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    /// Resolves defaults against `cpus` and rejects non-positive sizes.
    pub fn validate(&self, cpus: usize) -> Result<BenchConfig, BenchError> {
        let cpus = cpus.max(1) as i64;

        Ok(BenchConfig {
            dataset_size: non_negative("dataset_size", self.dataset_size)?,
            group_size: positive("group_size", self.group_size.unwrap_or(cpus * 10))?,
            process_workers: positive("process_workers", self.process_workers.unwrap_or(cpus))?,
            thread_workers: positive("thread_workers", self.thread_workers.unwrap_or(cpus * 10))?,
            library_workers: positive("library_workers", self.library_workers.unwrap_or(cpus))?,
            strict_thread_per_group: self.strict_thread_per_group,
            strategies: self.strategies.clone().unwrap_or_else(|| StrategyKind::ALL.to_vec()),
            log_measurements: self.log_measurements,
        })
    }
}

fn positive(field: &'static str, value: i64) -> Result<usize, BenchError> {
    if value <= 0 {
        return Err(BenchError::invalid_configuration(field, value));
    }
    usize::try_from(value).map_err(|_| BenchError::invalid_configuration(field, value))
}

fn non_negative(field: &'static str, value: i64) -> Result<usize, BenchError> {
    usize::try_from(value).map_err(|_| BenchError::invalid_configuration(field, value))
}

/// Validated, immutable settings for one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub dataset_size: usize,
    pub group_size: usize,
    pub process_workers: usize,
    pub thread_workers: usize,
    pub library_workers: usize,
    pub strict_thread_per_group: bool,
    /// Strategies to run; the driver always runs them in its own fixed order.
    pub strategies: Vec<StrategyKind>,
    pub log_measurements: bool,
}
