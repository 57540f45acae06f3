use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("invalid configuration: '{field}' must be positive, got {value}")]
    InvalidConfiguration { field: &'static str, value: i64 },

    #[error("worker failure in {strategy} on group {group}: {reason}")]
    WorkerFailure {
        strategy: String,
        group: usize,
        reason: String,
    },

    #[error("resource exhaustion in {strategy} while starting {unit}: {source}")]
    ResourceExhaustion {
        strategy: String,
        unit: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to load config {path}: {message}")]
    Config { path: String, message: String },

    #[error("worker protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BenchError {
    pub fn invalid_configuration(field: &'static str, value: i64) -> Self {
        Self::InvalidConfiguration { field, value }
    }

    pub fn worker_failure(strategy: impl Into<String>, group: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            strategy: strategy.into(),
            group,
            reason: reason.into(),
        }
    }

    pub fn resource_exhaustion(strategy: impl Into<String>, unit: impl Into<String>, source: io::Error) -> Self {
        Self::ResourceExhaustion {
            strategy: strategy.into(),
            unit: unit.into(),
            source,
        }
    }

    /// Group index this error is attributed to, if any.
    pub fn group(&self) -> Option<usize> {
        match self {
            Self::WorkerFailure { group, .. } => Some(*group),
            _ => None,
        }
    }
}

impl From<bincode::Error> for BenchError {
    fn from(err: bincode::Error) -> Self {
        BenchError::Protocol(err.to_string())
    }
}
