//! Error types for the benchmark runner.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a `bench` invocation.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Unknown flag, or a known flag with a value of the wrong shape.
    #[error("{}", invalid_option_message(.flag, .value.as_deref()))]
    InvalidOption { flag: String, value: Option<String> },

    /// `--help` or `--version` was requested. Not a failure.
    #[error(transparent)]
    Usage(clap::Error),

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("project preparation failed: {0:#}")]
    ProjectPreparation(anyhow::Error),

    #[error("failed to load {}: {message}", .path.display())]
    FileLoad { path: PathBuf, message: String },

    #[error("suite '{suite}' failed ({})", exit_description(.code))]
    SuiteFailed { suite: String, code: Option<i32> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    pub(crate) fn file_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BenchError::FileLoad {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn invalid_option_message(flag: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("invalid option: {} {}", flag, v),
        None => format!("invalid option: {}", flag),
    }
}

fn exit_description(code: &Option<i32>) -> String {
    code.map(|c| format!("exit {}", c))
        .unwrap_or_else(|| "signal".to_string())
}
