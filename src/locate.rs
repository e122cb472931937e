//! Bench file discovery.

use crate::error::{BenchError, Result};
use glob::{glob_with, MatchOptions};
use std::path::{Path, PathBuf};

/// Pattern used when no paths are given on the command line.
pub const DEFAULT_PATTERN: &str = "bench/**/*_bench";

/// Resolves path patterns into concrete bench files.
#[derive(Debug, Clone)]
pub struct BenchFileLocator {
    root: PathBuf,
    base: PathBuf,
}

impl BenchFileLocator {
    /// [`DEFAULT_PATTERN`] is resolved against the project `root`. So are
    /// relative user patterns, unless [`pattern_base`](Self::pattern_base)
    /// says otherwise.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            base: root.clone(),
            root,
        }
    }

    /// Directory relative user patterns are resolved against, usually the
    /// working directory the command was started from.
    pub fn pattern_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expand `patterns`, or [`DEFAULT_PATTERN`] when empty.
    ///
    /// Each pattern is expanded on its own and results are concatenated in
    /// pattern order without deduplication. A pattern that matches nothing
    /// contributes nothing. Wildcards never match hidden files or
    /// directories.
    pub fn locate(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        if patterns.is_empty() {
            return expand(&self.root, DEFAULT_PATTERN);
        }

        let mut files = Vec::new();
        for pattern in patterns {
            files.extend(expand(&self.base, pattern)?);
        }
        Ok(files)
    }
}

fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        // Escape the base so brackets in directory names stay literal
        let base = glob::Pattern::escape(&base.to_string_lossy());
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    };

    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let entries = glob_with(&full, options).map_err(|e| BenchError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.msg.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BenchError::Io(e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }

    tracing::debug!("pattern {} matched {} file(s)", pattern, files.len());
    Ok(files)
}
