//! Engine settings read from the project's bench helper.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Helper file location, relative to the project root.
pub const HELPER_PATH: &str = "bench/bench_helper.toml";

/// Settings the engine is bootstrapped with.
///
/// Projects customize these in `bench/bench_helper.toml`:
///
/// ```toml
/// jobs = 4
/// fail_fast = false
/// args = ["--seed", "42"]
///
/// [env]
/// RUST_LOG = "warn"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Number of bench files loaded concurrently.
    pub jobs: usize,
    /// Stop at the first failing suite.
    pub fail_fast: bool,
    /// Extra environment for suite processes.
    pub env: BTreeMap<String, String>,
    /// Extra arguments appended to every suite invocation.
    pub args: Vec<String>,
    /// Default snapshot directory when `--output` is not given.
    pub snapshot_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: true,
            env: BTreeMap::new(),
            args: Vec::new(),
            snapshot_dir: PathBuf::from("bench/snapshots"),
        }
    }
}

impl EngineSettings {
    /// Parse a helper file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let mut settings: Self = toml::from_str(text).context("Invalid bench helper")?;
        settings.jobs = settings.jobs.max(1);
        Ok(settings)
    }

    /// Overlay environment variables.
    ///
    /// Supported variables:
    /// - `BENCH_JOBS`: concurrent file loads
    /// - `BENCH_FAIL_FAST`: stop at the first failing suite
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("BENCH_JOBS") {
            if let Ok(n) = v.parse::<usize>() {
                self.jobs = n.max(1);
            }
        }
        if let Some(v) = var("BENCH_FAIL_FAST") {
            self.fail_fast = v != "0" && !v.eq_ignore_ascii_case("false");
        }
        self
    }
}
