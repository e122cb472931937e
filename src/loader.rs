//! Bench file loading.
//!
//! Each resolved file is loaded exactly once through a [`SuiteLoader`],
//! which hands back a typed [`Suite`]. The [`BenchFileLoader`] registers
//! every suite with the engine explicitly, in file order.

use crate::engine::Engine;
use crate::error::{BenchError, Result};
use crate::settings::{EngineSettings, HELPER_PATH};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Benchmarks declared by one bench file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    /// File stem of the bench file (e.g. "disk_bench").
    pub name: String,
    pub path: PathBuf,
    /// Benchmark names, in declaration order.
    pub benchmarks: Vec<String>,
}

impl Suite {
    pub fn new(path: impl Into<PathBuf>, benchmarks: Vec<String>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            benchmarks,
        }
    }
}

/// Turns a bench file into a [`Suite`].
pub trait SuiteLoader: Sync {
    fn load(&self, path: &Path) -> Result<Suite>;
}

impl<T: SuiteLoader + ?Sized> SuiteLoader for &T {
    fn load(&self, path: &Path) -> Result<Suite> {
        (**self).load(path)
    }
}

// ============================================================================
// Process Loader
// ============================================================================

/// Loads executable bench files by running them with `--list`.
///
/// The executable prints one benchmark name per line on stdout and exits
/// with status 0. Anything else is a load failure.
#[derive(Debug, Clone, Default)]
pub struct ProcessLoader;

impl ProcessLoader {
    pub fn new() -> Self {
        Self
    }
}

impl SuiteLoader for ProcessLoader {
    fn load(&self, path: &Path) -> Result<Suite> {
        tracing::debug!("listing benchmarks in {}", path.display());

        let output = Command::new(path)
            .arg("--list")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| BenchError::file_load(path, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match output.status.code() {
                Some(code) => format!("exited with code {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            return Err(BenchError::file_load(path, message));
        }

        let benchmarks = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Suite::new(path, benchmarks))
    }
}

// ============================================================================
// File Loader
// ============================================================================

/// Bootstraps the engine and loads resolved bench files into it.
#[derive(Debug, Clone)]
pub struct BenchFileLoader {
    root: PathBuf,
}

impl BenchFileLoader {
    /// `root` is the project root the helper path is resolved against.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn helper_path(&self) -> PathBuf {
        self.root.join(HELPER_PATH)
    }

    /// Load `files` into `engine` and return the number of suites registered.
    ///
    /// An empty list is a no-op: the engine is not even bootstrapped. A
    /// failing file aborts the remaining loads; suites registered before it
    /// stay registered.
    pub fn load(
        &self,
        files: &[PathBuf],
        loader: &dyn SuiteLoader,
        engine: &mut dyn Engine,
    ) -> Result<usize> {
        if files.is_empty() {
            return Ok(0);
        }

        let settings = self.settings()?;
        let jobs = settings.jobs;
        engine.bootstrap(settings)?;

        let mut registered = 0;
        for outcome in load_files(loader, files, jobs)? {
            engine.register(outcome?);
            registered += 1;
        }

        tracing::debug!("registered {} suite(s)", registered);
        Ok(registered)
    }

    fn settings(&self) -> Result<EngineSettings> {
        let helper = self.helper_path();
        let settings = if helper.is_file() {
            tracing::debug!("loading helper {}", helper.display());
            EngineSettings::from_file(&helper)
                .map_err(|e| BenchError::file_load(&helper, format!("{:#}", e)))?
        } else {
            EngineSettings::default()
        };
        Ok(settings.apply_env())
    }
}

/// Load `files` on a pool of `jobs` workers.
///
/// Outcomes come back in file order and stop at the first failure in that
/// order. Files after a known failure are skipped rather than loaded.
fn load_files(
    loader: &dyn SuiteLoader,
    files: &[PathBuf],
    jobs: usize,
) -> Result<Vec<Result<Suite>>> {
    if jobs <= 1 || files.len() == 1 {
        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            let outcome = loader.load(path);
            let failed = outcome.is_err();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }
        return Ok(outcomes);
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs.min(files.len()))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build loader pool: {}", e))?;

    let first_failure = AtomicUsize::new(usize::MAX);
    let outcomes: Vec<Option<Result<Suite>>> = pool.install(|| {
        files
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                if index > first_failure.load(Ordering::Acquire) {
                    return None;
                }
                let outcome = loader.load(path);
                if outcome.is_err() {
                    first_failure.fetch_min(index, Ordering::AcqRel);
                }
                Some(outcome)
            })
            .collect()
    });

    // Every file before the first failure was loaded, so skipped entries
    // only ever follow an error
    let mut ordered = Vec::with_capacity(outcomes.len());
    for outcome in outcomes.into_iter().flatten() {
        let failed = outcome.is_err();
        ordered.push(outcome);
        if failed {
            break;
        }
    }
    Ok(ordered)
}
