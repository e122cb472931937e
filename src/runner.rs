//! The `bench` pipeline.
//!
//! parse → normalize → prepare project → locate files → load helper and
//! files → start the engine with the canonical config. A failure at any
//! stage stops the pipeline and is returned to the caller.

use crate::cli;
use crate::config::{normalize, CanonicalConfig};
use crate::engine::{Engine, RunSummary};
use crate::error::{BenchError, Result};
use crate::loader::{BenchFileLoader, SuiteLoader};
use crate::locate::BenchFileLocator;
use crate::project::ProjectPreparer;
use std::ffi::OsString;
use std::path::PathBuf;

/// How a successful invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No bench file matched; nothing was loaded or run.
    NothingToRun,
    Completed(RunSummary),
}

/// Wires the pipeline stages to their collaborators.
pub struct Runner<P, L, E> {
    preparer: P,
    loader: L,
    engine: E,
    pattern_base: Option<PathBuf>,
}

impl<P, L, E> Runner<P, L, E>
where
    P: ProjectPreparer,
    L: SuiteLoader,
    E: Engine,
{
    pub fn new(preparer: P, loader: L, engine: E) -> Self {
        Self {
            preparer,
            loader,
            engine,
            pattern_base: None,
        }
    }

    /// Resolve relative path arguments against `dir` instead of the
    /// current working directory.
    pub fn pattern_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pattern_base = Some(dir.into());
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run one invocation. `tokens` excludes the program name.
    pub fn run<I, T>(&mut self, tokens: I) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let parsed = cli::parse(tokens)?;
        let (config, skip_compile) = normalize(&parsed.options);
        tracing::debug!(?config, skip_compile, "normalized options");

        self.execute(&config, skip_compile, &parsed.patterns)
    }

    /// Run the stages after option normalization.
    pub fn execute(
        &mut self,
        config: &CanonicalConfig,
        skip_compile: bool,
        patterns: &[String],
    ) -> Result<RunOutcome> {
        let verbose = config.verbose();

        if verbose && !skip_compile {
            eprintln!("🔨 Compiling project...");
        }
        let project = self.preparer.ensure_loaded(skip_compile)?;

        let base = match &self.pattern_base {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let files = BenchFileLocator::new(&project.root)
            .pattern_base(base)
            .locate(patterns)?;
        if files.is_empty() {
            if verbose {
                eprintln!("⚠️  No bench files found under {}", project.root.display());
            }
            return Ok(RunOutcome::NothingToRun);
        }

        if verbose {
            eprintln!("🔍 Found {} bench file(s)", files.len());
        }

        BenchFileLoader::new(&project.root).load(&files, &self.loader, &mut self.engine)?;

        let summary = self.engine.run(config, &project)?;
        if let Some(failed) = summary.first_failure() {
            if verbose {
                eprintln!(
                    "\n❌ {} of {} suite(s) failed",
                    summary.failed_count(),
                    summary.runs.len()
                );
            }
            return Err(BenchError::SuiteFailed {
                suite: failed.suite.clone(),
                code: failed.code,
            });
        }

        if verbose {
            eprintln!("\n✅ All {} suite(s) passed", summary.runs.len());
        }
        Ok(RunOutcome::Completed(summary))
    }
}
