//! # cntryl-bench
//!
//! Front end of a benchmark runner: turns `bench [options] [<path>...]` into
//! a canonical run configuration, prepares the host project, discovers
//! bench files and hands them to an execution engine.
//!
//! Every stage sits behind a trait so an engine can be embedded with its
//! own collaborators:
//!
//! - [`ProjectPreparer`]: compiles the project and resolves its paths
//! - [`SuiteLoader`]: turns a bench file into a typed [`Suite`]
//! - [`Engine`]: receives settings, suites and finally the config
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cntryl_bench::{CargoProject, ProcessEngine, ProcessLoader, Runner};
//!
//! let mut runner = Runner::new(CargoProject::new(), ProcessLoader::new(), ProcessEngine::new());
//! let _outcome = runner.run(["--quiet", "bench/disk_*"])?;
//! # Ok::<(), cntryl_bench::BenchError>(())
//! ```
//!
//! ## Options
//!
//! Flags are folded by [`normalize`]:
//!
//! - `--no-pretty` selects machine output, `--quiet` turns `verbose` off
//! - `--sys-mem-stats` always wins over `--mem-stats`
//! - `--no-compile` never reaches the config; it only skips compilation

mod cli;
mod config;
mod engine;
mod error;
mod loader;
mod locate;
mod project;
mod runner;
mod settings;

pub use cli::{parse, ParsedArgs, RawOption, RawOptions, RawValue};
pub use config::{normalize, CanonicalConfig, ConfigValue, MemStats, OutputFormat};
pub use engine::{passthrough_args, Engine, ProcessEngine, RunSummary, SuiteRun, CONFIG_ENV};
pub use error::{BenchError, Result};
pub use loader::{BenchFileLoader, ProcessLoader, Suite, SuiteLoader};
pub use locate::{BenchFileLocator, DEFAULT_PATTERN};
pub use project::{find_manifest, CargoProject, LoadedProject, ProjectPreparer};
pub use runner::{RunOutcome, Runner};
pub use settings::{EngineSettings, HELPER_PATH};
