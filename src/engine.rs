//! The execution engine seam.
//!
//! The engine receives its settings once, collects suites as the loader
//! registers them, and is then started with the canonical configuration.
//! [`ProcessEngine`] runs each suite's executable; measuring and rendering
//! are left to that executable.

use crate::config::{CanonicalConfig, MemStats, OutputFormat};
use crate::error::Result;
use crate::loader::Suite;
use crate::project::LoadedProject;
use crate::settings::EngineSettings;
use anyhow::Context;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Environment variable carrying the JSON-encoded canonical config.
pub const CONFIG_ENV: &str = "BENCH_CONFIG";

pub trait Engine {
    /// Called once, before the first suite is registered.
    fn bootstrap(&mut self, settings: EngineSettings) -> Result<()>;

    fn register(&mut self, suite: Suite);

    /// Run every registered suite.
    fn run(&mut self, config: &CanonicalConfig, project: &LoadedProject) -> Result<RunSummary>;
}

/// Outcome of one suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRun {
    pub suite: String,
    pub success: bool,
    /// `None` when terminated by a signal.
    pub code: Option<i32>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub runs: Vec<SuiteRun>,
}

impl RunSummary {
    pub fn first_failure(&self) -> Option<&SuiteRun> {
        self.runs.iter().find(|r| !r.success)
    }

    pub fn failed_count(&self) -> usize {
        self.runs.iter().filter(|r| !r.success).count()
    }

    pub fn total_duration(&self) -> Duration {
        self.runs.iter().map(|r| r.duration).sum()
    }
}

// ============================================================================
// Process Engine
// ============================================================================

/// Runs each registered suite as a child process.
#[derive(Debug, Default)]
pub struct ProcessEngine {
    settings: EngineSettings,
    suites: Vec<Suite>,
}

impl ProcessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    fn run_suite(
        &self,
        suite: &Suite,
        config: &CanonicalConfig,
        config_json: &str,
        project: &LoadedProject,
    ) -> Result<SuiteRun> {
        if config.verbose() {
            eprintln!(
                "\n🏃 Running {} ({} benchmark(s))",
                suite.name,
                suite.benchmarks.len()
            );
        }

        let mut cmd = Command::new(&suite.path);
        cmd.args(passthrough_args(config, &self.settings, project))
            .current_dir(&project.root)
            .env(CONFIG_ENV, config_json)
            .envs(&self.settings.env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(path) = search_path(project) {
            cmd.env("PATH", path);
        }

        tracing::debug!("executing {:?}", cmd);

        let start = Instant::now();
        let status = cmd
            .status()
            .with_context(|| format!("Failed to execute {}", suite.path.display()))?;

        Ok(SuiteRun {
            suite: suite.name.clone(),
            success: status.success(),
            code: status.code(),
            duration: start.elapsed(),
        })
    }
}

impl Engine for ProcessEngine {
    fn bootstrap(&mut self, settings: EngineSettings) -> Result<()> {
        self.settings = settings;
        Ok(())
    }

    fn register(&mut self, suite: Suite) {
        self.suites.push(suite);
    }

    fn run(&mut self, config: &CanonicalConfig, project: &LoadedProject) -> Result<RunSummary> {
        let config_json = config
            .to_json()
            .context("Failed to encode run configuration")?;

        let mut summary = RunSummary::default();
        for suite in &self.suites {
            let run = self.run_suite(suite, config, &config_json, project)?;
            let failed = !run.success;
            summary.runs.push(run);

            if failed && self.settings.fail_fast {
                break;
            }
        }

        if config.verbose() {
            report_summary(&summary);
        }
        Ok(summary)
    }
}

/// Translate the canonical config into suite command-line flags.
pub fn passthrough_args(
    config: &CanonicalConfig,
    settings: &EngineSettings,
    project: &LoadedProject,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    if config.format() == OutputFormat::Machine {
        args.push("--machine".into());
    }
    if !config.verbose() {
        args.push("--quiet".into());
    }
    if let Some(d) = config.duration() {
        args.push("--duration".into());
        args.push(d.to_string().into());
    }
    match config.mem_stats() {
        Some(MemStats::Enabled) => args.push("--mem-stats".into()),
        Some(MemStats::IncludeSys) => args.push("--sys-mem-stats".into()),
        Some(MemStats::Disabled) | None => {}
    }

    // An explicit empty output disables snapshots, so it is passed as-is
    let output: PathBuf = match config.output() {
        Some(o) => PathBuf::from(o),
        None => project.root.join(&settings.snapshot_dir),
    };
    args.push("--output".into());
    args.push(output.into_os_string());

    args.extend(settings.args.iter().map(OsString::from));
    args
}

/// `PATH` with the project's build output directory in front.
fn search_path(project: &LoadedProject) -> Option<OsString> {
    let mut dirs = vec![project.target_dir.clone()];
    if let Some(existing) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(dirs).ok()
}

fn report_summary(summary: &RunSummary) {
    if summary.runs.is_empty() {
        return;
    }

    eprintln!("\nSummary:");
    for run in &summary.runs {
        let status = if run.success { "✓" } else { "✗" };
        let exit_info = run
            .code
            .map(|c| format!("exit {}", c))
            .unwrap_or_else(|| "signal".to_string());
        eprintln!(
            "  {} {} ({:.2}s, {})",
            status,
            run.suite,
            run.duration.as_secs_f64(),
            exit_info
        );
    }
    eprintln!("Total time: {:.2}s", summary.total_duration().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::RawOption;
    use crate::config::normalize;

    fn project() -> LoadedProject {
        LoadedProject {
            root: PathBuf::from("/work"),
            target_dir: PathBuf::from("/work/target/release"),
        }
    }

    fn args_for(options: &[RawOption], settings: &EngineSettings) -> Vec<String> {
        let (config, _) = normalize(options);
        passthrough_args(&config, settings, &project())
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn should_pass_only_snapshot_dir_for_defaults() {
        let args = args_for(&[], &EngineSettings::default());
        assert_eq!(args, ["--output", "/work/bench/snapshots"]);
    }

    #[test]
    fn should_translate_every_option() {
        let mut settings = EngineSettings::default();
        settings.args = vec!["--seed".to_string(), "1".to_string()];
        let args = args_for(
            &[
                RawOption::new("no_pretty", true),
                RawOption::new("quiet", true),
                RawOption::new("duration", 0.5),
                RawOption::new("sys_mem_stats", true),
                RawOption::new("output", "out"),
            ],
            &settings,
        );
        assert_eq!(
            args,
            [
                "--machine",
                "--quiet",
                "--duration",
                "0.5",
                "--sys-mem-stats",
                "--output",
                "out",
                "--seed",
                "1",
            ]
        );
    }

    #[test]
    fn should_keep_empty_output() {
        let args = args_for(&[RawOption::new("output", "")], &EngineSettings::default());
        assert_eq!(args, ["--output", ""]);
    }

    #[test]
    fn should_count_failures() {
        let run = |suite: &str, success: bool| SuiteRun {
            suite: suite.to_string(),
            success,
            code: Some(if success { 0 } else { 1 }),
            duration: Duration::from_millis(10),
        };
        let summary = RunSummary {
            runs: vec![run("a", true), run("b", false), run("c", false)],
        };
        assert_eq!(summary.failed_count(), 2);
        assert_eq!(summary.first_failure().map(|r| r.suite.as_str()), Some("b"));
        assert_eq!(summary.total_duration(), Duration::from_millis(30));
    }

    #[cfg(unix)]
    #[test]
    fn should_stop_after_first_failure_when_fail_fast() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut engine = ProcessEngine::new();
        engine.bootstrap(EngineSettings::default()).unwrap();
        for (name, code) in [("a_bench", 0), ("b_bench", 2), ("c_bench", 0)] {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\nexit {}\n", code)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            engine.register(Suite::new(path, vec![]));
        }

        let (config, _) = normalize(&[RawOption::new("quiet", true)]);
        let project = LoadedProject {
            root: dir.path().to_path_buf(),
            target_dir: dir.path().join("target/release"),
        };
        let summary = engine.run(&config, &project).unwrap();

        assert_eq!(summary.runs.len(), 2);
        assert_eq!(summary.first_failure().and_then(|r| r.code), Some(2));
    }
}
