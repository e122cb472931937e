//! Host project preparation.
//!
//! Before any bench file loads, the project under test is compiled (unless
//! `--no-compile` was given) and its build output directory is resolved so
//! suite processes can find the project's binaries.

use crate::error::{BenchError, Result};
use anyhow::{bail, Context};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Paths of a prepared project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProject {
    /// Directory holding the manifest.
    pub root: PathBuf,
    /// Build output directory (e.g. `target/release`).
    pub target_dir: PathBuf,
}

/// Compiles the host project and loads its paths.
pub trait ProjectPreparer {
    fn ensure_loaded(&self, skip_compile: bool) -> Result<LoadedProject>;
}

impl<T: ProjectPreparer + ?Sized> ProjectPreparer for &T {
    fn ensure_loaded(&self, skip_compile: bool) -> Result<LoadedProject> {
        (**self).ensure_loaded(skip_compile)
    }
}

/// Cargo-backed [`ProjectPreparer`].
#[derive(Debug, Clone, Default)]
pub struct CargoProject {
    manifest_path: Option<PathBuf>,
    package: Option<String>,
    cargo_args: Vec<String>,
    dev: bool,
}

impl CargoProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this manifest instead of searching upwards from the working directory.
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Package to build (in a workspace).
    pub fn package(mut self, name: impl Into<String>) -> Self {
        self.package = Some(name.into());
        self
    }

    /// Additional arguments passed to `cargo build`.
    pub fn cargo_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cargo_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build in debug mode instead of release.
    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    fn profile(&self) -> &'static str {
        if self.dev {
            "debug"
        } else {
            "release"
        }
    }

    fn prepare(&self, skip_compile: bool) -> anyhow::Result<LoadedProject> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let manifest = find_manifest(self.manifest_path.as_deref(), &cwd)?;
        let root = manifest
            .parent()
            .context("Cargo.toml has no parent directory")?
            .to_path_buf();

        if skip_compile {
            tracing::debug!("skipping compilation of {}", root.display());
        } else {
            self.build(&manifest)?;
        }

        let target_root = std::env::var_os("CARGO_TARGET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("target"));

        Ok(LoadedProject {
            target_dir: target_root.join(self.profile()),
            root,
        })
    }

    fn build(&self, manifest: &Path) -> anyhow::Result<()> {
        let cargo = std::env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo"));
        let mut cmd = Command::new(cargo);
        cmd.arg("build");
        if !self.dev {
            cmd.arg("--release");
        }
        cmd.arg("--manifest-path").arg(manifest);
        if let Some(ref package) = self.package {
            cmd.arg("--package").arg(package);
        }
        cmd.args(&self.cargo_args);

        tracing::info!("building project in {} mode", self.profile());
        tracing::debug!("running {:?}", cmd);

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context("Failed to run cargo build")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "cargo build failed with exit code {:?}\n{}",
                output.status.code(),
                stderr.trim_end()
            );
        }

        Ok(())
    }
}

impl ProjectPreparer for CargoProject {
    fn ensure_loaded(&self, skip_compile: bool) -> Result<LoadedProject> {
        self.prepare(skip_compile)
            .map_err(BenchError::ProjectPreparation)
    }
}

/// Find the Cargo.toml, either the explicit one or by walking up from `start`.
pub fn find_manifest(explicit: Option<&Path>, start: &Path) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        bail!("Specified manifest path does not exist: {}", path.display());
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join("Cargo.toml");
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            bail!(
                "Could not find Cargo.toml in {} or any parent directory",
                start.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_find_manifest_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();
        let nested = dir.path().join("bench").join("sub");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_manifest(None, &nested).unwrap();
        assert_eq!(found, dir.path().join("Cargo.toml"));
    }

    #[test]
    fn should_prefer_explicit_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("Other.toml");
        std::fs::write(&manifest, "").unwrap();

        let found = find_manifest(Some(&manifest), Path::new("/")).unwrap();
        assert_eq!(found, manifest);
    }

    #[test]
    fn should_fail_when_explicit_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Cargo.toml");
        let err = find_manifest(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn should_resolve_paths_without_compiling() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("Cargo.toml");
        std::fs::write(&manifest, "[package]\n").unwrap();

        let project = CargoProject::new().manifest_path(&manifest).dev(true);
        let loaded = project.ensure_loaded(true).unwrap();
        assert_eq!(loaded.root, dir.path());
        assert!(loaded.target_dir.ends_with("debug"));
    }

    #[test]
    fn should_wrap_failures_as_preparation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let project = CargoProject::new().manifest_path(dir.path().join("missing.toml"));
        let err = project.ensure_loaded(true).unwrap_err();
        assert!(matches!(err, BenchError::ProjectPreparation(_)));
    }
}
