//! bench: discover and run benchmark suites.
//!
//! ## Expected Project Structure
//!
//! ```text
//! my-project/
//!   Cargo.toml
//!   src/lib.rs
//!   bench/
//!     bench_helper.toml   # optional engine settings
//!     disk_bench          # executable suite
//!     net/
//!       tcp_bench         # nested suites are found too
//!     snapshots/          # default snapshot directory
//! ```
//!
//! Each `*_bench` file must be executable, print its benchmark names (one per
//! line) when called with `--list`, and run them when called with the
//! translated options. The full configuration is also available as JSON in
//! `BENCH_CONFIG`.

use cntryl_bench::{BenchError, CargoProject, ProcessEngine, ProcessLoader, RunOutcome, Runner};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = std::env::var("BENCH_LOG").unwrap_or_else(|_| "cntryl_bench=warn".to_string());
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();

    let mut runner = Runner::new(CargoProject::new(), ProcessLoader::new(), ProcessEngine::new());

    match runner.run(std::env::args_os().skip(1)) {
        Ok(RunOutcome::NothingToRun) | Ok(RunOutcome::Completed(_)) => ExitCode::SUCCESS,
        Err(BenchError::Usage(err)) => err.exit(),
        Err(err) => {
            eprintln!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}
