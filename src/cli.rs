//! Command-line parsing for `bench`.
//!
//! Turns raw tokens into typed [`RawOption`]s, in the order they appeared,
//! plus the positional path patterns. Unknown flags and malformed values are
//! rejected here, before anything touches the project.

use crate::error::{BenchError, Result};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "bench",
    version,
    about = "Discover and run benchmark suites",
    long_about = "
bench compiles the current project, discovers benchmark files and hands
them to the execution engine.

Without PATH arguments every file matching bench/**/*_bench is loaded.

Example:
    bench                           # Run every suite under bench/
    bench bench/disk_*              # Only the disk suites
    bench --no-pretty -o out/       # Machine output, snapshots to out/
    bench -C --sys-mem-stats        # Skip compilation, sample system memory
",
    args_override_self = true
)]
struct BenchArgs {
    /// Machine-readable output instead of pretty tables
    #[arg(long, short = 'n')]
    no_pretty: bool,

    /// Suppress progress reporting
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Minimum duration of each benchmark, in seconds
    #[arg(long, short = 'd', value_name = "SECONDS", value_parser = parse_seconds)]
    duration: Option<f64>,

    /// Gather memory statistics
    #[arg(long, short = 'm')]
    mem_stats: bool,

    /// Gather system memory statistics (implies --mem-stats)
    #[arg(long, short = 'M')]
    sys_mem_stats: bool,

    /// Snapshot directory (an empty string disables snapshots)
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<String>,

    /// Skip compiling the project
    #[arg(long, short = 'C')]
    no_compile: bool,

    /// Glob patterns selecting benchmark files
    #[arg(value_name = "PATH")]
    paths: Vec<String>,
}

// ============================================================================
// Raw Options
// ============================================================================

/// A parsed flag value, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Float(f64),
    Str(String),
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Str(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Str(v)
    }
}

/// One flag as given on the command line, keyed by its snake_case name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOption {
    pub key: String,
    pub value: RawValue,
}

impl RawOption {
    pub fn new(key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Raw options in command-line order.
pub type RawOptions = Vec<RawOption>;

/// Result of [`parse`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub options: RawOptions,
    /// Positional path patterns, in the order given.
    pub patterns: Vec<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse `tokens` (without the program name).
pub fn parse<I, T>(tokens: I) -> Result<ParsedArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv = std::iter::once(OsString::from("bench")).chain(tokens.into_iter().map(Into::into));

    let matches = BenchArgs::command()
        .try_get_matches_from(argv)
        .map_err(invalid_option)?;
    let args = BenchArgs::from_arg_matches(&matches).map_err(invalid_option)?;

    let mut indexed: Vec<(usize, RawOption)> = Vec::new();
    let mut push = |id: &str, value: RawValue| {
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            return;
        }
        if let Some(index) = matches.index_of(id) {
            indexed.push((index, RawOption::new(id, value)));
        }
    };

    push("no_pretty", args.no_pretty.into());
    push("quiet", args.quiet.into());
    if let Some(d) = args.duration {
        push("duration", d.into());
    }
    push("mem_stats", args.mem_stats.into());
    push("sys_mem_stats", args.sys_mem_stats.into());
    if let Some(ref o) = args.output {
        push("output", o.as_str().into());
    }
    push("no_compile", args.no_compile.into());

    indexed.sort_by_key(|(index, _)| *index);

    Ok(ParsedArgs {
        options: indexed.into_iter().map(|(_, opt)| opt).collect(),
        patterns: args.paths,
    })
}

fn parse_seconds(s: &str) -> std::result::Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err("expected a finite, non-negative number of seconds".to_string());
    }
    Ok(secs)
}

fn invalid_option(err: clap::Error) -> BenchError {
    if matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) {
        return BenchError::Usage(err);
    }

    // clap renders the offending arg as "--duration <SECONDS>"; keep the flag
    let flag = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg
            .split_whitespace()
            .next()
            .unwrap_or(arg.as_str())
            .to_string(),
        _ => err.kind().as_str().unwrap_or("unknown option").to_string(),
    };
    let value = match err.get(ContextKind::InvalidValue) {
        Some(ContextValue::String(v)) if !v.is_empty() => Some(v.clone()),
        _ => None,
    };

    BenchError::InvalidOption { flag, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_empty_args_when_no_tokens() {
        let parsed = parse(Vec::<String>::new()).unwrap();
        assert!(parsed.options.is_empty());
        assert!(parsed.patterns.is_empty());
    }

    #[test]
    fn should_keep_command_line_order() {
        let parsed = parse(["--sys-mem-stats", "-q", "--mem-stats"]).unwrap();
        let keys: Vec<_> = parsed.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["sys_mem_stats", "quiet", "mem_stats"]);
    }

    #[test]
    fn should_parse_typed_values() {
        let parsed = parse(["-d", "2.5", "--output", "snap"]).unwrap();
        assert_eq!(
            parsed.options,
            vec![
                RawOption::new("duration", 2.5),
                RawOption::new("output", "snap"),
            ]
        );
    }

    #[test]
    fn should_accept_every_short_alias() {
        let parsed = parse(["-n", "-q", "-m", "-M", "-C", "-d", "1", "-o", "x"]).unwrap();
        assert_eq!(parsed.options.len(), 7);
    }

    #[test]
    fn should_collect_positionals_in_order() {
        let parsed = parse(["bench/b_*", "-q", "bench/a_bench"]).unwrap();
        assert_eq!(parsed.patterns, ["bench/b_*", "bench/a_bench"]);
        assert_eq!(parsed.options, vec![RawOption::new("quiet", true)]);
    }

    #[test]
    fn should_reject_unknown_flag() {
        let err = parse(["--bogus"]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidOption { .. }));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn should_reject_malformed_duration() {
        let err = parse(["--duration", "abc"]).unwrap_err();
        match err {
            BenchError::InvalidOption { ref flag, ref value } => {
                assert!(flag.contains("duration"));
                assert_eq!(value.as_deref(), Some("abc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn should_reject_duration_without_value() {
        let err = parse(["--duration"]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidOption { value: None, .. }));
        let message = err.to_string();
        assert!(message.contains("duration"));
        assert!(!message.ends_with(' '));
    }

    #[test]
    fn should_reject_non_finite_or_negative_duration() {
        for token in ["--duration=NaN", "--duration=inf", "--duration=-1"] {
            let err = parse([token]).unwrap_err();
            match err {
                BenchError::InvalidOption { ref flag, .. } => assert!(flag.contains("duration")),
                other => panic!("{token}: unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn should_surface_help_as_usage() {
        let err = parse(["--help"]).unwrap_err();
        assert!(matches!(err, BenchError::Usage(_)));
    }

    #[test]
    fn should_allow_repeated_flags() {
        let parsed = parse(["-q", "-q"]).unwrap();
        assert_eq!(parsed.options, vec![RawOption::new("quiet", true)]);
    }
}
