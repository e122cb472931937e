//! Canonical run configuration.
//!
//! [`normalize`] folds the sparse, alias-laden raw flags into a complete
//! [`CanonicalConfig`]. The config is built once per invocation and handed
//! to the engine by value; nothing here is global.

use crate::cli::{RawOption, RawValue};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Output format the engine renders results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Pretty,
    Machine,
}

/// Memory statistics tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemStats {
    Disabled,
    Enabled,
    /// Process and system memory.
    IncludeSys,
}

impl From<bool> for MemStats {
    fn from(v: bool) -> Self {
        if v {
            MemStats::Enabled
        } else {
            MemStats::Disabled
        }
    }
}

impl Serialize for MemStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MemStats::Disabled => serializer.serialize_bool(false),
            MemStats::Enabled => serializer.serialize_bool(true),
            MemStats::IncludeSys => serializer.serialize_str("include_sys"),
        }
    }
}

/// A normalized configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Format(OutputFormat),
    MemStats(MemStats),
    Bool(bool),
    Float(f64),
    Str(String),
}

impl From<RawValue> for ConfigValue {
    fn from(v: RawValue) -> Self {
        match v {
            RawValue::Bool(b) => ConfigValue::Bool(b),
            RawValue::Float(f) => ConfigValue::Float(f),
            RawValue::Str(s) => ConfigValue::Str(s),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Format(OutputFormat::Pretty) => f.write_str("pretty"),
            ConfigValue::Format(OutputFormat::Machine) => f.write_str("machine"),
            ConfigValue::MemStats(MemStats::Disabled) => f.write_str("false"),
            ConfigValue::MemStats(MemStats::Enabled) => f.write_str("true"),
            ConfigValue::MemStats(MemStats::IncludeSys) => f.write_str("include_sys"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::Str(s) => f.write_str(s),
        }
    }
}

/// Ordered key/value configuration handed to the engine.
///
/// Keys are unique. Replacing a key keeps its original position.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalConfig {
    entries: Vec<(String, ConfigValue)>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            entries: vec![
                ("format".to_string(), ConfigValue::Format(OutputFormat::Pretty)),
                ("verbose".to_string(), ConfigValue::Bool(true)),
            ],
        }
    }
}

impl CanonicalConfig {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace `key`.
    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn format(&self) -> OutputFormat {
        match self.get("format") {
            Some(ConfigValue::Format(f)) => *f,
            _ => OutputFormat::Pretty,
        }
    }

    pub fn verbose(&self) -> bool {
        !matches!(self.get("verbose"), Some(ConfigValue::Bool(false)))
    }

    /// `None` when no memory flag was given at all.
    pub fn mem_stats(&self) -> Option<MemStats> {
        match self.get("mem_stats") {
            Some(ConfigValue::MemStats(m)) => Some(*m),
            Some(ConfigValue::Bool(b)) => Some((*b).into()),
            _ => None,
        }
    }

    /// Minimum per-benchmark duration in seconds.
    pub fn duration(&self) -> Option<f64> {
        match self.get("duration") {
            Some(ConfigValue::Float(d)) => Some(*d),
            _ => None,
        }
    }

    /// Snapshot directory. `Some("")` disables snapshots.
    pub fn output(&self) -> Option<&str> {
        match self.get("output") {
            Some(ConfigValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for CanonicalConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Fold raw options into the canonical config and the skip-compile flag.
///
/// Options are applied in order. A plain `mem_stats` only lands when no
/// memory tier is set yet; `sys_mem_stats = true` always wins.
pub fn normalize(options: &[RawOption]) -> (CanonicalConfig, bool) {
    let mut config = CanonicalConfig::default();
    let mut skip_compile = false;

    for RawOption { key, value } in options {
        match (key.as_str(), value) {
            ("no_pretty", RawValue::Bool(b)) => {
                let format = if *b {
                    OutputFormat::Machine
                } else {
                    OutputFormat::Pretty
                };
                config.set("format", ConfigValue::Format(format));
            }
            ("quiet", RawValue::Bool(b)) => {
                config.set("verbose", ConfigValue::Bool(!*b));
            }
            ("mem_stats", RawValue::Bool(b)) => {
                if !config.contains("mem_stats") {
                    config.set("mem_stats", ConfigValue::MemStats((*b).into()));
                }
            }
            ("sys_mem_stats", RawValue::Bool(b)) => {
                if *b {
                    config.set("mem_stats", ConfigValue::MemStats(MemStats::IncludeSys));
                }
            }
            ("no_compile", RawValue::Bool(b)) => {
                skip_compile = *b;
            }
            _ => config.set(key.clone(), value.clone().into()),
        }
    }

    (config, skip_compile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(key: &str, value: impl Into<RawValue>) -> RawOption {
        RawOption::new(key, value)
    }

    #[test]
    fn should_use_defaults_when_no_options() {
        let (config, skip) = normalize(&[]);
        assert_eq!(config.format(), OutputFormat::Pretty);
        assert!(config.verbose());
        assert!(!config.contains("mem_stats"));
        assert!(!skip);
    }

    #[test]
    fn should_switch_to_machine_format() {
        let (config, _) = normalize(&[opt("no_pretty", true)]);
        assert_eq!(config.format(), OutputFormat::Machine);

        let (config, _) = normalize(&[opt("no_pretty", false)]);
        assert_eq!(config.format(), OutputFormat::Pretty);
    }

    #[test]
    fn should_invert_quiet_into_verbose() {
        let (config, _) = normalize(&[opt("quiet", true)]);
        assert_eq!(config.get("verbose"), Some(&ConfigValue::Bool(false)));
        assert!(!config.verbose());
    }

    #[test]
    fn should_let_sys_mem_stats_override_mem_stats() {
        let (config, _) = normalize(&[opt("mem_stats", true), opt("sys_mem_stats", true)]);
        assert_eq!(config.mem_stats(), Some(MemStats::IncludeSys));
    }

    #[test]
    fn should_keep_sys_mem_stats_when_plain_flag_comes_later() {
        let (config, _) = normalize(&[opt("sys_mem_stats", true), opt("mem_stats", true)]);
        assert_eq!(config.mem_stats(), Some(MemStats::IncludeSys));
    }

    #[test]
    fn should_ignore_false_sys_mem_stats() {
        let (config, _) = normalize(&[opt("sys_mem_stats", false)]);
        assert!(!config.contains("mem_stats"));

        let (config, _) = normalize(&[opt("mem_stats", true), opt("sys_mem_stats", false)]);
        assert_eq!(config.mem_stats(), Some(MemStats::Enabled));
    }

    #[test]
    fn should_keep_first_plain_mem_stats() {
        let (config, _) = normalize(&[opt("mem_stats", false), opt("mem_stats", true)]);
        assert_eq!(config.mem_stats(), Some(MemStats::Disabled));
    }

    #[test]
    fn should_extract_no_compile() {
        let (config, skip) = normalize(&[opt("no_compile", true)]);
        assert!(skip);
        assert!(!config.contains("no_compile"));
    }

    #[test]
    fn should_pass_unknown_keys_through() {
        let (config, _) = normalize(&[
            opt("duration", 1.5),
            opt("output", "bench/snapshots"),
            opt("custom", "x"),
        ]);
        assert_eq!(config.duration(), Some(1.5));
        assert_eq!(config.output(), Some("bench/snapshots"));
        assert_eq!(config.get("custom"), Some(&ConfigValue::Str("x".into())));
        let keys: Vec<_> = config.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["format", "verbose", "duration", "output", "custom"]);
    }

    #[test]
    fn should_serialize_as_ordered_object() {
        let (config, _) = normalize(&[opt("no_pretty", true), opt("sys_mem_stats", true)]);
        assert_eq!(
            config.to_json().unwrap(),
            r#"{"format":"machine","verbose":true,"mem_stats":"include_sys"}"#
        );
    }
}
