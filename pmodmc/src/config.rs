//! Configuration of the control layer.
//!
//! Values come from, in increasing priority:
//! 1. the embedded default configuration (`pmodmc.yaml`),
//! 2. an optional `config.yaml` in the configuration directory,
//! 3. environment variables `PMODMC_CONFIG__SECTION__KEY=value`.
//!
//! ```no_run
//! use pmodmc::config::Settings;
//!
//! let settings = Settings::load(None)?;
//! println!("rendering channel: {}", settings.control.channel);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::info;

const DEFAULT_CONFIG: &str = include_str!("pmodmc.yaml");

const ENV_CONFIG_DIR: &str = "PMODMC_CONFIG";
const ENV_PREFIX: &str = "PMODMC_CONFIG__";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub control: ControlSettings,
    pub delivery: DeliverySettings,
    pub log: LogSettings,
}

/// Arguments common to every action.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ControlSettings {
    /// AVTransport / RenderingControl `InstanceID`.
    pub instance_id: u32,
    /// RenderingControl audio channel.
    pub channel: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            instance_id: 0,
            channel: "Master".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeliverySettings {
    /// Name of the thread spawned by [`LoopContext`](crate::delivery::LoopContext).
    pub thread_name: String,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            thread_name: "pmodmc-delivery".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads the configuration from `directory`.
    ///
    /// Without a directory, `$PMODMC_CONFIG` is tried, then `.pmodmc` in
    /// the current directory. A missing `config.yaml` is not an error.
    pub fn load(directory: Option<&Path>) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)
            .context("Embedded default configuration is invalid")?;

        if let Some(dir) = find_config_dir(directory) {
            let path = dir.join(CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(data) => {
                    info!(config_file = %path.display(), "Loaded config file");
                    let external: Value = serde_yaml::from_str(&data)
                        .with_context(|| format!("Invalid YAML in {}", path.display()))?;
                    merge_yaml(&mut value, &lower_keys_value(external));
                }
                Err(_) => {
                    info!(config_file = %path.display(), "Config file not found, using defaults");
                }
            }
        }

        apply_env_overrides(&mut value, env::vars());
        Self::from_value(value)
    }

    /// Parses a YAML document on top of the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let external: Value = serde_yaml::from_str(yaml)?;
        merge_yaml(&mut value, &lower_keys_value(external));
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self> {
        serde_yaml::from_value(value).context("Invalid pmodmc configuration")
    }
}

fn find_config_dir(directory: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = directory {
        return Some(dir.to_path_buf());
    }

    if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
        info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
        return Some(PathBuf::from(env_path));
    }

    let local = Path::new(".pmodmc");
    local.is_dir().then(|| local.to_path_buf())
}

/// Recursively merges `external` into `default`.
///
/// Mappings are merged key by key; scalars and sequences are replaced.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

fn apply_env_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(path) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = path.split("__").map(str::to_lowercase).collect();
        set_value(config, &path, convert_env_value(&value));
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn set_value(data: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *data = value;
        return;
    };
    if !matches!(data, Value::Mapping(_)) {
        *data = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = data {
        let entry = map
            .entry(Value::String(head.clone()))
            .or_insert(Value::Mapping(Mapping::new()));
        set_value(entry, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_embedded_yaml() {
        let settings = Settings::from_yaml_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_yaml_overrides_only_given_keys() {
        let settings = Settings::from_yaml_str("Control:\n  Channel: LF\n").unwrap();
        assert_eq!(settings.control.channel, "LF");
        assert_eq!(settings.control.instance_id, 0);
        assert_eq!(settings.delivery.thread_name, "pmodmc-delivery");
    }

    #[test]
    fn env_overrides_are_typed() {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        apply_env_overrides(
            &mut value,
            vec![
                ("PMODMC_CONFIG__CONTROL__INSTANCE_ID".to_string(), "2".to_string()),
                ("PMODMC_CONFIG__LOG__LEVEL".to_string(), "debug".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ],
        );
        let settings = Settings::from_value(value).unwrap();
        assert_eq!(settings.control.instance_id, 2);
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn load_reads_config_file_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "delivery:\n  thread_name: ui-loop\n",
        )
        .unwrap();

        let settings = Settings::load(Some(dir.path())).unwrap();
        assert_eq!(settings.delivery.thread_name, "ui-loop");
        assert_eq!(settings.control, ControlSettings::default());
    }

    #[test]
    fn load_without_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(dir.path())).unwrap();
        assert_eq!(settings.delivery, DeliverySettings::default());
    }

    #[test]
    fn load_rejects_broken_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "control: [unclosed").unwrap();
        assert!(Settings::load(Some(dir.path())).is_err());
    }

    #[test]
    fn invalid_types_are_reported() {
        assert!(Settings::from_yaml_str("control:\n  instance_id: many\n").is_err());
    }
}
