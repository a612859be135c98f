//! Layered JSON configuration.
//!
//! A bot directory holds `default_config.json` (shipped with the bot) and an
//! optional `config.json` (local overrides). Each file maps section names to
//! objects: `*` applies to every task, other sections to the task of the same
//! name. The top-level `exclude` key is reserved metadata and never merged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BotError, Result};
use crate::retry::RetryConfig;

/// Merged key/value configuration for one task.
pub type ConfigMap = Map<String, Value>;

/// File name of the shipped defaults.
pub const DEFAULT_CONFIG_FILE: &str = "default_config.json";
/// File name of the local overrides.
pub const LOCAL_CONFIG_FILE: &str = "config.json";
/// Section applied to every task.
pub const WILDCARD_SECTION: &str = "*";
/// Reserved top-level key that is never merged.
pub const EXCLUDE_KEY: &str = "exclude";

fn read_layers(path: &Path) -> Result<ConfigMap> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(BotError::Config {
            path: path.to_path_buf(),
            msg: "top level is not an object".to_string(),
        }),
    }
}

fn merge_section(into: &mut ConfigMap, layers: &ConfigMap, section: &str, path: &Path) -> Result<()> {
    match layers.get(section) {
        None => Ok(()),
        Some(Value::Object(values)) => {
            for (key, value) in values {
                into.insert(key.clone(), value.clone());
            }
            Ok(())
        }
        Some(_) => Err(BotError::Config {
            path: path.to_path_buf(),
            msg: format!("section {:?} is not an object", section),
        }),
    }
}

/// Merge already-parsed default and local layers for `task`.
///
/// Order: default `*`, default `task`, local `*`, local `task`; later layers
/// overwrite earlier ones key by key.
pub fn merge_layers(
    task: &str,
    defaults: &ConfigMap,
    local: &ConfigMap,
    default_path: &Path,
    local_path: &Path,
) -> Result<ConfigMap> {
    if task == EXCLUDE_KEY {
        return Err(BotError::InvalidArgument {
            reason: format!("{:?} is a reserved config key, not a task", EXCLUDE_KEY),
        });
    }
    let mut config = ConfigMap::new();
    merge_section(&mut config, defaults, WILDCARD_SECTION, default_path)?;
    merge_section(&mut config, defaults, task, default_path)?;
    merge_section(&mut config, local, WILDCARD_SECTION, local_path)?;
    merge_section(&mut config, local, task, local_path)?;
    Ok(config)
}

/// Load and merge the configuration for `task` from `dir`.
///
/// A missing `default_config.json` is an error; a missing `config.json` is
/// treated as empty.
pub fn load_config(task: &str, dir: &Path) -> Result<ConfigMap> {
    let default_path = dir.join(DEFAULT_CONFIG_FILE);
    let local_path = dir.join(LOCAL_CONFIG_FILE);

    let defaults = read_layers(&default_path).map_err(|e| match e {
        BotError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => BotError::Config {
            path: default_path.clone(),
            msg: "default config not found".to_string(),
        },
        other => other,
    })?;
    let local = match read_layers(&local_path) {
        Ok(map) => map,
        Err(BotError::Io(io)) if io.kind() == std::io::ErrorKind::NotFound => ConfigMap::new(),
        Err(e) => return Err(e),
    };
    merge_layers(task, &defaults, &local, &default_path, &local_path)
}

/// Typed view of the settings the core itself understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Minimum seconds between writes.
    pub edit_delay_secs: f64,
    /// Attempts per write, including the first.
    pub max_attempts: u32,
    /// Runpage task name.
    pub runpage_task: Option<String>,
    /// Explicit runpage title.
    pub runpage_title: Option<String>,
    /// Database whose replica lag gates writes.
    pub replag_db: Option<String>,
    /// Replica cluster to probe.
    pub replag_cluster: String,
    /// Maximum tolerated replica lag in seconds.
    pub max_replag_secs: Option<f64>,
    /// Log file name, resolved with [`crate::logging::get_log_location`].
    pub log_file: PathBuf,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            edit_delay_secs: 10.0,
            max_attempts: 3,
            runpage_task: None,
            runpage_title: None,
            replag_db: None,
            replag_cluster: "web".to_string(),
            max_replag_secs: None,
            log_file: PathBuf::from("wikibot.log"),
            log_level: "info".to_string(),
        }
    }
}

impl BotSettings {
    /// Extract settings from a merged map. Unknown keys are ignored.
    pub fn from_map(map: &ConfigMap) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(map.clone()))?)
    }

    /// Delay between writes; negative or non-finite values mean no delay.
    pub fn edit_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.edit_delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Retry configuration for writes.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
        }
    }

    /// Replica lag ceiling, if configured.
    pub fn max_replag(&self) -> Option<Duration> {
        self.max_replag_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}
