// src/config/loader.rs
//! Layered configuration loader with hot reload
//!
//! Precedence, lowest first: built-in defaults, system file, user file, local
//! files, then `TENS_<SECTION>_<KEY>` environment variables.

use crate::config::{constants::paths, EngineConfig};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("File watcher error: {0}")]
    WatcherError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Configuration loader with hot reload capabilities
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    current_config: Arc<RwLock<EngineConfig>>,
    change_notifier: Option<Sender<EngineConfig>>,
    _file_watcher: Option<notify::RecommendedWatcher>,
}

impl ConfigLoader {
    /// Create new configuration loader
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            current_config: Arc::new(RwLock::new(EngineConfig::default())),
            change_notifier: None,
            _file_watcher: None,
        }
    }

    /// Load engine configuration with validation
    pub fn load_engine_config(&mut self) -> Result<EngineConfig, ConfigError> {
        let config = load_and_merge_configs(&self.config_paths)?;
        *self.current_config.write() = config.clone();
        Ok(config)
    }

    /// Get current configuration
    pub fn get_current_config(&self) -> EngineConfig {
        self.current_config.read().clone()
    }

    /// Watch the config files; every valid change is stored and sent on the
    /// returned channel
    pub fn enable_hot_reload(&mut self) -> Result<Receiver<EngineConfig>, ConfigError> {
        let (tx, rx) = channel::unbounded();
        self.change_notifier = Some(tx.clone());
        self.setup_file_watcher(tx)?;
        Ok(rx)
    }

    /// Reload configuration manually
    pub fn reload(&mut self) -> Result<EngineConfig, ConfigError> {
        let config = self.load_engine_config()?;

        if let Some(ref notifier) = self.change_notifier {
            let _ = notifier.send(config.clone());
        }

        Ok(config)
    }

    /// Validate a configuration file without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate_consistency().map_err(ConfigError::ValidationError)
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = self.get_current_config();
        let toml_content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn setup_file_watcher(&mut self, tx: Sender<EngineConfig>) -> Result<(), ConfigError> {
        use notify::{DebouncedEvent, RecursiveMode, Watcher};

        let (watch_tx, watch_rx) = mpsc::channel();
        let mut watcher = notify::watcher(watch_tx, Duration::from_millis(500))
            .map_err(|e| ConfigError::WatcherError(e.to_string()))?;

        let mut watched_paths = std::collections::HashSet::new();
        for path in &self.config_paths {
            if let Some(parent) = path.parent() {
                if parent.as_os_str().is_empty() || !parent.exists() {
                    continue;
                }
                if watched_paths.insert(parent.to_path_buf()) {
                    watcher
                        .watch(parent, RecursiveMode::NonRecursive)
                        .map_err(|e| ConfigError::WatcherError(e.to_string()))?;
                }
            }
        }

        let config_paths = self.config_paths.clone();
        let current = Arc::clone(&self.current_config);

        thread::spawn(move || {
            while let Ok(event) = watch_rx.recv() {
                let path = match event {
                    DebouncedEvent::Write(path) | DebouncedEvent::Create(path) => path,
                    _ => continue,
                };
                if !config_paths.iter().any(|p| p == &path) {
                    continue;
                }

                match load_and_merge_configs(&config_paths) {
                    Ok(new_config) => {
                        tracing::info!(path = %path.display(), "engine config reloaded");
                        *current.write() = new_config.clone();
                        if tx.send(new_config).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to reload config");
                    }
                }
            }
        });

        self._file_watcher = Some(watcher);
        Ok(())
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = dirs::home_dir() {
            candidates.push(home_dir.join(paths::USER_CONFIG_DIR).join("field.toml"));
        }

        candidates.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        candidates.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));

        candidates
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn load_and_merge_configs(config_paths: &[PathBuf]) -> Result<EngineConfig, ConfigError> {
    let mut merged = toml::Value::try_from(&EngineConfig::default())
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    for config_path in config_paths {
        match load_config_file(config_path) {
            Ok(file_config) => merge_toml_values(&mut merged, file_config),
            // Missing layers are optional
            Err(ConfigError::FileNotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    apply_environment_overrides(&mut merged, std::env::vars());

    let config: EngineConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    config.validate_consistency().map_err(ConfigError::ValidationError)?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// `TENS_FIELD_JITTER_SEED=7` sets `field.jitter_seed`
fn apply_environment_overrides(config: &mut toml::Value, vars: impl Iterator<Item = (String, String)>) {
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let name = name.to_lowercase();
        let Some((section, field)) = name.split_once('_') else {
            continue;
        };

        if let toml::Value::Table(root) = config {
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
            if let toml::Value::Table(table) = entry {
                table.insert(field.to_string(), parse_env_value(&value));
            }
        }
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

// Cross-platform directory discovery
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("USERPROFILE").map(PathBuf::from)
        }
        #[cfg(not(target_os = "windows"))]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
    }
}
