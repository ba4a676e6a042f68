//! Configuration management for crumbjar

pub mod schema;

pub use schema::{Config, StrategyKind};

use crate::codec::EncryptionKey;
use crate::error::{JarError, JarResult};
use crate::jar::JarOptions;
use crate::lock::FileLocker;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding a hex-encoded key
pub const KEY_ENV: &str = "CRUMBJAR_KEY";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crumbjar")
            .join("config.toml")
    }

    /// Get the default cookie file path
    pub fn default_jar_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crumbjar")
            .join("cookies.json")
    }

    /// Load configuration, using defaults if the file does not exist
    pub fn load(&self) -> JarResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, path: &Path) -> JarResult<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| JarError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| JarError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> JarResult<()> {
        self.ensure_config_dir()?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).map_err(|e| {
            JarError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    fn ensure_config_dir(&self) -> JarResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| JarError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the encryption key: `CRUMBJAR_KEY` first, then `encryption.key_file`
///
/// Returns `None` when neither is set, in which case values are stored in
/// plaintext.
pub fn resolve_key(config: &Config) -> JarResult<Option<EncryptionKey>> {
    if let Ok(hex) = std::env::var(KEY_ENV) {
        if !hex.trim().is_empty() {
            debug!("Using encryption key from {}", KEY_ENV);
            return parse_key(hex.trim(), KEY_ENV).map(Some);
        }
    }

    let Some(path) = config.encryption.key_file.as_deref() else {
        return Ok(None);
    };
    let content = fs::read_to_string(path)
        .map_err(|e| JarError::io(format!("reading key file {}", path.display()), e))?;
    debug!("Using encryption key from {}", path.display());
    parse_key(content.trim(), &path.display().to_string()).map(Some)
}

fn parse_key(hex: &str, source: &str) -> JarResult<EncryptionKey> {
    EncryptionKey::from_hex(hex).map_err(|e| JarError::KeyInvalid(format!("{}: {}", source, e)))
}

/// Build jar options from configuration
///
/// `jar_override` (the `--jar` flag) wins over `jar.path`.
pub fn jar_options(config: &Config, jar_override: Option<&Path>) -> JarResult<JarOptions> {
    let path = jar_override
        .map(Path::to_path_buf)
        .or_else(|| config.jar.path.clone())
        .unwrap_or_else(ConfigManager::default_jar_path);

    let locker = FileLocker::new(config.lock.strategy.build(), config.lock.timing());
    let mut options = JarOptions::new()
        .with_path(path)
        .with_decrypt(config.encryption.decrypt)
        .with_locker(locker);
    if let Some(key) = resolve_key(config)? {
        options = options.with_key(key);
    }
    Ok(options)
}
