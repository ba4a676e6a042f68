//! Configuration schema for crumbjar
//!
//! Configuration is stored at `~/.config/crumbjar/config.toml`

use crate::jar::DecryptPolicy;
use crate::lock::{native_strategy, InPlace, LockConfig, LockStrategy, Sidecar};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cookie file settings
    pub jar: JarConfig,

    /// File locking
    pub lock: LockSettings,

    /// Value encryption at rest
    pub encryption: EncryptionConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cookie file settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JarConfig {
    /// Cookie file (defaults to the platform data directory)
    pub path: Option<PathBuf>,
}

/// Which lock artifact to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Whatever suits the current platform
    #[default]
    Native,
    /// Lock the cookie file itself
    InPlace,
    /// Lock `<file>.lock` and remove it afterwards
    Sidecar,
}

impl StrategyKind {
    pub fn build(self) -> Arc<dyn LockStrategy> {
        match self {
            Self::Native => native_strategy(),
            Self::InPlace => Arc::new(InPlace),
            Self::Sidecar => Arc::new(Sidecar),
        }
    }
}

/// File locking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Total time to wait for the lock, in milliseconds
    pub timeout_ms: u64,

    /// Delay between lock attempts, in microseconds
    pub poll_interval_us: u64,

    pub strategy: StrategyKind,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 100,
            poll_interval_us: 100,
            strategy: StrategyKind::Native,
        }
    }
}

impl LockSettings {
    pub fn timing(&self) -> LockConfig {
        LockConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            poll_interval: Duration::from_micros(self.poll_interval_us),
        }
    }
}

/// Encryption configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// File holding a hex-encoded AES key. `CRUMBJAR_KEY` takes precedence.
    pub key_file: Option<PathBuf>,

    /// When to decrypt values read from disk
    pub decrypt: DecryptPolicy,
}
