//! Configuration management for the media center
//!
//! Reads `/etc/media-center/config.yaml` (or the file named by
//! `MEDIA_CENTER_CONFIG`). Every key is optional; a missing file means
//! defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Path to the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/media-center/config.yaml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_ENV: &str = "MEDIA_CENTER_CONFIG";

/// Media center configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory shown at startup
    pub start_directory: PathBuf,

    /// Framebuffer device drawn to
    pub framebuffer_device: String,

    /// Terminal that receives the display wake sequence
    pub wake_tty: String,

    /// Minimum time between two wake sequences
    pub wake_interval_secs: u64,

    /// Render loop period
    pub render_interval_ms: u64,

    /// Explicit evdev device for the remote (autodetect when unset)
    pub input_device: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Video player settings
    pub player: PlayerConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            start_directory: PathBuf::from("/mnt"),
            framebuffer_device: "/dev/fb0".to_string(),
            wake_tty: "/dev/tty1".to_string(),
            wake_interval_secs: 60,
            render_interval_ms: 500,
            input_device: None,
            log_level: "info".to_string(),
            player: PlayerConfig::default(),
        }
    }
}

/// Player backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerBackend {
    /// Spawn an external player process
    Omxplayer,
    /// Headless stand-in that never spawns anything
    Mock,
}

/// Video player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub backend: PlayerBackend,

    /// Executable to launch
    pub program: String,

    /// Arguments placed before the video path
    pub args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backend: PlayerBackend::Omxplayer,
            program: "omxplayer".to_string(),
            args: vec!["-wr".to_string()],
        }
    }
}

impl MediaConfig {
    /// Load the configuration from the default location.
    pub fn load_default() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Load the configuration from a YAML file, falling back to defaults
    /// when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: MediaConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the media center cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.render_interval_ms == 0 {
            return Err(anyhow::anyhow!("render_interval_ms must be greater than 0"));
        }
        if self.player.program.trim().is_empty() {
            return Err(anyhow::anyhow!("player.program must not be empty"));
        }
        Ok(())
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn wake_interval(&self) -> Duration {
        Duration::from_secs(self.wake_interval_secs)
    }
}
