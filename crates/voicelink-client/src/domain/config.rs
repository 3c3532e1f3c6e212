//! TOML-based configuration persistence for the shell application.
//!
//! Reads and writes `ShellConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\VoiceLink\config.toml`
//! - Linux:    `~/.config/voicelink/config.toml`
//! - macOS:    `~/Library/Application Support/VoiceLink/config.toml`
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so the shell
//! works on first run (before a config file exists) and when upgrading from
//! an older config file that is missing newer fields.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level shell configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    pub server: ServerConfig,
    pub shell: ShellSettings,
}

/// Backend server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// WebSocket URL of the backend server, e.g. `"ws://127.0.0.1:8080/ws"`.
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Seconds between heartbeat pings while the connection is open.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: u64,
    /// Seconds to wait before redialling after an abnormal disconnect.
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_delay_secs: u64,
}

/// General shell behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellSettings {
    /// Schema version string – bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ServerConfig {
    /// Heartbeat interval as a [`Duration`].
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Reconnect delay as a [`Duration`].
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_server_url() -> String {
    "ws://127.0.0.1:8080/ws".to_string()
}
fn default_heartbeat_secs() -> u64 {
    45
}
fn default_reconnect_secs() -> u64 {
    5
}
fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            shell: ShellSettings::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            heartbeat_interval_secs: default_heartbeat_secs(),
            reconnect_delay_secs: default_reconnect_secs(),
        }
    }
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `ShellConfig` from disk, returning `ShellConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<ShellConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: ShellConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ShellConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk.
///
/// Creates the config directory and file if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &ShellConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    // Ensure directory exists before writing.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("VoiceLink"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("voicelink"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/VoiceLink
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("VoiceLink"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // ── ShellConfig defaults ──────────────────────────────────────────────────

    #[test]
    fn test_shell_config_default_has_expected_timings() {
        // Arrange / Act
        let cfg = ShellConfig::default();

        // Assert
        assert_eq!(cfg.server.heartbeat_interval_secs, 45);
        assert_eq!(cfg.server.reconnect_delay_secs, 5);
    }

    #[test]
    fn test_shell_config_default_url_is_local() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.server.url, "ws://127.0.0.1:8080/ws");
    }

    #[test]
    fn test_shell_settings_default_log_level_is_info() {
        let cfg = ShellSettings::default();
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_duration_accessors_convert_seconds() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(45));
        assert_eq!(cfg.reconnect_delay(), Duration::from_secs(5));
    }

    // ── TOML round-trip ───────────────────────────────────────────────────────

    #[test]
    fn test_shell_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = ShellConfig::default();
        cfg.server.url = "wss://voice.example.com/ws".to_string();
        cfg.server.heartbeat_interval_secs = 30;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: ShellConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_deserialize_minimal_toml_uses_defaults() {
        // Arrange: minimal TOML with only required sections
        let toml_str = r#"
[server]
[shell]
"#;

        // Act
        let cfg: ShellConfig = toml::from_str(toml_str).expect("deserialize minimal");

        // Assert
        assert_eq!(cfg.server.heartbeat_interval_secs, 45);
        assert_eq!(cfg.shell.log_level, "info");
    }

    #[test]
    fn test_deserialize_partial_server_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[server]
reconnect_delay_secs = 10
[shell]
"#;

        // Act
        let cfg: ShellConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.server.reconnect_delay_secs, 10);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.server.heartbeat_interval_secs, 45);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        // Arrange
        let bad_toml = "[[[ not valid toml";

        // Act
        let result: Result<ShellConfig, toml::de::Error> = toml::from_str(bad_toml);

        // Assert
        assert!(result.is_err());
    }

    // ── save/load via temp directory ──────────────────────────────────────────

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("voicelink_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut cfg = ShellConfig::default();
        cfg.server.url = "ws://10.0.0.2:9000/ws".to_string();
        cfg.shell.log_level = "debug".to_string();

        // Act – serialize and write manually (mirrors save_config logic)
        let content = toml::to_string_pretty(&cfg).unwrap();
        std::fs::write(&path, &content).unwrap();
        let loaded: ShellConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        // Assert
        assert_eq!(loaded.server.url, "ws://10.0.0.2:9000/ws");
        assert_eq!(loaded.shell.log_level, "debug");

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        let path_result = config_file_path();
        if let Ok(path) = path_result {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir (e.g. in a stripped CI env) is also acceptable.
    }
}
