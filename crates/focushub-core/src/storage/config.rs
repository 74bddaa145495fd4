//! TOML-based local configuration.
//!
//! Holds what the app needs before it can reach the backend:
//! - Backend endpoint and anon key
//! - Shell behavior (nudge delay, sample data seeding)
//!
//! Configuration is stored at `~/.config/focushub/config.toml`. The
//! `FOCUSHUB_BACKEND_URL` and `FOCUSHUB_BACKEND_KEY` environment variables
//! take precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use super::data_dir;
use crate::error::ConfigError;

const URL_PLACEHOLDER: &str = "YOUR_BACKEND_URL";
const KEY_PLACEHOLDER: &str = "YOUR_BACKEND_ANON_KEY";

pub const ENV_BACKEND_URL: &str = "FOCUSHUB_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "FOCUSHUB_BACKEND_KEY";

/// Hosted backend connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

/// Shell behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Seconds after startup before the elastic-mode nudge shows up.
    #[serde(default = "default_nudge_delay_secs")]
    pub nudge_delay_secs: u64,
    /// Fill empty task/plan/log lists with sample entries.
    #[serde(default = "default_true")]
    pub seed_samples: bool,
}

/// A validated backend endpoint. Only exists when the config is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub url: Url,
    pub anon_key: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focushub/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

fn default_nudge_delay_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            nudge_delay_secs: default_nudge_delay_secs(),
            seed_samples: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Apply `FOCUSHUB_BACKEND_URL` / `FOCUSHUB_BACKEND_KEY` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_BACKEND_URL).ok(),
            std::env::var(ENV_BACKEND_KEY).ok(),
        )
    }

    /// Replace backend settings with non-empty overrides.
    pub fn with_overrides(mut self, url: Option<String>, anon_key: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = anon_key.filter(|k| !k.trim().is_empty()) {
            self.backend.anon_key = key;
        }
        self
    }

    /// The backend endpoint, if one is usably configured.
    ///
    /// Empty values, the template placeholders and URLs that are not
    /// http(s) all count as "not configured".
    pub fn backend(&self) -> Option<BackendEndpoint> {
        let url = self.backend.url.trim();
        let key = self.backend.anon_key.trim();
        if url.is_empty() || key.is_empty() || url == URL_PLACEHOLDER || key == KEY_PLACEHOLDER {
            return None;
        }

        let mut parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            Ok(parsed) => {
                tracing::warn!(scheme = parsed.scheme(), "unsupported backend URL scheme");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid backend URL");
                return None;
            }
        };
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        Some(BackendEndpoint {
            url: parsed,
            anon_key: key.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(url: &str, key: &str) -> Config {
        Config::default().with_overrides(Some(url.to_string()), Some(key.to_string()))
    }

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.shell.nudge_delay_secs, 30);
        assert!(parsed.shell.seed_samples);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: Config = toml::from_str("[backend]\nurl = \"https://x.example\"\n").unwrap();
        assert_eq!(parsed.backend.anon_key, "");
        assert_eq!(parsed.shell, ShellConfig::default());
    }

    #[test]
    fn default_config_is_offline() {
        assert!(Config::default().backend().is_none());
    }

    #[test]
    fn placeholders_are_offline() {
        assert!(configured(URL_PLACEHOLDER, "key").backend().is_none());
        assert!(configured("https://x.example", KEY_PLACEHOLDER).backend().is_none());
    }

    #[test]
    fn non_http_url_is_offline() {
        assert!(configured("ftp://x.example", "key").backend().is_none());
        assert!(configured("not a url", "key").backend().is_none());
    }

    #[test]
    fn valid_backend_gets_trailing_slash() {
        let endpoint = configured("https://abc.example.co", "anon").backend().unwrap();
        assert_eq!(endpoint.url.as_str(), "https://abc.example.co/");
        assert_eq!(endpoint.anon_key, "anon");

        let endpoint = configured("http://localhost:5000/api", "anon").backend().unwrap();
        assert_eq!(endpoint.url.as_str(), "http://localhost:5000/api/");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut cfg = Config::default();
        cfg.backend.url = "https://file.example".into();
        let cfg = cfg.with_overrides(Some("  ".into()), None);
        assert_eq!(cfg.backend.url, "https://file.example");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("shell.nudge_delay_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("shell.seed_samples").as_deref(), Some("true"));
        assert_eq!(cfg.get("backend.url").as_deref(), Some(""));
        assert!(cfg.get("backend").is_none());
        assert!(cfg.get("shell.missing").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("backend.url", "https://abc.example").unwrap();
        cfg.set("shell.nudge_delay_secs", "5").unwrap();
        cfg.set("shell.seed_samples", "false").unwrap();
        assert_eq!(cfg.backend.url, "https://abc.example");
        assert_eq!(cfg.shell.nudge_delay_secs, 5);
        assert!(!cfg.shell.seed_samples);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("shell.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("shell.nudge_delay_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(cfg.set("shell", "x"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let cfg = configured("https://abc.example", "anon");
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn malformed_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
