use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::orchestrator::TurnSettings;
use crate::suggestions::DEFAULT_SUGGESTIONS;

pub const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ACCOUNT_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub inference_url: String,
    pub account_url: String,
    pub session_cookie: Option<String>,
    /// Program and arguments of the external dictation engine
    pub dictation_command: Option<Vec<String>>,
    pub reply_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub suggestions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            account_url: DEFAULT_ACCOUNT_URL.to_string(),
            session_cookie: None,
            dictation_command: None,
            reply_delay_ms: 1000,
            request_timeout_secs: 30,
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Environment variables win over the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DSAGPT_INFERENCE_URL") {
            self.inference_url = url;
        }
        if let Some(url) = lookup("DSAGPT_ACCOUNT_URL") {
            self.account_url = url;
        }
        if let Some(cookie) = lookup("DSAGPT_SESSION_COOKIE") {
            self.session_cookie = Some(cookie);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            reply_delay: Duration::from_millis(self.reply_delay_ms),
            suggestions: self.suggestions.clone(),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("dsagpt").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.inference_url, "http://127.0.0.1:5000");
        assert_eq!(config.account_url, "http://localhost:8000");
        assert_eq!(config.suggestions.len(), 4);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"inference_url": "http://tutor:9000", "dictation_command": ["whisper-stream", "-l", "en"]}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.inference_url, "http://tutor:9000");
        assert_eq!(config.account_url, DEFAULT_ACCOUNT_URL);
        assert_eq!(
            config.dictation_command,
            Some(vec!["whisper-stream".to_string(), "-l".to_string(), "en".to_string()])
        );
        assert_eq!(config.reply_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::new();
        config.session_cookie = Some("connect.sid=abc".to_string());
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("DSAGPT_INFERENCE_URL", "http://gpu-box:5000"),
            ("DSAGPT_SESSION_COOKIE", "sid=1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::new();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.inference_url, "http://gpu-box:5000");
        assert_eq!(config.account_url, DEFAULT_ACCOUNT_URL);
        assert_eq!(config.session_cookie.as_deref(), Some("sid=1"));
    }

    #[test]
    fn test_turn_settings() {
        let mut config = Config::new();
        config.reply_delay_ms = 250;
        let settings = config.turn_settings();
        assert_eq!(settings.reply_delay, Duration::from_millis(250));
        assert_eq!(settings.suggestions, config.suggestions);
    }
}
