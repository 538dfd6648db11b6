use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub auth_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 30,
            supabase_url: None,
            supabase_anon_key: None,
            auth_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Overlay `OLLAMA_URL`, `OLLAMA_MODEL`, `SUPABASE_URL` and
    /// `SUPABASE_ANON_KEY` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.model = model;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.supabase_url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.supabase_anon_key = Some(key);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs.max(1))
    }

    /// Supabase URL and anon key, both required to reach the sign-in screen.
    pub fn supabase(&self) -> Result<(&str, &str)> {
        match (self.supabase_url.as_deref(), self.supabase_anon_key.as_deref()) {
            (Some(url), Some(key)) => Ok((url, key)),
            _ => Err(anyhow!(
                "Supabase is not configured: set SUPABASE_URL and SUPABASE_ANON_KEY or add them to {}",
                Self::get_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            )),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ollama-assistant").join("config.json"))
    }

    /// Where the binary writes its log, e.g. `~/.local/share/ollama-assistant/assistant.log`.
    pub fn get_log_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join("ollama-assistant").join("assistant.log"))
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
        assert_eq!(config, Config::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.model = "mistral:7b".to_string();
        config.supabase_url = Some("https://example.supabase.co".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "phi3"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "phi3");
        assert_eq!(config.ollama_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("OLLAMA_URL", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", ""),
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.supabase().unwrap(), ("https://x.supabase.co", "anon"));
    }

    #[test]
    fn test_supabase_required() {
        assert!(Config::default().supabase().is_err());
    }
}
