use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summarize::{DEFAULT_MODELS, Provider};
use crate::tracks::SelectionPolicy;
use crate::youtube::DEFAULT_FETCH_TIMEOUT;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub default_format: Option<String>,
    pub candidate_models: Option<Vec<String>>,
    pub api_key: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub fallback_languages: Option<usize>,
    pub strict_video_id: Option<bool>,
    pub download_dir: Option<PathBuf>,
    pub ytdlp_path: Option<PathBuf>,
}

impl Config {
    /// Load config from ~/.config/tubetalk/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT)
    }

    /// Track selection policy, with `lang` overriding the configured language
    pub fn selection_policy(&self, lang: Option<&str>) -> SelectionPolicy {
        let default = SelectionPolicy::default();
        SelectionPolicy {
            preferred_lang: lang
                .or(self.default_lang.as_deref())
                .map(str::to_string)
                .unwrap_or(default.preferred_lang),
            other_lang_limit: self.fallback_languages.unwrap_or(default.other_lang_limit),
        }
    }

    pub fn candidate_models(&self) -> Vec<String> {
        self.candidate_models
            .clone()
            .filter(|models| !models.is_empty())
            .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect())
    }

    /// Configured key, else the env var of the first candidate's provider
    pub fn resolve_api_key(&self, models: &[String]) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        let provider = models
            .first()
            .map(|m| Provider::for_model(m))
            .unwrap_or(Provider::Gemini);
        std::env::var(provider.api_key_env())
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("tubetalk")
        .join("config.toml")
}
