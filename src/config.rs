//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "SIMILARITY_API_URL";

/// Base URL used when neither the environment nor the file sets one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Similarity service connection settings.
    pub api: ApiCfg,
}

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCfg {
    /// Base URL that both endpoints are joined onto.
    pub base_url: String,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Apply `SIMILARITY_API_URL` (after loading `.env`) on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        // A missing .env is the normal case.
        let _ = dotenvy::dotenv();
        self.apply_base_url_override(std::env::var(API_URL_ENV).ok());
        self
    }

    /// Replace the base URL when the override is present and non-blank.
    fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            tracing::info!("base url overridden by {API_URL_ENV}");
            self.api.base_url = url;
        }
    }

    /// Base URL with surrounding whitespace and trailing slashes removed.
    pub fn base_url(&self) -> &str {
        let url = self.api.base_url.trim().trim_end_matches('/');
        if url.is_empty() { DEFAULT_BASE_URL } else { url }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiCfg {
                base_url: DEFAULT_BASE_URL.into(),
            },
        }
    }
}
