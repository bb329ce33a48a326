use anyhow::{Result, anyhow};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::event::DEFAULT_CALENDAR_ID;
use crate::generate::Fallbacks;
use crate::generate::backend::PromptVia;

pub const APP_DIR: &str = "inbox_triage";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub client_id: String,
    /// Account address; keys the keyring entry and stands in for the
    /// profile address when that cannot be read.
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub program: String,
    pub args: Vec<String>,
    pub prompt_via: PromptVia,
    pub summary_fallback: Option<String>,
    pub acknowledgment_fallback: Option<String>,
    /// Appended to acknowledgments.
    pub signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CalendarConfig {
    pub enabled: bool,
    pub calendar_id: String,
    /// IANA label sent with event times, e.g. "Asia/Kolkata".
    pub time_zone: String,
    /// Offset relative phrases resolve in, e.g. "+05:30".
    pub utc_offset: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ApiConfig {
    pub gmail_base_url: Option<String>,
    pub calendar_base_url: Option<String>,
}

fn default_owner_name() -> String {
    "the recipient".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            program: "ollama".to_string(),
            args: vec!["run".to_string(), "llama3".to_string()],
            prompt_via: PromptVia::Argument,
            summary_fallback: None,
            acknowledgment_fallback: None,
            signature: None,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            time_zone: "UTC".to_string(),
            utc_offset: "+00:00".to_string(),
        }
    }
}

impl Config {
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI)
    }

    pub fn fallbacks(&self) -> Fallbacks {
        let mut fallbacks = Fallbacks::default();
        if let Some(s) = non_blank(&self.generation.summary_fallback) {
            fallbacks.summary = s.to_string();
        }
        if let Some(s) = non_blank(&self.generation.acknowledgment_fallback) {
            fallbacks.acknowledgment = s.to_string();
        }
        fallbacks
    }
}

impl CalendarConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset
            .trim()
            .parse::<FixedOffset>()
            .map_err(|e| anyhow!("invalid calendar.utc_offset '{}': {e}", self.utc_offset))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

pub fn config_dir() -> Result<PathBuf> {
    let p = dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join(APP_DIR);
    fs::create_dir_all(&p)?;
    Ok(p)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Reads `path`, or writes a template there and fails if it is missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        write_template(path)?;
        return Err(anyhow!(
            "Created template config at {}, edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config =
        toml::from_str(&s).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))?;
    if cfg.client_id.trim().is_empty() {
        return Err(anyhow!("client_id not set in {}", path.display()));
    }
    Ok(cfg)
}

fn write_template(path: &Path) -> Result<()> {
    let sample = Config {
        client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
        user_email: Some("you@example.com".to_string()),
        redirect_uri: Some(DEFAULT_REDIRECT_URI.to_string()),
        owner_name: "Your Name".to_string(),
        generation: GenerationConfig::default(),
        calendar: CalendarConfig::default(),
        api: ApiConfig::default(),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(&sample)?)?;
    Ok(())
}
