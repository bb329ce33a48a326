//! Short-lived access token cached on disk between runs.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Seconds shaved off the expiry so a token is never used at the edge.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Non-secret token metadata kept in `<config dir>/inbox_triage/tokens.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at_epoch: i64,
}

impl CachedToken {
    pub fn is_fresh(&self, now_epoch: i64) -> bool {
        now_epoch + EXPIRY_MARGIN_SECS < self.expires_at_epoch
    }
}

pub fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

pub fn save_to(path: &Path, token: &CachedToken) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(token)?)?;
    Ok(())
}

/// `None` when there is no cache; an unreadable cache is treated the same.
pub fn load_from(path: &Path) -> Result<Option<CachedToken>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)?;
    match serde_json::from_str(&s) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            log::warn!("ignoring unreadable token cache {}: {e}", path.display());
            Ok(None)
        }
    }
}
