use anyhow::{Result, anyhow};
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::token_cache::{self, CachedToken};
use crate::auth::{oauth, token_store};
use crate::config::Config;

/// Assumed lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3500;

/// Authenticated access to the account, handed to the provider clients.
#[derive(Clone)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub(crate) fn bearer(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct SessionManager {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    user_email: String,
    cache_path: PathBuf,
}

impl SessionManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let user_email = cfg
            .user_email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| anyhow!("user_email not set in config"))?;

        let client_secret = token_store::load_client_secret(&cfg.client_id)?
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id: cfg.client_id.clone(),
            client_secret,
            redirect_uri: cfg.redirect_uri().to_string(),
            user_email,
            cache_path: token_cache::tokens_path()?,
        })
    }

    /// Cached token, then keyring refresh token, then interactive consent.
    pub fn open_session(&self) -> Result<Session> {
        let now = now_epoch()?;

        if let Some(cached) = token_cache::load_from(&self.cache_path)?
            && cached.is_fresh(now)
        {
            log::debug!("using cached access token");
            return Ok(Session::new(cached.access_token));
        }

        if let Some(rt) = token_store::load_refresh_token(&self.user_email)? {
            log::info!("refreshing access token for {}", self.user_email);
            let t = oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)?;
            return self.finish(t, now);
        }

        self.login()
    }

    /// Runs the consent flow regardless of any stored credentials.
    pub fn login(&self) -> Result<Session> {
        let now = now_epoch()?;
        let t = oauth::perform_pkce_flow(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
        )?;
        self.finish(t, now)
    }

    fn finish(&self, t: oauth::Tokens, now: i64) -> Result<Session> {
        if let Some(rt) = &t.refresh_token
            && let Err(e) = token_store::save_refresh_token(&self.user_email, rt)
        {
            log::warn!("could not store refresh token in keyring: {e}");
        }

        let expires_at_epoch = t
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + DEFAULT_TOKEN_LIFETIME_SECS);
        token_cache::save_to(
            &self.cache_path,
            &CachedToken {
                access_token: t.access_token.clone(),
                expires_at_epoch,
            },
        )?;

        Ok(Session::new(t.access_token))
    }
}

fn now_epoch() -> Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_token() {
        let session = Session::new("ya29.secret");
        let shown = format!("{session:?}");
        assert!(!shown.contains("ya29.secret"));
        assert_eq!(session.bearer(), "ya29.secret");
    }
}
