//! A minimal Discord OAuth2 relay.
//!
//! The relay sends browsers to Discord's consent page, exchanges the returned
//! authorization code for a profile, and hands the frontend a signed session
//! token it can later present to `/auth/verify`.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::ProviderError;
use crate::provider::DiscordClient;
use crate::session::SessionSigner;

pub mod api;
pub mod config;
pub mod error;
pub mod provider;
pub mod session;

/// Read-only state shared by every handler. Built once at startup.
#[derive(Clone)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub discord: Arc<DiscordClient>,
    pub sessions: Arc<SessionSigner>,
}

impl AppResources {
    pub fn from_config(config: AppConfig) -> Result<Self, ProviderError> {
        let discord = DiscordClient::new(&config)?;
        let sessions = SessionSigner::new(config.jwt_secret.as_bytes());
        Ok(Self {
            config: Arc::new(config),
            discord: Arc::new(discord),
            sessions: Arc::new(sessions),
        })
    }
}
