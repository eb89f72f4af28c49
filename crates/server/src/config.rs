use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Values the relay used to fall back to when a credential was not configured.
/// Running with any of them would leave the service trivially forgeable.
pub const PLACEHOLDER_VALUES: &[&str] = &[
    "YOUR_DISCORD_CLIENT_ID",
    "YOUR_DISCORD_CLIENT_SECRET",
    "supersecretjwt",
];

/// HS256 keys shorter than the digest size are rejected.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Identity provider endpoints and request parameters.
///
/// Defaults point at Discord. Tests override the URLs to reach a mock server.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_user_url")]
    pub user_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Upper bound for each outbound call, from connect until the body is read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            user_url: default_user_url(),
            scopes: default_scopes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Scopes as sent on the wire: space separated.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub discord_client_id: String,
    pub discord_client_secret: String,
    /// Both the provider callback target and the frontend landing page that
    /// receives `?token=`.
    pub redirect_uri: String,
    pub jwt_secret: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("discord_client_id", &self.discord_client_id)
            .field("discord_client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("jwt_secret", &"[redacted]")
            .field("listen_addr", &self.listen_addr)
            .field("provider", &self.provider)
            .finish()
    }
}

impl AppConfig {
    /// Reject configurations the service must never run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_credential("discord_client_id", &self.discord_client_id)?;
        require_credential("discord_client_secret", &self.discord_client_secret)?;
        require_credential("jwt_secret", &self.jwt_secret)?;

        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Validation(format!(
                "jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }

        require_url("redirect_uri", &self.redirect_uri)?;
        require_url("provider.authorize_url", &self.provider.authorize_url)?;
        require_url("provider.token_url", &self.provider.token_url)?;
        require_url("provider.user_url", &self.provider.user_url)?;

        if self.provider.scopes.is_empty() {
            return Err(ConfigError::Validation(
                "provider.scopes must contain at least one scope".into(),
            ));
        }
        if self.provider.scopes.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "provider.scopes must not contain blank entries".into(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }
}

fn require_credential(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{key} must be set")));
    }
    if PLACEHOLDER_VALUES.contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{key} still holds a placeholder value"
        )));
    }
    Ok(())
}

fn require_url(key: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("{key} is not an absolute URL: {e}")))
}

fn default_authorize_url() -> String {
    "https://discord.com/api/oauth2/authorize".to_string()
}

fn default_token_url() -> String {
    "https://discord.com/api/oauth2/token".to_string()
}

fn default_user_url() -> String {
    "https://discord.com/api/users/@me".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["identify".to_string(), "guilds".to_string()]
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_listen_addr() -> String {
    "0.0.0.0:4000".to_string()
}

/// Load application configuration from an optional `config.yaml` + environment overrides.
///
/// Top-level keys map to unprefixed variables (`DISCORD_CLIENT_ID`, `JWT_SECRET`, ...).
/// Nested keys use double underscores, e.g. `PROVIDER__TIMEOUT_SECS`.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;

    Ok(app)
}
