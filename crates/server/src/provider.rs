//! Outbound calls to the identity provider (Discord).
//!
//! Two requests are made per login: the authorization code is exchanged for an
//! access token, then the access token fetches the user's profile. Both share
//! one pooled client with a whole-request timeout. Nothing is retried.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url, header};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ProviderError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Upper bound on a provider response body. Token and profile payloads are a
/// few hundred bytes.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Provider access token. Used once for the profile fetch, then dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

/// Token endpoint response. Discord may answer 200 with an error body, so the
/// token field is optional and checked explicitly.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// The subset of the `users/@me` resource the relay keeps.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Not `Debug`: holds the client secret.
#[derive(Clone)]
pub struct DiscordClient {
    http: Client,
    timeout: Duration,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    authorize_url: Url,
    token_url: Url,
    user_url: Url,
    landing_url: Url,
}

impl DiscordClient {
    pub fn new(config: &AppConfig) -> Result<Self, ProviderError> {
        let timeout = config.provider.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        let scope = config.provider.scope_string();
        let authorize_url = Url::parse_with_params(
            &config.provider.authorize_url,
            &[
                ("client_id", config.discord_client_id.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| ProviderError::Client(format!("invalid authorize_url: {e}")))?;
        let token_url = Url::parse(&config.provider.token_url)
            .map_err(|e| ProviderError::Client(format!("invalid token_url: {e}")))?;
        let user_url = Url::parse(&config.provider.user_url)
            .map_err(|e| ProviderError::Client(format!("invalid user_url: {e}")))?;
        let landing_url = Url::parse(&config.redirect_uri)
            .map_err(|e| ProviderError::Client(format!("invalid redirect_uri: {e}")))?;

        Ok(Self {
            http,
            timeout,
            client_id: config.discord_client_id.clone(),
            client_secret: config.discord_client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope,
            authorize_url,
            token_url,
            user_url,
            landing_url,
        })
    }

    /// The provider consent page the browser is sent to.
    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    /// The frontend landing page with the session token appended as `token`.
    pub fn landing_url(&self, session_token: &str) -> Url {
        let mut url = self.landing_url.clone();
        url.query_pairs_mut().append_pair("token", session_token);
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// The body is inspected whatever the status code: only a non-empty
    /// `access_token` counts as success.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let body = self.read_body(response).await?;

        let parsed: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(
                name = "provider.exchange_code.invalid_body",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                status = %status,
                error = %e,
                message = "Token endpoint returned a non-JSON body"
            );
            ProviderError::InvalidBody(e.to_string())
        })?;

        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken(token)),
            _ => {
                tracing::warn!(
                    name = "provider.exchange_code.no_access_token",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    status = %status,
                    message = "Token endpoint response carried no access token"
                );
                Err(ProviderError::MissingAccessToken)
            }
        }
    }

    /// Fetch the profile of the user the access token belongs to.
    #[tracing::instrument(skip_all)]
    pub async fn fetch_profile(&self, token: &AccessToken) -> Result<DiscordProfile, ProviderError> {
        let response = self
            .http
            .get(self.user_url.clone())
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body = self.read_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidBody(e.to_string()))
    }

    /// Read a response body, giving up once it grows past `MAX_RESPONSE_BYTES`.
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, ProviderError> {
        let too_large =
            || ProviderError::InvalidBody(format!("body exceeds {MAX_RESPONSE_BYTES} bytes"));

        if response
            .content_length()
            .is_some_and(|len| len > MAX_RESPONSE_BYTES as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?
        {
            if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}
