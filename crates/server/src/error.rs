use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Failures talking to the identity provider.
///
/// Display output never contains the access token or client secret.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error("Unexpected response body: {0}")]
    InvalidBody(String),
    #[error("Token response carried no access token")]
    MissingAccessToken,
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout)
        } else if err.is_decode() {
            ProviderError::InvalidBody(err.without_url().to_string())
        } else {
            ProviderError::Transport(err.without_url().to_string())
        }
    }
}

/// Errors surfaced by the auth handlers. Each maps to one status code and JSON body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No code provided")]
    MissingCode,
    #[error("Failed to get token")]
    TokenExchangeFailed,
    #[error("Failed to fetch user profile")]
    ProfileFetchFailed,
    #[error("Identity provider timed out")]
    ProviderTimeout,
    #[error("No token")]
    NoToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Failed to sign session token")]
    Signing,
}

impl AuthError {
    /// Classify a failure of the code-for-token exchange.
    pub fn from_exchange(err: &ProviderError) -> Self {
        match err {
            ProviderError::Timeout(_) => AuthError::ProviderTimeout,
            _ => AuthError::TokenExchangeFailed,
        }
    }

    /// Classify a failure of the profile fetch.
    pub fn from_profile(err: &ProviderError) -> Self {
        match err {
            ProviderError::Timeout(_) => AuthError::ProviderTimeout,
            _ => AuthError::ProfileFetchFailed,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCode | AuthError::TokenExchangeFailed => StatusCode::BAD_REQUEST,
            AuthError::ProfileFetchFailed => StatusCode::BAD_GATEWAY,
            AuthError::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
            AuthError::NoToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::FORBIDDEN,
            AuthError::Signing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body. `valid` is only present on verification failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    pub error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            valid: matches!(self, AuthError::InvalidToken).then_some(false),
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
