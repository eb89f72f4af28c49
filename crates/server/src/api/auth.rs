//! Discord login and session verification endpoints.
//!
//! - `/discord` - Redirect to the Discord consent page
//! - `/discord/callback` - Exchange the authorization code and issue a session token
//! - `/verify` - Check a session token presented as a bearer credential

use crate::{
    AppResources,
    error::{AuthError, ErrorBody},
    session::{SessionClaims, SignedClaims},
};
use axum::{
    Extension, Json,
    extract::{Query, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const AUTH_TAG: &str = "Discord Auth";

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Authorization code issued by Discord after the user consented.
    pub code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: SignedClaims,
}

/// Creates the auth API router.
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(discord_login))
        .routes(routes!(discord_callback))
        .routes(routes!(verify_token))
}

fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// The token is the second space-delimited segment of the header, whatever the
/// scheme word. A value without a space yields the empty token.
pub fn bearer_segment(value: &HeaderValue) -> &str {
    value
        .to_str()
        .ok()
        .and_then(|v| v.split(' ').nth(1))
        .unwrap_or_default()
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/discord",
    tag = AUTH_TAG,
    operation_id = "Discord Login",
    summary = "Start the Discord login flow",
    description = "Redirects the browser to Discord's OAuth2 consent page, requesting the \
                   `identify` and `guilds` scopes. Discord sends the user back to the configured \
                   redirect URI with an authorization code.",
    responses(
        (status = 302, description = "Redirect to the Discord authorization page")
    )
)]
async fn discord_login(Extension(resources): Extension<AppResources>) -> Response {
    found(resources.discord.authorize_url().as_str())
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/discord/callback",
    tag = AUTH_TAG,
    operation_id = "Discord Callback",
    summary = "Complete the Discord login flow",
    description = "Exchanges the authorization code for a Discord access token, fetches the \
                   user's profile and signs a session token valid for 7 days.\n\n\
                   The token is handed to the frontend as the `token` query parameter of a \
                   redirect to the configured redirect URI. No cookie is set.",
    params(CallbackParams),
    responses(
        (status = 302, description = "Redirect to the frontend with `?token=<session token>`"),
        (status = 400, description = "Missing code, or Discord returned no access token", body = ErrorBody, content_type = "application/json",
            example = json!({"error": "No code provided"})),
        (status = 502, description = "The Discord profile could not be fetched", body = ErrorBody, content_type = "application/json"),
        (status = 504, description = "Discord did not answer in time", body = ErrorBody, content_type = "application/json"),
        (status = 500, description = "The session token could not be signed", body = ErrorBody, content_type = "application/json")
    )
)]
async fn discord_callback(
    Extension(resources): Extension<AppResources>,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Response, AuthError> {
    let params = params.map_err(|e| {
        tracing::debug!(
            name = "api.discord_callback.bad_query",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            error = %e.body_text(),
            message = "Callback query string rejected"
        );
        AuthError::MissingCode
    })?;
    let code = params
        .0
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingCode)?;

    let access_token = resources
        .discord
        .exchange_code(&code)
        .await
        .map_err(|e| {
            tracing::warn!(
                name = "api.discord_callback.exchange_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "Authorization code exchange failed"
            );
            AuthError::from_exchange(&e)
        })?;

    let profile = resources
        .discord
        .fetch_profile(&access_token)
        .await
        .map_err(|e| {
            tracing::warn!(
                name = "api.discord_callback.profile_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "Failed to fetch Discord profile"
            );
            AuthError::from_profile(&e)
        })?;

    let claims = SessionClaims::from(profile);
    let token = resources.sessions.issue(&claims).map_err(|e| {
        tracing::error!(
            name = "api.discord_callback.sign_failed",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            error = %e,
            message = "Failed to sign session token"
        );
        AuthError::Signing
    })?;

    tracing::info!(
        name = "api.discord_callback.session_issued",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        discord_id = %claims.discord_id,
        message = "Issued session token"
    );

    Ok(found(resources.discord.landing_url(&token).as_str()))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/verify",
    tag = AUTH_TAG,
    operation_id = "Verify Session Token",
    summary = "Validate a session token",
    description = "Checks the signature and expiry of a session token passed as \
                   `Authorization: Bearer <token>` and echoes its decoded claims.\n\n\
                   Expired, tampered and malformed tokens all yield the same 403 response.",
    params(
        ("Authorization" = String, Header, description = "`Bearer <session token>`")
    ),
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse, content_type = "application/json"),
        (status = 401, description = "No Authorization header", body = ErrorBody, content_type = "application/json",
            example = json!({"error": "No token"})),
        (status = 403, description = "Token failed verification", body = ErrorBody, content_type = "application/json",
            example = json!({"valid": false, "error": "Invalid token"}))
    ),
    security(("Authorization" = []))
)]
async fn verify_token(
    Extension(resources): Extension<AppResources>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AuthError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::NoToken)?;

    let user = resources
        .sessions
        .verify(bearer_segment(authorization))
        .map_err(|e| {
            tracing::debug!(
                name = "api.verify_token.rejected",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                reason = ?e.kind(),
                message = "Session token rejected"
            );
            AuthError::InvalidToken
        })?;

    Ok(Json(VerifyResponse { valid: true, user }))
}
