//! Self-contained session tokens.
//!
//! A session token is an HS256 JWT carrying [`SessionClaims`] plus `iat`/`exp`.
//! Nothing is stored server side: a token is valid exactly when its signature
//! checks out against the process secret and it has not expired. Tokens cannot
//! be revoked before `exp`.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::provider::DiscordProfile;

/// Lifetime of every issued session token.
pub const SESSION_TTL: time::Duration = time::Duration::days(7);

/// Discriminator reported for accounts that no longer have one.
pub const NO_DISCRIMINATOR: &str = "0";

/// The user fields embedded in a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    pub discord_id: String,
    pub username: String,
    pub discriminator: String,
    pub avatar: Option<String>,
}

impl From<DiscordProfile> for SessionClaims {
    fn from(profile: DiscordProfile) -> Self {
        Self {
            discord_id: profile.id,
            username: profile.username,
            discriminator: profile
                .discriminator
                .unwrap_or_else(|| NO_DISCRIMINATOR.to_string()),
            avatar: profile.avatar,
        }
    }
}

/// Decoded token payload: the session claims plus the registered time claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SignedClaims {
    #[serde(flatten)]
    pub user: SessionClaims,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens with one symmetric secret.
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(claims, OffsetDateTime::now_utc())
    }

    /// Issue a token as if signed at `issued_at`.
    pub fn issue_at(
        &self,
        claims: &SessionClaims,
        issued_at: OffsetDateTime,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let payload = SignedClaims {
            user: claims.clone(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + SESSION_TTL).unix_timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
    }

    /// Check signature and expiry. Has no side effects; a token may be verified any number of times.
    pub fn verify(&self, token: &str) -> Result<SignedClaims, jsonwebtoken::errors::Error> {
        decode::<SignedClaims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}
