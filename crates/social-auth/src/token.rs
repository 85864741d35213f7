use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;

use social_types::api::Claims;

/// Session lifetime: 24 hours from issue.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// A freshly signed token together with the claims it carries, so callers
/// can line the cookie expiry up with `claims.exp`.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and validates HS256 session tokens with one process-wide secret.
///
/// Validation depends only on the token, the secret and the clock. Nothing
/// is stored server-side, so a token stays good until its `exp` across
/// restarts, and swapping the secret invalidates every outstanding token.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against an explicit clock in `validate_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, id: i64, username: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            id,
            username: username.to_string(),
            exp: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Sign)?;

        Ok(IssuedToken { token, claims })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Checks signature, structure and claim types, then expiry against `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Rejected session token: {}", e);
            TokenError::Invalid(e)
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
