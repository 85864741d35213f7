use serde::{Deserialize, Serialize};

// -- Session --

/// JWT claims carried by the session cookie. Shared by the token service
/// (signing and validation) and the HTTP layer (cookie expiry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    /// Unix timestamp, seconds.
    pub exp: i64,
}

/// Caller identity resolved by the auth gate from a valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
        }
    }
}

// -- Forms --

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub content: String,
}

/// Front-page "find a profile" box.
#[derive(Debug, Deserialize)]
pub struct ProfileLookupForm {
    pub username: String,
}

// -- Responses --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
