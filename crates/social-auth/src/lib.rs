//! Credential primitives for the social server.
//!
//! - [`password`]: argon2id hashing with fail-closed verification.
//! - [`token`]: HS256 session tokens carrying [`social_types::api::Claims`].

pub mod password;
pub mod token;

pub use password::{HashError, Hasher};
pub use token::{IssuedToken, TokenError, TokenService};
