use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::auth::AppState;
use crate::found;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Where the gate sends callers without a valid session.
pub const LOGIN_PATH: &str = "/login";

/// Validates the session cookie and hands the caller's `Identity` to the
/// wrapped handler through request extensions. Without a valid token the
/// handler never runs and the caller is redirected to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return found(LOGIN_PATH);
    };

    match state.logic.authenticate(cookie.value()) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(_) => {
            debug!("Session cookie rejected for {}", req.uri().path());
            found(LOGIN_PATH)
        }
    }
}
