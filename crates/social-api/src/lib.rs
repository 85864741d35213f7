pub mod auth;
pub mod error;
pub mod logic;
pub mod middleware;
pub mod posts;
pub mod profile;

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

pub use auth::{AppState, AppStateInner};
pub use error::AppError;
pub use logic::Logic;

use crate::middleware::require_session;

/// All routes. Pages behind the session gate redirect to `/login` when the
/// `token` cookie is missing or invalid.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(posts::index).post(posts::find_profile))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/profile/{username}", get(profile::profile))
        .route("/users", get(profile::users));

    let protected_routes = Router::new()
        .route("/post", post(posts::create_post))
        .route("/post/{post_id}/delete", post(posts::delete_post))
        .route("/feed", get(posts::feed))
        .route("/account/delete", post(profile::delete_account))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// `302 Found` to `location`.
pub(crate) fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// Runs blocking logic (SQLite, argon2) off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Logic) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.logic))
        .await
        .map_err(|e| AppError::internal("spawn_blocking join error", e))?
}
