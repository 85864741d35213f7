use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Response,
};
use axum_extra::extract::CookieJar;

use social_types::api::Identity;
use social_types::models::{Profile, User};

use crate::auth::{AppState, removal_cookie};
use crate::error::AppError;
use crate::middleware::LOGIN_PATH;
use crate::{blocking, found};

/// Public profile: the user and their posts, newest first.
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = blocking(&state, move |logic| logic.profile(&username)).await?;
    Ok(Json(profile))
}

pub async fn users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = blocking(&state, |logic| logic.users()).await?;
    Ok(Json(users))
}

/// Deletes the caller's account and posts, then signs them out.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    blocking(&state, move |logic| logic.delete_account(&identity)).await?;
    Ok((jar.remove(removal_cookie()), found(LOGIN_PATH)))
}
