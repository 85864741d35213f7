use std::sync::Arc;

use axum::{Form, extract::State, response::Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use social_auth::IssuedToken;
use social_types::api::{LoginForm, RegisterForm};

use crate::error::AppError;
use crate::logic::Logic;
use crate::middleware::{LOGIN_PATH, SESSION_COOKIE};
use crate::{blocking, found};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub logic: Logic,
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    blocking(&state, move |logic| {
        logic.register(&form.username, &form.password)
    })
    .await?;

    Ok(found(LOGIN_PATH))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Response), AppError> {
    let issued = blocking(&state, move |logic| {
        logic.login(&form.username, &form.password)
    })
    .await?;

    Ok((jar.add(session_cookie(&issued)?), found("/feed")))
}

/// Sessions live only in the token, so logging out just drops the cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Response) {
    (jar.remove(removal_cookie()), found(LOGIN_PATH))
}

/// HTTP-only cookie on `/`, expiring together with the token's claim.
fn session_cookie(issued: &IssuedToken) -> Result<Cookie<'static>, AppError> {
    let expires = OffsetDateTime::from_unix_timestamp(issued.claims.exp)
        .map_err(|e| AppError::internal("cookie expiry", e))?;

    Ok(Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .expires(expires)
        .build())
}

pub(crate) fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
