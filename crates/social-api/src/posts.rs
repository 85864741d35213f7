use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::Response,
};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use social_types::api::{Identity, PostForm, ProfileLookupForm};
use social_types::models::{FeedEntry, Post};

use crate::auth::AppState;
use crate::error::AppError;
use crate::{blocking, found};

/// Bytes that cannot appear raw inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Front page: the latest posts from everyone.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<FeedEntry>>, AppError> {
    let posts = blocking(&state, |logic| logic.latest_posts()).await?;
    Ok(Json(posts))
}

/// Front-page search box: jump to a profile by name.
pub async fn find_profile(Form(form): Form<ProfileLookupForm>) -> Response {
    found(profile_location(&form.username))
}

fn profile_location(username: &str) -> String {
    format!("/profile/{}", utf8_percent_encode(username, PATH_SEGMENT))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    blocking(&state, move |logic| logic.create_post(&identity, &form.content)).await?;
    Ok(found("/feed"))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    blocking(&state, move |logic| logic.delete_post(&identity, post_id)).await?;
    Ok(found("/feed"))
}

/// The caller's own posts, newest first.
pub async fn feed(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Post>>, AppError> {
    let posts = blocking(&state, move |logic| logic.feed(&identity)).await?;
    Ok(Json(posts))
}
