//! JSON API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::auth::{check_password, SessionVerifier};
use crate::content::{is_valid_slug, ArchiveYear, NewPost, Post, PostRepository, TagCount};
use crate::error::{BlogError, BlogResult};

pub async fn site_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "title": state.site.title,
        "description": state.site.description,
    }))
}

/// Run repository work on the blocking pool; storage and the stats lock are synchronous
async fn with_repo<T, F>(state: &AppState, work: F) -> BlogResult<T>
where
    F: FnOnce(&PostRepository) -> BlogResult<T> + Send + 'static,
    T: Send + 'static,
{
    let repo = state.repo.clone();
    tokio::task::spawn_blocking(move || work(&repo))
        .await
        .map_err(|e| BlogError::Io(std::io::Error::other(e)))?
}

pub async fn list_posts(State(state): State<AppState>) -> BlogResult<Json<Vec<Post>>> {
    Ok(Json(with_repo(&state, |repo| repo.list_posts()).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> BlogResult<Json<Post>> {
    Ok(Json(with_repo(&state, move |repo| repo.get_post(&slug)).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(draft): Json<NewPost>,
) -> BlogResult<impl IntoResponse> {
    let credential = jar.get(&state.auth.cookie_name).map(|c| c.value().to_string());
    let sessions = state.sessions.clone();
    let slug = with_repo(&state, move |repo| {
        repo.create_post(sessions.as_ref(), credential.as_deref(), draft)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created", "slug": slug })),
    ))
}

pub async fn get_views(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> BlogResult<impl IntoResponse> {
    if !is_valid_slug(&slug) {
        return Err(BlogError::InvalidSlug(slug));
    }
    let record = with_repo(&state, move |repo| Ok(repo.stats().get_record(&slug))).await?;

    Ok(Json(match record {
        Some(record) => json!({ "views": record.views, "lastViewed": record.last_viewed }),
        None => json!({ "views": 0, "lastViewed": null }),
    }))
}

pub async fn increment_views(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> BlogResult<impl IntoResponse> {
    if !is_valid_slug(&slug) {
        return Err(BlogError::InvalidSlug(slug));
    }
    let views = with_repo(&state, move |repo| Ok(repo.stats().increment_views(&slug))).await?;
    Ok(Json(json!({ "views": views })))
}

pub async fn archive(State(state): State<AppState>) -> BlogResult<Json<Vec<ArchiveYear>>> {
    Ok(Json(with_repo(&state, |repo| repo.archive()).await?))
}

pub async fn tags(State(state): State<AppState>) -> BlogResult<Json<Vec<TagCount>>> {
    Ok(Json(with_repo(&state, |repo| repo.tags()).await?))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> BlogResult<impl IntoResponse> {
    if !check_password(state.auth.admin_password.as_deref(), &request.password) {
        tracing::warn!("Rejected admin login attempt");
        return Err(BlogError::Unauthorized);
    }

    let token = state.sessions.issue()?;

    let cookie = Cookie::build((state.auth.cookie_name.clone(), token))
        .http_only(true)
        .secure(state.auth.secure_cookie)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::hours(state.sessions.session_hours()));

    tracing::info!("Admin logged in");
    Ok((jar.add(cookie), Json(json!({ "message": "Logged in" }))))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((state.auth.cookie_name.clone(), ""))
        .http_only(true)
        .secure(state.auth.secure_cookie)
        .same_site(SameSite::Strict)
        .path("/");

    (jar.remove(cookie), Json(json!({ "message": "Logged out" })))
}

pub async fn verify(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let authenticated = jar
        .get(&state.auth.cookie_name)
        .map(|c| state.sessions.verify(c.value()))
        .unwrap_or(false);

    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(json!({ "authenticated": authenticated })))
}
