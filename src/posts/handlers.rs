use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppResult,
    posts::dto::{PostCreate, PostResponse, PostUpdate},
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts", post(create_post))
        .route("/api/posts/:id", get(get_post).put(update_post))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PostResponse>> {
    Ok(Json(state.posts.get_by_id(id).await?.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<PostCreate>,
) -> AppResult<(StatusCode, Json<PostResponse>)> {
    let post = state.posts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostUpdate>,
) -> AppResult<Json<PostResponse>> {
    Ok(Json(state.posts.update(id, payload).await?.into()))
}
