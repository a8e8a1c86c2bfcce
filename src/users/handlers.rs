use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{MyProfileResponse, UserCreate, UserResponse, UserUpdate, VerifyQuery},
        extractors::CallerEmail,
        services::is_valid_email,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/me", get(get_my_info).put(update_my_info))
        .route("/api/users/:id", get(get_user))
        .route("/api/users/:id/verify", get(verify_email))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Response> {
    state
        .users
        .verify_email(id, &query.certification_code)
        .await?;
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, state.config.frontend_url.clone())],
    )
        .into_response())
}

#[instrument(skip(state))]
pub async fn get_my_info(
    State(state): State<AppState>,
    CallerEmail(email): CallerEmail,
) -> AppResult<Json<MyProfileResponse>> {
    let user = state.users.get_by_email(&email).await?;
    let id = user.id.ok_or_else(|| anyhow::anyhow!("stored user without id"))?;
    let user = state.users.login(id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_my_info(
    State(state): State<AppState>,
    CallerEmail(email): CallerEmail,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<MyProfileResponse>> {
    let user = state.users.get_by_email(&email).await?;
    let id = user.id.ok_or_else(|| anyhow::anyhow!("stored user without id"))?;
    let user = state.users.update(id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
