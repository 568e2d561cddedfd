use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::{Show, ShowStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", post(create_show))
        .route("/shows", get(get_all_shows))
        .route("/shows/{id}", get(get_show_by_id))
        .route("/shows/{id}", put(update_show))
        .route("/shows/{id}", delete(delete_show))
}

const SHOW_COLUMNS: &str = "id, hall_id, name, starts_at, duration_minutes, description, status,
    created_at, updated_at";

#[derive(Debug, Deserialize, Validate)]
struct CreateShowRequest {
    hall_id: i64,
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    starts_at: DateTime<Utc>,
    #[validate(range(min = 1, message = "duration must be at least one minute"))]
    duration_minutes: i32,
    #[serde(default)]
    description: String,
}

async fn create_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateShowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let hall_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM halls WHERE id = $1)")
        .bind(req.hall_id)
        .fetch_one(&state.db.pool)
        .await?;
    if !hall_exists {
        return Err(ApiError::NotFound("Hall not found".to_string()));
    }

    let show = sqlx::query_as::<_, Show>(&format!(
        "INSERT INTO shows (hall_id, name, starts_at, duration_minutes, description)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {SHOW_COLUMNS}"
    ))
    .bind(req.hall_id)
    .bind(&req.name)
    .bind(req.starts_at)
    .bind(req.duration_minutes)
    .bind(&req.description)
    .fetch_one(&state.db.pool)
    .await?;

    state.cache.invalidate_shows().await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Show created successfully", "show": show })),
    ))
}

async fn get_all_shows(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let shows = state.cache.get_shows().await?;
    Ok((StatusCode::OK, Json(shows)))
}

async fn get_show_by_id(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let show = sqlx::query_as::<_, Show>(&format!(
        "SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1"
    ))
    .bind(show_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Show not found".to_string()))?;

    Ok((StatusCode::OK, Json(show)))
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateShowRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "duration must be at least one minute"))]
    duration_minutes: Option<i32>,
    description: Option<String>,
    status: Option<String>,
}

async fn update_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(show_id): Path<i64>,
    Json(req): Json<UpdateShowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    if let Some(status) = &req.status {
        if ShowStatus::parse(status).is_none() {
            return Err(ApiError::Validation(format!(
                "Unknown show status '{}'",
                status
            )));
        }
    }

    let show = sqlx::query_as::<_, Show>(&format!(
        "UPDATE shows
         SET name = COALESCE($2, name),
             starts_at = COALESCE($3, starts_at),
             duration_minutes = COALESCE($4, duration_minutes),
             description = COALESCE($5, description),
             status = COALESCE($6, status),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {SHOW_COLUMNS}"
    ))
    .bind(show_id)
    .bind(&req.name)
    .bind(req.starts_at)
    .bind(req.duration_minutes)
    .bind(&req.description)
    .bind(&req.status)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Show not found".to_string()))?;

    state.cache.invalidate_shows().await;

    Ok((StatusCode::OK, Json(json!({ "show": show }))))
}

// Any ticket referencing the show blocks the delete, same policy as halls.
async fn delete_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(show_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let has_tickets: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tickets WHERE show_id = $1)")
            .bind(show_id)
            .fetch_one(&state.db.pool)
            .await?;
    if has_tickets {
        return Err(ApiError::Conflict(
            "Show has tickets and cannot be deleted".to_string(),
        ));
    }

    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM shows WHERE id = $1 RETURNING id")
        .bind(show_id)
        .fetch_optional(&state.db.pool)
        .await?;
    if deleted.is_none() {
        return Err(ApiError::NotFound("Show not found".to_string()));
    }

    state.cache.invalidate_shows().await;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Show deleted successfully" })),
    ))
}
