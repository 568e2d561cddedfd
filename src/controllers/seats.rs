use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::services::{availability, inventory};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats/hall/{hall_id}", get(get_hall_seats))
        .route("/seats/hall/{hall_id}/generate", post(generate_seats))
        .route("/seats/{seat_id}", get(get_seat))
        .route("/seats/{seat_id}/status/{show_id}", get(get_seat_status))
        .route(
            "/seats/hall/{hall_id}/status/{show_id}",
            get(get_hall_seat_statuses),
        )
}

/* ---------- INVENTORY ---------- */

// Static inventory only; per-show booking state comes from the status routes.
async fn get_hall_seats(
    State(state): State<Arc<AppState>>,
    Path(hall_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM halls WHERE id = $1)")
        .bind(hall_id)
        .fetch_one(&state.db.pool)
        .await?;
    if !exists {
        return Err(ApiError::NotFound("Hall not found".to_string()));
    }

    let seats = state.cache.get_hall_seats(hall_id).await?;
    Ok((StatusCode::OK, Json(seats)))
}

#[derive(Debug, Deserialize)]
struct GenerateSeatsQuery {
    regenerate: Option<bool>,
}

// POST /api/seats/hall/{hall_id}/generate[?regenerate=true]
//
// Without the flag this fails when seats already exist; with it the whole
// inventory is dropped and rebuilt from the hall's stored capacities, which
// is refused while any active ticket references the hall.
async fn generate_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(hall_id): Path<i64>,
    Query(params): Query<GenerateSeatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let regenerate = params.regenerate.unwrap_or(false);

    let count = if regenerate {
        if inventory::hall_has_active_tickets(&state.db.pool, hall_id).await? {
            return Err(ApiError::Conflict(
                "Hall has active tickets; inventory cannot be regenerated".to_string(),
            ));
        }

        let mut tx = state.db.pool.begin().await?;
        let hall = sqlx::query_as::<_, crate::models::Hall>(
            "SELECT id, name, location, regular_capacity, vip_capacity, premium_capacity,
                    regular_price, vip_price, premium_price, created_at, updated_at
             FROM halls WHERE id = $1",
        )
        .bind(hall_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hall not found".to_string()))?;

        let caps = inventory::Capacities::of_hall(&hall);
        let count = inventory::regenerate_in_tx(&mut tx, hall_id, &caps).await?;
        tx.commit().await?;
        count
    } else {
        inventory::generate_for_hall(&state.db.pool, hall_id).await?
    };

    state.cache.invalidate_hall_seats(hall_id).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Seats created successfully",
            "count": count,
        })),
    ))
}

/* ---------- AVAILABILITY ---------- */

async fn get_seat(
    State(state): State<Arc<AppState>>,
    Path(seat_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let seat = availability::get_seat(&state.db.pool, seat_id).await?;
    Ok((StatusCode::OK, Json(seat)))
}

async fn get_seat_status(
    State(state): State<Arc<AppState>>,
    Path((seat_id, show_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let status = availability::seat_status(&state.db.pool, seat_id, show_id).await?;
    Ok((StatusCode::OK, Json(status)))
}

async fn get_hall_seat_statuses(
    State(state): State<Arc<AppState>>,
    Path((hall_id, show_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let statuses = availability::hall_seat_statuses(&state.db.pool, hall_id, show_id).await?;
    Ok((StatusCode::OK, Json(statuses)))
}
