use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::{Hall, Show};
use crate::services::inventory::{self, Capacities};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/halls", post(create_hall))
        .route("/halls", get(get_all_halls))
        .route("/halls/{id}", get(get_hall_by_id))
        .route("/halls/{id}/shows", get(get_hall_shows))
        .route("/halls/{id}", put(update_hall))
        .route("/halls/{id}", delete(delete_hall))
}

const HALL_COLUMNS: &str = "id, name, location, regular_capacity, vip_capacity, premium_capacity,
    regular_price, vip_price, premium_price, created_at, updated_at";

// Each price must be positive while its category is actually sold.
fn check_prices(caps: &Capacities, regular: i64, vip: i64, premium: i64) -> Result<(), ApiError> {
    for (label, capacity, price) in [
        ("regular", caps.regular, regular),
        ("vip", caps.vip, vip),
        ("premium", caps.premium, premium),
    ] {
        if capacity > 0 && price <= 0 {
            return Err(ApiError::Validation(format!(
                "{} seats exist but the {} price is not positive",
                label, label
            )));
        }
    }
    Ok(())
}

/* ---------- CREATE ---------- */

#[derive(Debug, Deserialize, Validate)]
struct CreateHallRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[validate(length(min = 1, message = "location must not be empty"))]
    location: String,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    regular_capacity: i32,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    vip_capacity: i32,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    premium_capacity: i32,
    #[validate(range(min = 0, message = "price must not be negative"))]
    regular_price: i64,
    #[validate(range(min = 0, message = "price must not be negative"))]
    vip_price: i64,
    #[validate(range(min = 0, message = "price must not be negative"))]
    premium_price: i64,
}

// Creating a hall also generates its full seat inventory, in the same
// transaction: the hall is never observable without its seats.
async fn create_hall(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateHallRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let caps = Capacities {
        regular: req.regular_capacity,
        vip: req.vip_capacity,
        premium: req.premium_capacity,
    };
    caps.validate()?;
    check_prices(&caps, req.regular_price, req.vip_price, req.premium_price)?;

    let mut tx = state.db.pool.begin().await?;

    let hall = sqlx::query_as::<_, Hall>(&format!(
        "INSERT INTO halls (name, location, regular_capacity, vip_capacity, premium_capacity,
                            regular_price, vip_price, premium_price)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {HALL_COLUMNS}"
    ))
    .bind(&req.name)
    .bind(&req.location)
    .bind(req.regular_capacity)
    .bind(req.vip_capacity)
    .bind(req.premium_capacity)
    .bind(req.regular_price)
    .bind(req.vip_price)
    .bind(req.premium_price)
    .fetch_one(&mut *tx)
    .await?;

    let seats_created = inventory::regenerate_in_tx(&mut tx, hall.id, &caps).await?;
    tx.commit().await?;

    tracing::info!("hall {} created with {} seats", hall.id, seats_created);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Hall and seats created successfully",
            "hall": hall,
            "seats_created": seats_created,
        })),
    ))
}

/* ---------- READ ---------- */

async fn get_all_halls(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let halls = sqlx::query_as::<_, Hall>(&format!(
        "SELECT {HALL_COLUMNS} FROM halls ORDER BY id"
    ))
    .fetch_all(&state.db.pool)
    .await?;

    Ok((StatusCode::OK, Json(halls)))
}

async fn get_hall_by_id(
    State(state): State<Arc<AppState>>,
    Path(hall_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let hall = sqlx::query_as::<_, Hall>(&format!(
        "SELECT {HALL_COLUMNS} FROM halls WHERE id = $1"
    ))
    .bind(hall_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Hall not found".to_string()))?;

    Ok((StatusCode::OK, Json(hall)))
}

async fn get_hall_shows(
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

    let shows = sqlx::query_as::<_, Show>(
        "SELECT id, hall_id, name, starts_at, duration_minutes, description, status,
                created_at, updated_at
         FROM shows
         WHERE hall_id = $1
         ORDER BY starts_at",
    )
    .bind(hall_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok((StatusCode::OK, Json(json!({ "shows": shows }))))
}

/* ---------- UPDATE ---------- */

#[derive(Debug, Deserialize, Validate)]
struct UpdateHallRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: Option<String>,
    #[validate(length(min = 1, message = "location must not be empty"))]
    location: Option<String>,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    regular_capacity: Option<i32>,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    vip_capacity: Option<i32>,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    premium_capacity: Option<i32>,
    #[validate(range(min = 0, message = "price must not be negative"))]
    regular_price: Option<i64>,
    #[validate(range(min = 0, message = "price must not be negative"))]
    vip_price: Option<i64>,
    #[validate(range(min = 0, message = "price must not be negative"))]
    premium_price: Option<i64>,
}

impl UpdateHallRequest {
    fn touches_capacity(&self) -> bool {
        self.regular_capacity.is_some()
            || self.vip_capacity.is_some()
            || self.premium_capacity.is_some()
    }
}

// A capacity patch regenerates the hall's whole inventory from the merged
// (old + patch) capacities. The hall row update, the seat delete and the
// seat re-insert share one transaction, so a concurrent seat-list read sees
// either the old inventory or the new one.
async fn update_hall(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(hall_id): Path<i64>,
    Json(req): Json<UpdateHallRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let hall = sqlx::query_as::<_, Hall>(&format!(
        "SELECT {HALL_COLUMNS} FROM halls WHERE id = $1"
    ))
    .bind(hall_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Hall not found".to_string()))?;

    // unspecified fields retain their prior values
    let caps = Capacities {
        regular: req.regular_capacity.unwrap_or(hall.regular_capacity),
        vip: req.vip_capacity.unwrap_or(hall.vip_capacity),
        premium: req.premium_capacity.unwrap_or(hall.premium_capacity),
    };
    let regular_price = req.regular_price.unwrap_or(hall.regular_price);
    let vip_price = req.vip_price.unwrap_or(hall.vip_price);
    let premium_price = req.premium_price.unwrap_or(hall.premium_price);
    caps.validate()?;
    check_prices(&caps, regular_price, vip_price, premium_price)?;

    let regenerate = req.touches_capacity();
    if regenerate && inventory::hall_has_active_tickets(&state.db.pool, hall_id).await? {
        return Err(ApiError::Conflict(
            "Hall has active tickets; seat capacities cannot be changed".to_string(),
        ));
    }

    let mut tx = state.db.pool.begin().await?;

    let updated = sqlx::query_as::<_, Hall>(&format!(
        "UPDATE halls
         SET name = $2, location = $3,
             regular_capacity = $4, vip_capacity = $5, premium_capacity = $6,
             regular_price = $7, vip_price = $8, premium_price = $9,
             updated_at = NOW()
         WHERE id = $1
         RETURNING {HALL_COLUMNS}"
    ))
    .bind(hall_id)
    .bind(req.name.as_deref().unwrap_or(&hall.name))
    .bind(req.location.as_deref().unwrap_or(&hall.location))
    .bind(caps.regular)
    .bind(caps.vip)
    .bind(caps.premium)
    .bind(regular_price)
    .bind(vip_price)
    .bind(premium_price)
    .fetch_one(&mut *tx)
    .await?;

    if regenerate {
        let count = inventory::regenerate_in_tx(&mut tx, hall_id, &caps).await?;
        tracing::info!("hall {} inventory regenerated: {} seats", hall_id, count);
    }

    tx.commit().await?;

    if regenerate {
        state.cache.invalidate_hall_seats(hall_id).await;
    }

    Ok((StatusCode::OK, Json(json!({ "hall": updated }))))
}

/* ---------- DELETE ---------- */

// Deleting a hall cascades to its seats and shows. Any ticket referencing
// the hall blocks the delete: booking history is never silently orphaned.
async fn delete_hall(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(hall_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let has_tickets: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tickets WHERE hall_id = $1)")
            .bind(hall_id)
            .fetch_one(&state.db.pool)
            .await?;
    if has_tickets {
        return Err(ApiError::Conflict(
            "Hall has tickets and cannot be deleted".to_string(),
        ));
    }

    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM halls WHERE id = $1 RETURNING id")
        .bind(hall_id)
        .fetch_optional(&state.db.pool)
        .await?;
    if deleted.is_none() {
        return Err(ApiError::NotFound("Hall not found".to_string()));
    }

    state.cache.invalidate_hall_seats(hall_id).await;
    state.cache.invalidate_shows().await;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Hall deleted successfully" })),
    ))
}
