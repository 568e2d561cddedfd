//! Per-show seat availability.
//!
//! A seat is bookable for a show when its administrative flag is on and no
//! booked/confirmed ticket claims it for that show. Claims live in
//! `seat_claims`, which holds rows only for active tickets, so a bare
//! existence check is the whole booking test.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;
use crate::models::Seat;

#[derive(Debug, Serialize)]
pub struct SeatStatus {
    pub seat: Seat,
    pub is_booked: bool,
    /// Static flag AND not booked for the show.
    pub is_available: bool,
}

#[derive(Debug, FromRow)]
struct SeatStatusRow {
    id: i64,
    seat_no: String,
    category: String,
    is_available: bool,
    is_booked: bool,
}

#[derive(Debug, Serialize)]
pub struct SeatWithStatus {
    pub id: i64,
    pub seat_no: String,
    pub category: String,
    pub is_booked: bool,
    pub is_available: bool,
}

/// A single seat record, without any per-show state.
pub async fn get_seat(pool: &PgPool, seat_id: i64) -> Result<Seat, ApiError> {
    sqlx::query_as::<_, Seat>(
        "SELECT id, hall_id, seat_no, category, is_available FROM seats WHERE id = $1",
    )
    .bind(seat_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Seat not found".to_string()))
}

/// Status of a single seat for a single show.
pub async fn seat_status(pool: &PgPool, seat_id: i64, show_id: i64) -> Result<SeatStatus, ApiError> {
    let seat = get_seat(pool, seat_id).await?;

    ensure_show_exists(pool, show_id).await?;

    let is_booked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM seat_claims WHERE seat_id = $1 AND show_id = $2)",
    )
    .bind(seat_id)
    .bind(show_id)
    .fetch_one(pool)
    .await?;

    let is_available = seat.is_available && !is_booked;
    Ok(SeatStatus {
        seat,
        is_booked,
        is_available,
    })
}

/// Status of every seat in a hall for one show, resolved in a single query.
/// The seat map needs this on every render, so round-trips must not scale
/// with seat count.
pub async fn hall_seat_statuses(
    pool: &PgPool,
    hall_id: i64,
    show_id: i64,
) -> Result<Vec<SeatWithStatus>, ApiError> {
    let hall_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM halls WHERE id = $1)")
        .bind(hall_id)
        .fetch_one(pool)
        .await?;
    if !hall_exists {
        return Err(ApiError::NotFound("Hall not found".to_string()));
    }

    let show_hall: Option<i64> = sqlx::query_scalar("SELECT hall_id FROM shows WHERE id = $1")
        .bind(show_id)
        .fetch_optional(pool)
        .await?;
    match show_hall {
        None => return Err(ApiError::NotFound("Show not found".to_string())),
        Some(h) if h != hall_id => {
            return Err(ApiError::Validation(
                "Show is not scheduled in this hall".to_string(),
            ))
        }
        Some(_) => {}
    }

    let rows = sqlx::query_as::<_, SeatStatusRow>(
        "SELECT s.id, s.seat_no, s.category, s.is_available,
                EXISTS(SELECT 1 FROM seat_claims c
                       WHERE c.seat_id = s.id AND c.show_id = $2) AS is_booked
         FROM seats s
         WHERE s.hall_id = $1
         ORDER BY s.id",
    )
    .bind(hall_id)
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| SeatWithStatus {
            id: r.id,
            seat_no: r.seat_no,
            category: r.category,
            is_booked: r.is_booked,
            is_available: r.is_available && !r.is_booked,
        })
        .collect())
}

async fn ensure_show_exists(pool: &PgPool, show_id: i64) -> Result<(), ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shows WHERE id = $1)")
        .bind(show_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(ApiError::NotFound("Show not found".to_string()));
    }
    Ok(())
}
