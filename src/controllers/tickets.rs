use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::TicketStatus;
use crate::services::booking;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tickets", post(book_tickets))
        .route("/tickets", get(get_all_tickets))
        .route("/tickets/mine", get(get_my_tickets))
        .route("/tickets/{id}/status", put(update_ticket_status))
}

/* ---------- BOOKING ---------- */

#[derive(Debug, Deserialize, Validate)]
struct BookTicketsRequest {
    show_id: i64,
    #[validate(length(min = 1, message = "at least one seat must be requested"))]
    seat_ids: Vec<i64>,
}

// POST /api/tickets. Immediate-or-reject: a Conflict means someone else
// holds at least one requested seat and nothing was persisted.
async fn book_tickets(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<BookTicketsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let ticket = booking::book(&state.db.pool, user.user_id, req.show_id, &req.seat_ids).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/* ---------- LISTING ---------- */

#[derive(Debug, FromRow, Serialize)]
struct TicketSummary {
    id: i64,
    owner_id: i64,
    show_id: i64,
    show_name: String,
    hall_id: i64,
    hall_name: String,
    seat_labels: Vec<String>,
    total_price: i64,
    status: String,
    purchased_at: DateTime<Utc>,
}

const TICKET_SUMMARY_QUERY: &str = "
    SELECT t.id, t.owner_id, t.show_id, sh.name AS show_name,
           t.hall_id, h.name AS hall_name,
           t.seat_labels, t.total_price, t.status, t.purchased_at
    FROM tickets t
    JOIN shows sh ON sh.id = t.show_id
    JOIN halls h ON h.id = t.hall_id";

async fn get_my_tickets(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let tickets = sqlx::query_as::<_, TicketSummary>(&format!(
        "{TICKET_SUMMARY_QUERY} WHERE t.owner_id = $1 ORDER BY t.purchased_at DESC"
    ))
    .bind(user.user_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok((StatusCode::OK, Json(tickets)))
}

async fn get_all_tickets(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let tickets = sqlx::query_as::<_, TicketSummary>(&format!(
        "{TICKET_SUMMARY_QUERY} ORDER BY t.purchased_at DESC"
    ))
    .fetch_all(&state.db.pool)
    .await?;

    Ok((StatusCode::OK, Json(json!({ "tickets": tickets }))))
}

/* ---------- LIFECYCLE ---------- */

#[derive(Debug, Deserialize)]
struct UpdateTicketStatusRequest {
    status: String,
}

async fn update_ticket_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(ticket_id): Path<i64>,
    Json(req): Json<UpdateTicketStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let next = TicketStatus::parse(&req.status).ok_or_else(|| {
        ApiError::Validation(format!("Unknown ticket status '{}'", req.status))
    })?;

    let ticket = booking::update_ticket_status(&state.db.pool, ticket_id, next).await?;
    Ok((StatusCode::OK, Json(json!({ "ticket": ticket }))))
}
