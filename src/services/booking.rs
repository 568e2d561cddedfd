//! The booking transaction and the ticket lifecycle.
//!
//! Booking is immediate-or-reject: there is no hold phase and no retry.
//! The availability pre-check gives a precise error message, but the actual
//! race protection is the `UNIQUE (show_id, seat_id)` constraint on
//! `seat_claims` hit inside the same transaction as the ticket insert; a
//! losing concurrent writer rolls back with a Conflict, never a double
//! booking and never a partial ticket.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeSet;

use crate::error::{is_unique_violation, ApiError};
use crate::models::{Hall, Seat, SeatCategory, Show, ShowStatus, Ticket, TicketStatus};

const SEAT_CLAIMS_UNIQUE: &str = "seat_claims_show_id_seat_id_key";

#[derive(Debug, Serialize)]
pub struct BookedSeat {
    pub id: i64,
    pub seat_no: String,
    pub category: String,
}

/// A ticket resolved for display: owner, show, hall and seats by name.
#[derive(Debug, Serialize)]
pub struct TicketDetails {
    pub id: i64,
    pub owner_id: i64,
    pub show_id: i64,
    pub show_name: String,
    pub hall_id: i64,
    pub hall_name: String,
    pub seats: Vec<BookedSeat>,
    pub total_price: i64,
    pub status: String,
    pub purchased_at: DateTime<Utc>,
}

/// Book `seat_ids` for `show_id` on behalf of `owner_id`.
///
/// All reads and both writes happen in one transaction; any failure leaves
/// no persisted ticket and no claims.
pub async fn book(
    pool: &PgPool,
    owner_id: i64,
    show_id: i64,
    seat_ids: &[i64],
) -> Result<TicketDetails, ApiError> {
    let seat_ids = dedupe(seat_ids);
    if seat_ids.is_empty() {
        return Err(ApiError::Validation(
            "At least one seat must be requested".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // 1. Resolve the show and make sure it can still be booked.
    let show = sqlx::query_as::<_, Show>(
        "SELECT id, hall_id, name, starts_at, duration_minutes, description, status,
                created_at, updated_at
         FROM shows WHERE id = $1",
    )
    .bind(show_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("Show not found".to_string()))?;

    if ShowStatus::parse(&show.status) != Some(ShowStatus::Scheduled) {
        return Err(ApiError::Conflict(
            "Show is not open for booking".to_string(),
        ));
    }

    // 2. Resolve the show's hall; a missing hall is a data fault, not a bad
    //    request.
    let hall = sqlx::query_as::<_, Hall>(
        "SELECT id, name, location, regular_capacity, vip_capacity, premium_capacity,
                regular_price, vip_price, premium_price, created_at, updated_at
         FROM halls WHERE id = $1",
    )
    .bind(show.hall_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        ApiError::Integrity(format!(
            "show {} references missing hall {}",
            show.id, show.hall_id
        ))
    })?;

    // 3. Resolve every requested seat.
    let seats = sqlx::query_as::<_, Seat>(
        "SELECT id, hall_id, seat_no, category, is_available
         FROM seats WHERE id = ANY($1) ORDER BY id",
    )
    .bind(&seat_ids)
    .fetch_all(&mut *tx)
    .await?;

    if seats.len() != seat_ids.len() {
        return Err(ApiError::NotFound(
            "One or more requested seats do not exist".to_string(),
        ));
    }
    for seat in &seats {
        if seat.hall_id != hall.id {
            return Err(ApiError::Validation(format!(
                "Seat {} does not belong to the show's hall",
                seat.seat_no
            )));
        }
        if !seat.is_available {
            return Err(ApiError::Conflict(format!(
                "Seat {} is not available",
                seat.seat_no
            )));
        }
    }

    // 4. Pre-check existing claims for a precise error; the unique
    //    constraint below is what makes this race-free.
    let taken: Vec<String> = sqlx::query_scalar(
        "SELECT s.seat_no
         FROM seat_claims c
         JOIN seats s ON s.id = c.seat_id
         WHERE c.show_id = $1 AND c.seat_id = ANY($2)
         ORDER BY s.seat_no",
    )
    .bind(show_id)
    .bind(&seat_ids)
    .fetch_all(&mut *tx)
    .await?;
    if !taken.is_empty() {
        return Err(ApiError::Conflict(format!(
            "Seat(s) already booked for this show: {}",
            taken.join(", ")
        )));
    }

    // 5. Price is fixed at booking time from the hall's category table.
    let total_price = total_price(&hall, &seats)?;
    let seat_labels: Vec<String> = seats.iter().map(|s| s.seat_no.clone()).collect();

    // 6. Persist the ticket and its claims.
    let (ticket_id, purchased_at): (i64, DateTime<Utc>) = sqlx::query_as(
        "INSERT INTO tickets (owner_id, show_id, hall_id, total_price, status, seat_labels)
         VALUES ($1, $2, $3, $4, 'booked', $5)
         RETURNING id, purchased_at",
    )
    .bind(owner_id)
    .bind(show.id)
    .bind(hall.id)
    .bind(total_price)
    .bind(&seat_labels)
    .fetch_one(&mut *tx)
    .await?;

    let claim_result = sqlx::query(
        "INSERT INTO seat_claims (ticket_id, show_id, seat_id)
         SELECT $1, $2, t.seat_id FROM UNNEST($3::BIGINT[]) AS t(seat_id)",
    )
    .bind(ticket_id)
    .bind(show.id)
    .bind(&seat_ids)
    .execute(&mut *tx)
    .await;

    if let Err(e) = claim_result {
        // a concurrent booking won the race for at least one seat;
        // rolling back drops the ticket row as well
        if is_unique_violation(&e, SEAT_CLAIMS_UNIQUE) {
            return Err(ApiError::Conflict(
                "One or more seats were just booked by another request".to_string(),
            ));
        }
        return Err(e.into());
    }

    tx.commit().await?;

    tracing::info!(
        "ticket {} booked: user {} show {} seats [{}] total {}",
        ticket_id,
        owner_id,
        show.id,
        seat_labels.join(", "),
        total_price
    );

    Ok(TicketDetails {
        id: ticket_id,
        owner_id,
        show_id: show.id,
        show_name: show.name,
        hall_id: hall.id,
        hall_name: hall.name,
        seats: seats
            .into_iter()
            .map(|s| BookedSeat {
                id: s.id,
                seat_no: s.seat_no,
                category: s.category,
            })
            .collect(),
        total_price,
        status: TicketStatus::Booked.as_str().to_string(),
        purchased_at,
    })
}

/// Move a ticket through its lifecycle. Cancellation releases the ticket's
/// seat claims in the same transaction, making the seats bookable again for
/// the same show.
pub async fn update_ticket_status(
    pool: &PgPool,
    ticket_id: i64,
    next: TicketStatus,
) -> Result<Ticket, ApiError> {
    let mut tx = pool.begin().await?;

    let current_status: Option<String> =
        sqlx::query_scalar("SELECT status FROM tickets WHERE id = $1 FOR UPDATE")
            .bind(ticket_id)
            .fetch_optional(&mut *tx)
            .await?;
    let current_status =
        current_status.ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    let current = TicketStatus::parse(&current_status).ok_or_else(|| {
        ApiError::Integrity(format!(
            "ticket {} has unknown status '{}'",
            ticket_id, current_status
        ))
    })?;

    if !current.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "Cannot move ticket from '{}' to '{}'",
            current.as_str(),
            next.as_str()
        )));
    }

    let ticket = sqlx::query_as::<_, Ticket>(
        "UPDATE tickets SET status = $2 WHERE id = $1
         RETURNING id, owner_id, show_id, hall_id, total_price, status, seat_labels, purchased_at",
    )
    .bind(ticket_id)
    .bind(next.as_str())
    .fetch_one(&mut *tx)
    .await?;

    // claims exist only while the ticket holds its seats
    if !next.holds_seats() {
        sqlx::query("DELETE FROM seat_claims WHERE ticket_id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "ticket {} status: {} -> {}",
        ticket_id,
        current.as_str(),
        next.as_str()
    );
    Ok(ticket)
}

/// Σ over requested seats of the hall's price for the seat's category.
pub fn total_price(hall: &Hall, seats: &[Seat]) -> Result<i64, ApiError> {
    let mut total: i64 = 0;
    for seat in seats {
        let category = SeatCategory::parse(&seat.category).ok_or_else(|| {
            ApiError::Integrity(format!(
                "seat {} has unknown category '{}'",
                seat.id, seat.category
            ))
        })?;
        total += hall.price_for(category);
    }
    Ok(total)
}

fn dedupe(seat_ids: &[i64]) -> Vec<i64> {
    seat_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hall(regular_price: i64, vip_price: i64, premium_price: i64) -> Hall {
        Hall {
            id: 1,
            name: "Hall A".to_string(),
            location: "Downtown".to_string(),
            regular_capacity: 2,
            vip_capacity: 1,
            premium_capacity: 0,
            regular_price,
            vip_price,
            premium_price,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn seat(id: i64, seat_no: &str, category: &str) -> Seat {
        Seat {
            id,
            hall_id: 1,
            seat_no: seat_no.to_string(),
            category: category.to_string(),
            is_available: true,
        }
    }

    #[test]
    fn price_sums_per_category() {
        // the scenario hall: (regular=2, vip=1) at prices (10, 50)
        let hall = hall(10, 50, 0);
        let seats = vec![seat(1, "R1", "regular"), seat(3, "V1", "vip")];
        assert_eq!(total_price(&hall, &seats).unwrap(), 60);
    }

    #[test]
    fn price_of_no_seats_is_zero() {
        assert_eq!(total_price(&hall(10, 50, 80), &[]).unwrap(), 0);
    }

    #[test]
    fn unknown_category_is_an_integrity_fault() {
        let seats = vec![seat(1, "X1", "balcony")];
        assert!(matches!(
            total_price(&hall(10, 50, 80), &seats),
            Err(ApiError::Integrity(_))
        ));
    }

    #[test]
    fn duplicate_seat_ids_collapse() {
        assert_eq!(dedupe(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(dedupe(&[]).is_empty());
    }
}
