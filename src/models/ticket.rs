use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A booking record binding a user, a show and a set of seats.
///
/// `seat_labels` is a denormalized display copy of the claimed seat numbers;
/// it survives cancellation, while the rows in `seat_claims` (which enforce
/// per-show seat disjointness) are deleted when the ticket is cancelled.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub owner_id: i64,
    pub show_id: i64,
    pub hall_id: i64,
    pub total_price: i64,
    pub status: String,
    pub seat_labels: Vec<String>,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Booked,
    Confirmed,
    Cancelled,
    Completed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Booked => "booked",
            TicketStatus::Confirmed => "confirmed",
            TicketStatus::Cancelled => "cancelled",
            TicketStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(TicketStatus::Booked),
            "confirmed" => Some(TicketStatus::Confirmed),
            "cancelled" => Some(TicketStatus::Cancelled),
            "completed" => Some(TicketStatus::Completed),
            _ => None,
        }
    }

    /// A ticket holds its seats while booked or confirmed.
    pub fn holds_seats(&self) -> bool {
        matches!(self, TicketStatus::Booked | TicketStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Booked, Confirmed)
                | (Booked, Cancelled)
                | (Booked, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_allow_no_transitions() {
        for next in [
            TicketStatus::Booked,
            TicketStatus::Confirmed,
            TicketStatus::Cancelled,
            TicketStatus::Completed,
        ] {
            assert!(!TicketStatus::Cancelled.can_transition_to(next));
            assert!(!TicketStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn only_active_statuses_hold_seats() {
        assert!(TicketStatus::Booked.holds_seats());
        assert!(TicketStatus::Confirmed.holds_seats());
        assert!(!TicketStatus::Cancelled.holds_seats());
        assert!(!TicketStatus::Completed.holds_seats());
    }

    #[test]
    fn booked_can_be_confirmed_or_cancelled() {
        assert!(TicketStatus::Booked.can_transition_to(TicketStatus::Confirmed));
        assert!(TicketStatus::Booked.can_transition_to(TicketStatus::Cancelled));
        assert!(!TicketStatus::Confirmed.can_transition_to(TicketStatus::Booked));
    }
}
