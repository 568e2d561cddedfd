use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The three price tiers a hall sells. Stored as lowercase text in Postgres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    Regular,
    Vip,
    Premium,
}

impl SeatCategory {
    pub const ALL: [SeatCategory; 3] =
        [SeatCategory::Regular, SeatCategory::Vip, SeatCategory::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatCategory::Regular => "regular",
            SeatCategory::Vip => "vip",
            SeatCategory::Premium => "premium",
        }
    }

    /// Prefix used in seat display numbers: R1..Rn, V1..Vn, P1..Pn.
    pub fn prefix(&self) -> char {
        match self {
            SeatCategory::Regular => 'R',
            SeatCategory::Vip => 'V',
            SeatCategory::Premium => 'P',
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(SeatCategory::Regular),
            "vip" => Some(SeatCategory::Vip),
            "premium" => Some(SeatCategory::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub hall_id: i64,
    pub seat_no: String,
    pub category: String,
    /// Administrative enable/disable flag, independent of booking state.
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_text() {
        for category in SeatCategory::ALL {
            assert_eq!(SeatCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(SeatCategory::parse("VIP"), None);
        assert_eq!(SeatCategory::parse(""), None);
    }

    #[test]
    fn prefixes_are_distinct() {
        assert_eq!(SeatCategory::Regular.prefix(), 'R');
        assert_eq!(SeatCategory::Vip.prefix(), 'V');
        assert_eq!(SeatCategory::Premium.prefix(), 'P');
    }
}
