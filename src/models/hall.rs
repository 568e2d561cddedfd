use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::seat::SeatCategory;

/// A venue with fixed per-category seat counts and per-category prices.
/// Prices are minor units (cents).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Hall {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub regular_capacity: i32,
    pub vip_capacity: i32,
    pub premium_capacity: i32,
    pub regular_price: i64,
    pub vip_price: i64,
    pub premium_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hall {
    pub fn price_for(&self, category: SeatCategory) -> i64 {
        match category {
            SeatCategory::Regular => self.regular_price,
            SeatCategory::Vip => self.vip_price,
            SeatCategory::Premium => self.premium_price,
        }
    }
}
