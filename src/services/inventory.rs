//! Seat inventory generation.
//!
//! A hall's seats are derived entirely from its per-category capacities:
//! `R1..Rn` regular, `V1..Vn` VIP, `P1..Pn` premium, numbered per category.
//! Seats are only ever written as a whole batch inside a transaction, so a
//! concurrent reader sees either the old inventory or the new one, never a
//! partial or empty set.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{is_foreign_key_violation, ApiError};
use crate::models::{Hall, SeatCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    pub regular: i32,
    pub vip: i32,
    pub premium: i32,
}

impl Capacities {
    pub fn of_hall(hall: &Hall) -> Self {
        Capacities {
            regular: hall.regular_capacity,
            vip: hall.vip_capacity,
            premium: hall.premium_capacity,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.regular < 0 || self.vip < 0 || self.premium < 0 {
            return Err(ApiError::Validation(
                "Seat capacities must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn total(&self) -> i64 {
        self.regular as i64 + self.vip as i64 + self.premium as i64
    }

    fn get(&self, category: SeatCategory) -> i32 {
        match category {
            SeatCategory::Regular => self.regular,
            SeatCategory::Vip => self.vip,
            SeatCategory::Premium => self.premium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSeat {
    pub seat_no: String,
    pub category: SeatCategory,
}

/// Expand capacities into the full seat list for a hall.
/// Numbering restarts at 1 for each category.
pub fn seat_plan(capacities: &Capacities) -> Vec<PlannedSeat> {
    let mut plan = Vec::with_capacity(capacities.total().max(0) as usize);
    for category in SeatCategory::ALL {
        for n in 1..=capacities.get(category).max(0) {
            plan.push(PlannedSeat {
                seat_no: format!("{}{}", category.prefix(), n),
                category,
            });
        }
    }
    plan
}

/// First-time generation for a hall that has no seats yet.
pub async fn generate_for_hall(pool: &PgPool, hall_id: i64) -> Result<u64, ApiError> {
    let mut tx = pool.begin().await?;

    let hall = fetch_hall(&mut tx, hall_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hall not found".to_string()))?;

    let existing: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM seats WHERE hall_id = $1)")
            .bind(hall_id)
            .fetch_one(&mut *tx)
            .await?;
    if existing {
        return Err(ApiError::Conflict(
            "Seats already exist for this hall".to_string(),
        ));
    }

    let plan = seat_plan(&Capacities::of_hall(&hall));
    insert_plan(&mut tx, hall_id, &plan).await?;
    tx.commit().await?;

    tracing::info!("generated {} seats for hall {}", plan.len(), hall_id);
    Ok(plan.len() as u64)
}

const SEAT_CLAIMS_SEAT_FK: &str = "seat_claims_seat_id_fkey";

/// Destructive regeneration: drop the hall's entire inventory and rebuild it
/// from `capacities`, all within the supplied transaction. Callers check for
/// active tickets up front, but that check races against in-flight bookings;
/// a claim committed in the gap makes the delete fail on its foreign key,
/// which is reported as the same conflict rather than orphaning the ticket.
pub async fn regenerate_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    hall_id: i64,
    capacities: &Capacities,
) -> Result<u64, ApiError> {
    capacities.validate()?;

    let deleted = sqlx::query("DELETE FROM seats WHERE hall_id = $1")
        .bind(hall_id)
        .execute(&mut **tx)
        .await;
    if let Err(e) = deleted {
        if is_foreign_key_violation(&e, SEAT_CLAIMS_SEAT_FK) {
            return Err(ApiError::Conflict(
                "Hall has active tickets; inventory cannot be regenerated".to_string(),
            ));
        }
        return Err(e.into());
    }

    let plan = seat_plan(capacities);
    insert_plan(tx, hall_id, &plan).await?;
    Ok(plan.len() as u64)
}

/// True when any booked or confirmed ticket references the hall. Used to
/// refuse capacity edits and regeneration that would orphan live tickets.
pub async fn hall_has_active_tickets(pool: &PgPool, hall_id: i64) -> Result<bool, ApiError> {
    let active: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM tickets WHERE hall_id = $1 AND status IN ('booked', 'confirmed'))",
    )
    .bind(hall_id)
    .fetch_one(pool)
    .await?;
    Ok(active)
}

async fn fetch_hall(
    tx: &mut Transaction<'_, Postgres>,
    hall_id: i64,
) -> Result<Option<Hall>, sqlx::Error> {
    sqlx::query_as::<_, Hall>(
        "SELECT id, name, location, regular_capacity, vip_capacity, premium_capacity,
                regular_price, vip_price, premium_price, created_at, updated_at
         FROM halls WHERE id = $1",
    )
    .bind(hall_id)
    .fetch_optional(&mut **tx)
    .await
}

// One multi-row statement; the batch is all-or-nothing even before the
// enclosing transaction commits.
async fn insert_plan(
    tx: &mut Transaction<'_, Postgres>,
    hall_id: i64,
    plan: &[PlannedSeat],
) -> Result<(), sqlx::Error> {
    if plan.is_empty() {
        return Ok(());
    }

    let seat_nos: Vec<String> = plan.iter().map(|p| p.seat_no.clone()).collect();
    let categories: Vec<String> = plan
        .iter()
        .map(|p| p.category.as_str().to_string())
        .collect();

    sqlx::query(
        "INSERT INTO seats (hall_id, seat_no, category)
         SELECT $1, t.seat_no, t.category
         FROM UNNEST($2::TEXT[], $3::TEXT[]) AS t(seat_no, category)",
    )
    .bind(hall_id)
    .bind(&seat_nos)
    .bind(&categories)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plan_matches_capacities_per_category() {
        let plan = seat_plan(&Capacities {
            regular: 3,
            vip: 2,
            premium: 1,
        });
        assert_eq!(plan.len(), 6);

        let nos: Vec<&str> = plan.iter().map(|p| p.seat_no.as_str()).collect();
        assert_eq!(nos, vec!["R1", "R2", "R3", "V1", "V2", "P1"]);
    }

    #[test]
    fn numbering_restarts_per_category() {
        let plan = seat_plan(&Capacities {
            regular: 2,
            vip: 1,
            premium: 0,
        });
        let nos: Vec<&str> = plan.iter().map(|p| p.seat_no.as_str()).collect();
        // the example hall from the booking scenario: {R1, R2, V1}
        assert_eq!(nos, vec!["R1", "R2", "V1"]);
    }

    #[test]
    fn empty_hall_produces_no_seats() {
        assert!(seat_plan(&Capacities {
            regular: 0,
            vip: 0,
            premium: 0
        })
        .is_empty());
    }

    #[test]
    fn negative_capacity_fails_validation() {
        let caps = Capacities {
            regular: -1,
            vip: 0,
            premium: 0,
        };
        assert!(matches!(caps.validate(), Err(ApiError::Validation(_))));
        // seat_plan itself clamps; it never panics on bad input
        assert!(seat_plan(&caps).is_empty());
    }

    proptest! {
        #[test]
        fn plan_is_complete_and_uniquely_numbered(
            regular in 0..200i32,
            vip in 0..200i32,
            premium in 0..200i32,
        ) {
            let caps = Capacities { regular, vip, premium };
            let plan = seat_plan(&caps);

            prop_assert_eq!(plan.len() as i64, caps.total());

            for category in SeatCategory::ALL {
                let of_cat: Vec<&PlannedSeat> =
                    plan.iter().filter(|p| p.category == category).collect();
                prop_assert_eq!(of_cat.len() as i32, caps.get(category));
                for (i, seat) in of_cat.iter().enumerate() {
                    let expected = format!("{}{}", category.prefix(), i + 1);
                    prop_assert_eq!(&seat.seat_no, &expected);
                }
            }

            let mut nos: Vec<&String> = plan.iter().map(|p| &p.seat_no).collect();
            nos.sort();
            nos.dedup();
            prop_assert_eq!(nos.len(), plan.len());
        }
    }
}
