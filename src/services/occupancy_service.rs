//! Bed lifecycle: assignment, pending release, rollover into history.
//!
//! The transition rules live in pure `plan_*` functions over [`BedOccupancy`];
//! [`OccupancyService`] loads the rows under lock, asks the plan, and writes the
//! outcome in one transaction.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{on_unique_violation, AppError, AppResult};
use crate::models::{Bed, BedAssignmentHistory, Customer};
use crate::services::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BedOccupancy {
    Empty,
    BoundOpen {
        customer_id: Uuid,
        assigned_date: NaiveDate,
    },
    BoundPendingRelease {
        customer_id: Uuid,
        assigned_date: NaiveDate,
        released_date: NaiveDate,
    },
}

impl BedOccupancy {
    pub fn of(bed: &Bed) -> Self {
        match (bed.customer_id, bed.assigned_date, bed.released_date) {
            (Some(customer_id), Some(assigned_date), None) => BedOccupancy::BoundOpen {
                customer_id,
                assigned_date,
            },
            (Some(customer_id), Some(assigned_date), Some(released_date)) => {
                BedOccupancy::BoundPendingRelease {
                    customer_id,
                    assigned_date,
                    released_date,
                }
            }
            _ => BedOccupancy::Empty,
        }
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        match self {
            BedOccupancy::Empty => None,
            BedOccupancy::BoundOpen { customer_id, .. }
            | BedOccupancy::BoundPendingRelease { customer_id, .. } => Some(*customer_id),
        }
    }
}

/// What the engine needs to know about a customer before binding them.
#[derive(Debug, Clone, Copy)]
pub struct CustomerStanding {
    pub active: bool,
    pub current_bed: Option<Uuid>,
}

/// A finished tenure, ready to be appended to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenure {
    pub customer_id: Uuid,
    pub assigned_date: NaiveDate,
    pub released_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePlan {
    /// Release date lies in the future; keep the binding and remember the date.
    Pending(BedOccupancy),
    /// Release date has arrived; move the binding into history.
    Rollover(Tenure),
}

pub fn plan_assign(
    current: BedOccupancy,
    customer_id: Uuid,
    customer: CustomerStanding,
    assigned_date: NaiveDate,
) -> AppResult<BedOccupancy> {
    if current != BedOccupancy::Empty {
        return Err(AppError::AlreadyAssigned);
    }
    if !customer.active {
        return Err(AppError::CustomerInactive);
    }
    if customer.current_bed.is_some() {
        return Err(AppError::CustomerDoubleBooked);
    }
    Ok(BedOccupancy::BoundOpen {
        customer_id,
        assigned_date,
    })
}

pub fn plan_release(
    current: BedOccupancy,
    released_date: NaiveDate,
    today: NaiveDate,
) -> AppResult<ReleasePlan> {
    let (customer_id, assigned_date) = match current {
        BedOccupancy::Empty => return Err(AppError::NotBound),
        BedOccupancy::BoundOpen {
            customer_id,
            assigned_date,
        }
        | BedOccupancy::BoundPendingRelease {
            customer_id,
            assigned_date,
            ..
        } => (customer_id, assigned_date),
    };

    if released_date < assigned_date {
        return Err(AppError::validation(
            "released_date",
            "released date must not precede the assigned date",
        ));
    }

    if released_date <= today {
        Ok(ReleasePlan::Rollover(Tenure {
            customer_id,
            assigned_date,
            released_date,
        }))
    } else {
        Ok(ReleasePlan::Pending(BedOccupancy::BoundPendingRelease {
            customer_id,
            assigned_date,
            released_date,
        }))
    }
}

pub fn plan_clear_release(current: BedOccupancy) -> AppResult<BedOccupancy> {
    match current {
        BedOccupancy::Empty => Err(AppError::NotBound),
        BedOccupancy::BoundOpen { .. } => Ok(current),
        BedOccupancy::BoundPendingRelease {
            customer_id,
            assigned_date,
            ..
        } => Ok(BedOccupancy::BoundOpen {
            customer_id,
            assigned_date,
        }),
    }
}

/// A pending release whose date has come due rolls over on the next save.
/// Empty and open beds are left alone, so repeated saves are no-ops.
pub fn plan_settle(current: BedOccupancy, today: NaiveDate) -> Option<Tenure> {
    match current {
        BedOccupancy::BoundPendingRelease {
            customer_id,
            assigned_date,
            released_date,
        } if released_date <= today => Some(Tenure {
            customer_id,
            assigned_date,
            released_date,
        }),
        _ => None,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OccupancyOutcome {
    pub bed: Bed,
    pub history: Option<BedAssignmentHistory>,
}

pub struct OccupancyService {
    clock: Arc<dyn Clock>,
}

impl OccupancyService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub async fn assign_bed(
        &self,
        pool: &PgPool,
        bed_id: Uuid,
        customer_id: Uuid,
        assigned_date: NaiveDate,
        actor: Uuid,
    ) -> AppResult<Bed> {
        let mut tx = pool.begin().await?;

        let bed = lock_bed(&mut tx, bed_id).await?;
        let customer = lock_customer(&mut tx, customer_id).await?;

        let current_bed: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM beds WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_optional(&mut *tx)
                .await?;

        let standing = CustomerStanding {
            active: customer.active,
            current_bed: current_bed.map(|(id,)| id),
        };
        let next = plan_assign(BedOccupancy::of(&bed), customer_id, standing, assigned_date)?;

        let bed = write_occupancy(&mut tx, bed.id, next, actor)
            .await
            .map_err(|e| match e {
                AppError::Database(db) => on_unique_violation(db, || AppError::CustomerDoubleBooked),
                other => other,
            })?;

        tx.commit().await?;

        tracing::info!(
            "Bed {} assigned to customer {} from {}",
            bed.id,
            customer_id,
            assigned_date
        );
        Ok(bed)
    }

    /// Sets or clears the release date of a bound bed. A date on or before
    /// today moves the tenure into history in the same transaction.
    pub async fn set_released_date(
        &self,
        pool: &PgPool,
        bed_id: Uuid,
        released_date: Option<NaiveDate>,
        actor: Uuid,
    ) -> AppResult<OccupancyOutcome> {
        let mut tx = pool.begin().await?;
        let bed = lock_bed(&mut tx, bed_id).await?;
        let current = BedOccupancy::of(&bed);

        let outcome = match released_date {
            None => {
                let next = plan_clear_release(current)?;
                let bed = write_occupancy(&mut tx, bed.id, next, actor).await?;
                if let Some(customer_id) = next.customer_id() {
                    set_customer_active(&mut tx, customer_id, true, actor).await?;
                }
                OccupancyOutcome { bed, history: None }
            }
            Some(date) => match plan_release(current, date, self.clock.today())? {
                ReleasePlan::Pending(next) => {
                    let bed = write_occupancy(&mut tx, bed.id, next, actor).await?;
                    OccupancyOutcome { bed, history: None }
                }
                ReleasePlan::Rollover(tenure) => rollover(&mut tx, bed.id, tenure, actor).await?,
            },
        };

        tx.commit().await?;

        match &outcome.history {
            Some(history) => tracing::info!(
                "Bed {} released: customer {} moved to history ({} - {})",
                bed_id,
                history.customer_id,
                history.assigned_date,
                history.released_date
            ),
            None => tracing::info!("Bed {} release date set to {:?}", bed_id, released_date),
        }
        Ok(outcome)
    }

    /// Re-saves a bed, performing a rollover if its pending release has come due.
    pub async fn settle_bed(
        &self,
        pool: &PgPool,
        bed_id: Uuid,
        actor: Uuid,
    ) -> AppResult<OccupancyOutcome> {
        let mut tx = pool.begin().await?;
        let bed = lock_bed(&mut tx, bed_id).await?;

        let outcome = match plan_settle(BedOccupancy::of(&bed), self.clock.today()) {
            Some(tenure) => rollover(&mut tx, bed.id, tenure, actor).await?,
            None => OccupancyOutcome { bed, history: None },
        };

        tx.commit().await?;
        if outcome.history.is_some() {
            tracing::info!("Bed {} settled: due release rolled over", bed_id);
        }
        Ok(outcome)
    }
}

async fn lock_bed(conn: &mut PgConnection, bed_id: Uuid) -> AppResult<Bed> {
    sqlx::query_as::<_, Bed>("SELECT * FROM beds WHERE id = $1 FOR UPDATE")
        .bind(bed_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Bed not found".to_string()))
}

async fn lock_customer(conn: &mut PgConnection, customer_id: Uuid) -> AppResult<Customer> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 FOR UPDATE")
        .bind(customer_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}

async fn write_occupancy(
    conn: &mut PgConnection,
    bed_id: Uuid,
    state: BedOccupancy,
    actor: Uuid,
) -> AppResult<Bed> {
    let (customer_id, assigned_date, released_date) = match state {
        BedOccupancy::Empty => (None, None, None),
        BedOccupancy::BoundOpen {
            customer_id,
            assigned_date,
        } => (Some(customer_id), Some(assigned_date), None),
        BedOccupancy::BoundPendingRelease {
            customer_id,
            assigned_date,
            released_date,
        } => (Some(customer_id), Some(assigned_date), Some(released_date)),
    };

    let bed = sqlx::query_as::<_, Bed>(
        r#"
        UPDATE beds
        SET customer_id = $2, assigned_date = $3, released_date = $4,
            updated_at = NOW(), updated_by = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(bed_id)
    .bind(customer_id)
    .bind(assigned_date)
    .bind(released_date)
    .bind(actor)
    .fetch_one(conn)
    .await?;

    Ok(bed)
}

async fn set_customer_active(
    conn: &mut PgConnection,
    customer_id: Uuid,
    active: bool,
    actor: Uuid,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE customers SET active = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1",
    )
    .bind(customer_id)
    .bind(active)
    .bind(actor)
    .execute(conn)
    .await
    .map_err(|e| {
        on_unique_violation(e, || {
            AppError::Duplicate(
                "An active customer with the same name and date of birth exists".to_string(),
            )
        })
    })?;
    Ok(())
}

/// History append, customer deactivation and bed clearing; the caller owns the
/// transaction so the three writes commit together.
async fn rollover(
    conn: &mut PgConnection,
    bed_id: Uuid,
    tenure: Tenure,
    actor: Uuid,
) -> AppResult<OccupancyOutcome> {
    let history = sqlx::query_as::<_, BedAssignmentHistory>(
        r#"
        INSERT INTO bed_assignment_history (bed_id, customer_id, assigned_date, released_date, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(bed_id)
    .bind(tenure.customer_id)
    .bind(tenure.assigned_date)
    .bind(tenure.released_date)
    .bind(actor)
    .fetch_one(&mut *conn)
    .await?;

    set_customer_active(&mut *conn, tenure.customer_id, false, actor).await?;
    let bed = write_occupancy(&mut *conn, bed_id, BedOccupancy::Empty, actor).await?;

    Ok(OccupancyOutcome {
        bed,
        history: Some(history),
    })
}
