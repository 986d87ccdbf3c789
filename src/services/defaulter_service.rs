use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::RevenueKind;
use crate::utils::period::YearMonth;

#[derive(Debug, Clone, FromRow)]
pub struct CurrentTenancy {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_active: bool,
    pub assigned_date: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
pub struct PastTenancy {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub assigned_date: NaiveDate,
    pub released_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TenancyType {
    Current,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Defaulter {
    pub customer_id: Uuid,
    pub customer_name: String,
    #[serde(rename = "type")]
    pub tenancy_type: TenancyType,
    pub assigned_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unpaid_months: Vec<YearMonth>,
}

fn unpaid_months(
    customer_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    paid: &HashSet<(Uuid, YearMonth)>,
) -> Vec<YearMonth> {
    YearMonth::range_inclusive(YearMonth::of(start), YearMonth::of(end))
        .into_iter()
        .filter(|month| !paid.contains(&(customer_id, *month)))
        .collect()
}

/// Unpaid rent months per tenure. Current tenures run to `today`, finished ones
/// to their release date. Inactive customers still sitting on a bed are only
/// reported through their history rows.
pub fn find_defaulters(
    current: &[CurrentTenancy],
    past: &[PastTenancy],
    paid: &HashSet<(Uuid, YearMonth)>,
    today: NaiveDate,
) -> Vec<Defaulter> {
    let mut defaulters = Vec::new();

    for tenancy in current.iter().filter(|t| t.customer_active) {
        let months = unpaid_months(tenancy.customer_id, tenancy.assigned_date, today, paid);
        if !months.is_empty() {
            defaulters.push(Defaulter {
                customer_id: tenancy.customer_id,
                customer_name: tenancy.customer_name.clone(),
                tenancy_type: TenancyType::Current,
                assigned_date: tenancy.assigned_date,
                end_date: today,
                unpaid_months: months,
            });
        }
    }

    for tenancy in past {
        let months = unpaid_months(
            tenancy.customer_id,
            tenancy.assigned_date,
            tenancy.released_date,
            paid,
        );
        if !months.is_empty() {
            defaulters.push(Defaulter {
                customer_id: tenancy.customer_id,
                customer_name: tenancy.customer_name.clone(),
                tenancy_type: TenancyType::Left,
                assigned_date: tenancy.assigned_date,
                end_date: tenancy.released_date,
                unpaid_months: months,
            });
        }
    }

    defaulters.sort_by(|a, b| {
        (a.customer_id, a.tenancy_type, a.assigned_date, a.end_date).cmp(&(
            b.customer_id,
            b.tenancy_type,
            b.assigned_date,
            b.end_date,
        ))
    });
    defaulters
}

pub async fn load_defaulters(pool: &PgPool, today: NaiveDate) -> AppResult<Vec<Defaulter>> {
    let current = sqlx::query_as::<_, CurrentTenancy>(
        r#"
        SELECT b.customer_id, c.name AS customer_name, c.active AS customer_active, b.assigned_date
        FROM beds b
        JOIN customers c ON c.id = b.customer_id
        WHERE b.customer_id IS NOT NULL AND b.assigned_date IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await?;

    let past = sqlx::query_as::<_, PastTenancy>(
        r#"
        SELECT h.customer_id, c.name AS customer_name, h.assigned_date, h.released_date
        FROM bed_assignment_history h
        JOIN customers c ON c.id = h.customer_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let paid_rows: Vec<(Uuid, i32, i32)> =
        sqlx::query_as("SELECT customer_id, year, month FROM revenue_entries WHERE kind = $1")
            .bind(RevenueKind::Rent)
            .fetch_all(pool)
            .await?;

    let paid: HashSet<(Uuid, YearMonth)> = paid_rows
        .into_iter()
        .map(|(customer_id, year, month)| {
            (
                customer_id,
                YearMonth {
                    year,
                    month: month as u32,
                },
            )
        })
        .collect();

    Ok(find_defaulters(&current, &past, &paid, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth { year, month }
    }

    fn current(customer_id: Uuid, active: bool, assigned: NaiveDate) -> CurrentTenancy {
        CurrentTenancy {
            customer_id,
            customer_name: "Tanaka".to_string(),
            customer_active: active,
            assigned_date: assigned,
        }
    }

    #[test]
    fn test_current_customer_with_partial_payments() {
        let customer = Uuid::new_v4();
        let paid: HashSet<_> = [(customer, ym(2025, 1))].into_iter().collect();

        let result = find_defaulters(
            &[current(customer, true, date(2025, 1, 15))],
            &[],
            &paid,
            date(2025, 3, 20),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tenancy_type, TenancyType::Current);
        assert_eq!(result[0].end_date, date(2025, 3, 20));
        assert_eq!(result[0].unpaid_months, vec![ym(2025, 2), ym(2025, 3)]);
    }

    #[test]
    fn test_fully_paid_customer_is_omitted() {
        let customer = Uuid::new_v4();
        let paid: HashSet<_> = [(customer, ym(2025, 2)), (customer, ym(2025, 3))]
            .into_iter()
            .collect();
        let result = find_defaulters(
            &[current(customer, true, date(2025, 2, 1))],
            &[],
            &paid,
            date(2025, 3, 31),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_inactive_current_skipped_but_history_reported() {
        let customer = Uuid::new_v4();
        let past = PastTenancy {
            customer_id: customer,
            customer_name: "Sato".to_string(),
            assigned_date: date(2024, 11, 3),
            released_date: date(2025, 1, 5),
        };
        let paid: HashSet<_> = [(customer, ym(2024, 12))].into_iter().collect();

        let result = find_defaulters(
            &[current(customer, false, date(2025, 2, 1))],
            &[past],
            &paid,
            date(2025, 3, 1),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tenancy_type, TenancyType::Left);
        assert_eq!(result[0].end_date, date(2025, 1, 5));
        assert_eq!(result[0].unpaid_months, vec![ym(2024, 11), ym(2025, 1)]);
    }

    #[test]
    fn test_range_covers_every_month() {
        let customer = Uuid::new_v4();
        let assigned = date(2023, 10, 31);
        let today = date(2025, 2, 1);
        let paid: HashSet<_> = [(customer, ym(2024, 6)), (customer, ym(2023, 10))]
            .into_iter()
            .collect();

        let result = find_defaulters(&[current(customer, true, assigned)], &[], &paid, today);

        let expected = YearMonth::span_len(assigned, today);
        assert_eq!(expected, (2025 - 2023) * 12 + (2 - 10) + 1);
        let reported = result[0].unpaid_months.len() as i64;
        assert_eq!(reported + paid.len() as i64, expected);
        for month in YearMonth::range_inclusive(YearMonth::of(assigned), YearMonth::of(today)) {
            let is_paid = paid.contains(&(customer, month));
            let is_unpaid = result[0].unpaid_months.contains(&month);
            assert!(is_paid ^ is_unpaid, "month {} must be paid xor unpaid", month);
        }
    }

    #[test]
    fn test_output_sorted_by_customer_then_month() {
        let mut ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let tenancies: Vec<CurrentTenancy> = ids
            .iter()
            .rev()
            .map(|id| current(*id, true, date(2025, 1, 1)))
            .collect();
        ids.sort();

        let result = find_defaulters(&tenancies, &[], &HashSet::new(), date(2025, 2, 1));

        let order: Vec<Uuid> = result.iter().map(|d| d.customer_id).collect();
        assert_eq!(order, ids.to_vec());
        for defaulter in &result {
            let mut sorted = defaulter.unpaid_months.clone();
            sorted.sort();
            assert_eq!(sorted, defaulter.unpaid_months);
        }
    }

    #[test]
    fn test_future_assignment_has_no_unpaid_months() {
        let customer = Uuid::new_v4();
        let result = find_defaulters(
            &[current(customer, true, date(2025, 5, 1))],
            &[],
            &HashSet::new(),
            date(2025, 3, 1),
        );
        assert!(result.is_empty());
    }
}
