use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::ExpenseType;
use crate::utils::period::YearMonth;

/// Billed monthly; the two months before the current one must be paid.
const MONTHLY_TYPES: [ExpenseType; 3] = [
    ExpenseType::Internet,
    ExpenseType::Electricity,
    ExpenseType::Gas,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UtilityStatus {
    pub hostel_id: Uuid,
    pub hostel_name: String,
    pub unpaid_bills: Vec<String>,
}

/// Consecutive months folded into (first, last) runs. Input must be sorted.
fn collapse_runs(months: &[YearMonth]) -> Vec<(YearMonth, YearMonth)> {
    let mut runs: Vec<(YearMonth, YearMonth)> = Vec::new();
    for month in months {
        match runs.last_mut() {
            Some((_, last)) if last.next() == *month => *last = *month,
            _ => runs.push((*month, *month)),
        }
    }
    runs
}

fn period_label(first: YearMonth, last: YearMonth, expense_type: ExpenseType) -> String {
    if first == last {
        format!("{} {}", first, expense_type.label())
    } else {
        format!("{}~{} {}", first, last, expense_type.label())
    }
}

/// Labels for the unpaid bills of one hostel, grouped by expense type.
pub fn unpaid_bills(paid: &HashSet<(ExpenseType, YearMonth)>, today: NaiveDate) -> Vec<String> {
    let current = YearMonth::of(today);
    let last = current.prev();
    let before_last = last.prev();

    let mut labels = Vec::new();

    for expense_type in MONTHLY_TYPES {
        let missing: Vec<YearMonth> = [before_last, last]
            .into_iter()
            .filter(|month| !paid.contains(&(expense_type, *month)))
            .collect();
        for (first, end) in collapse_runs(&missing) {
            labels.push(period_label(first, end, expense_type));
        }
    }

    let water_window = [before_last, last, current];
    let water_paid = water_window
        .iter()
        .any(|month| paid.contains(&(ExpenseType::Water, *month)));
    if !water_paid {
        labels.push(period_label(before_last, current, ExpenseType::Water));
    }

    labels
}

pub async fn load_utility_status(pool: &PgPool, today: NaiveDate) -> AppResult<Vec<UtilityStatus>> {
    let hostels: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM hostels ORDER BY name")
        .fetch_all(pool)
        .await?;

    let window_start = YearMonth::of(today).prev().prev();
    let rows: Vec<(Uuid, ExpenseType, i32, i32)> = sqlx::query_as(
        r#"
        SELECT hostel_id, expense_type, billing_year, billing_month
        FROM utility_expenses
        WHERE (billing_year, billing_month) >= ($1, $2)
        "#,
    )
    .bind(window_start.year)
    .bind(window_start.month as i32)
    .fetch_all(pool)
    .await?;

    let mut paid_by_hostel: HashMap<Uuid, HashSet<(ExpenseType, YearMonth)>> = HashMap::new();
    for (hostel_id, expense_type, year, month) in rows {
        paid_by_hostel.entry(hostel_id).or_default().insert((
            expense_type,
            YearMonth {
                year,
                month: month as u32,
            },
        ));
    }

    let empty = HashSet::new();
    Ok(hostels
        .into_iter()
        .filter_map(|(hostel_id, hostel_name)| {
            let paid = paid_by_hostel.get(&hostel_id).unwrap_or(&empty);
            let bills = unpaid_bills(paid, today);
            if bills.is_empty() {
                None
            } else {
                Some(UtilityStatus {
                    hostel_id,
                    hostel_name,
                    unpaid_bills: bills,
                })
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth { year, month }
    }

    fn all_paid(months: &[YearMonth]) -> HashSet<(ExpenseType, YearMonth)> {
        let mut paid = HashSet::new();
        for expense_type in [
            ExpenseType::Internet,
            ExpenseType::Electricity,
            ExpenseType::Gas,
            ExpenseType::Water,
        ] {
            for month in months {
                paid.insert((expense_type, *month));
            }
        }
        paid
    }

    #[test]
    fn test_internet_gap_and_missing_water() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut paid = all_paid(&[ym(2025, 1), ym(2025, 2), ym(2025, 3)]);
        paid.retain(|(t, _)| *t != ExpenseType::Internet && *t != ExpenseType::Water);
        paid.insert((ExpenseType::Internet, ym(2025, 1)));
        paid.insert((ExpenseType::Internet, ym(2025, 3)));

        let bills = unpaid_bills(&paid, today);

        assert_eq!(
            bills,
            vec![
                "2025-02 Internet".to_string(),
                "2025-01~2025-03 Water".to_string()
            ]
        );
    }

    #[test]
    fn test_everything_paid_yields_nothing() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let paid = all_paid(&[ym(2025, 1), ym(2025, 2)]);
        assert!(unpaid_bills(&paid, today).is_empty());
    }

    #[test]
    fn test_water_paid_in_current_month_only_is_enough() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut paid = all_paid(&[ym(2025, 1), ym(2025, 2)]);
        paid.retain(|(t, _)| *t != ExpenseType::Water);
        paid.insert((ExpenseType::Water, ym(2025, 3)));
        assert!(unpaid_bills(&paid, today).is_empty());
    }

    #[test]
    fn test_both_months_missing_collapse_across_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let mut paid = all_paid(&[ym(2024, 12), ym(2025, 1)]);
        paid.retain(|(t, _)| *t != ExpenseType::Gas);

        assert_eq!(unpaid_bills(&paid, today), vec!["2024-12~2025-01 Gas".to_string()]);
    }

    #[test]
    fn test_current_month_does_not_count_for_monthly_types() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut paid = all_paid(&[ym(2025, 1), ym(2025, 2)]);
        paid.retain(|(t, m)| !(*t == ExpenseType::Electricity && *m == ym(2025, 1)));
        paid.insert((ExpenseType::Electricity, ym(2025, 3)));

        assert_eq!(
            unpaid_bills(&paid, today),
            vec!["2025-01 Electricity".to_string()]
        );
    }

    #[test]
    fn test_collapse_runs() {
        assert_eq!(
            collapse_runs(&[ym(2024, 11), ym(2024, 12), ym(2025, 2)]),
            vec![(ym(2024, 11), ym(2024, 12)), (ym(2025, 2), ym(2025, 2))]
        );
        assert!(collapse_runs(&[]).is_empty());
    }
}
