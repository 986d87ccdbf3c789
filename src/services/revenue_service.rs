use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{on_unique_violation, AppError, AppResult};
use crate::models::{PaymentType, RegistrationFeeInput, RentInput, RevenueEntry, RevenueKind};
use crate::services::discount::{registration_fee_breakdown, rent_breakdown};
use crate::services::notifier::Notifier;
use crate::utils::period::YearMonth;
use crate::utils::validators::validate_money;

/// Column values for a ledger row, computed before anything touches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevenueEntry {
    pub kind: RevenueKind,
    pub customer_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub deposit: Option<Decimal>,
    pub deposit_discount_pct: Option<Decimal>,
    pub deposit_after: Option<Decimal>,
    pub initial_fee: Option<Decimal>,
    pub initial_fee_discount_pct: Option<Decimal>,
    pub initial_fee_after: Option<Decimal>,
    pub rent: Option<Decimal>,
    pub rent_discount_pct: Option<Decimal>,
    pub rent_after: Option<Decimal>,
    pub internet: Option<Decimal>,
    pub utilities: Option<Decimal>,
    pub total_amount: Decimal,
    pub payment_type: Option<PaymentType>,
    pub prepaid_amount: Option<Decimal>,
    pub memo: Option<String>,
}

impl NewRevenueEntry {
    fn blank(kind: RevenueKind, customer_id: Uuid, period: YearMonth) -> Self {
        Self {
            kind,
            customer_id,
            year: period.year,
            month: period.month as i32,
            deposit: None,
            deposit_discount_pct: None,
            deposit_after: None,
            initial_fee: None,
            initial_fee_discount_pct: None,
            initial_fee_after: None,
            rent: None,
            rent_discount_pct: None,
            rent_after: None,
            internet: None,
            utilities: None,
            total_amount: Decimal::ZERO,
            payment_type: None,
            prepaid_amount: None,
            memo: None,
        }
    }
}

fn require_memo(discounts: &[Decimal], memo: &str) -> AppResult<Option<String>> {
    let memo = memo.trim();
    if discounts.iter().any(|pct| *pct > Decimal::ZERO) && memo.is_empty() {
        return Err(AppError::MemoRequired);
    }
    Ok(if memo.is_empty() {
        None
    } else {
        Some(memo.to_string())
    })
}

pub fn prepare_registration_fee(input: &RegistrationFeeInput) -> AppResult<NewRevenueEntry> {
    let period = YearMonth::new(input.year, input.month)?;
    let breakdown = registration_fee_breakdown(
        input.deposit,
        input.deposit_discount_pct,
        input.initial_fee,
        input.initial_fee_discount_pct,
    )?;
    let memo = require_memo(
        &[input.deposit_discount_pct, input.initial_fee_discount_pct],
        &input.memo,
    )?;

    Ok(NewRevenueEntry {
        deposit: Some(input.deposit),
        deposit_discount_pct: Some(input.deposit_discount_pct),
        deposit_after: Some(breakdown.deposit_after),
        initial_fee: Some(input.initial_fee),
        initial_fee_discount_pct: Some(input.initial_fee_discount_pct),
        initial_fee_after: Some(breakdown.initial_fee_after),
        total_amount: breakdown.total,
        memo,
        ..NewRevenueEntry::blank(RevenueKind::RegistrationFee, input.customer_id, period)
    })
}

pub fn prepare_rent(input: &RentInput) -> AppResult<NewRevenueEntry> {
    let period = YearMonth::new(input.year, input.month)?;
    let breakdown = rent_breakdown(
        input.rent,
        input.rent_discount_pct,
        input.internet,
        input.utilities,
    )?;
    if let Some(prepaid) = input.prepaid_amount {
        validate_money("prepaid_amount", prepaid)?;
    }
    let memo = require_memo(&[input.rent_discount_pct], &input.memo)?;

    Ok(NewRevenueEntry {
        rent: Some(input.rent),
        rent_discount_pct: Some(input.rent_discount_pct),
        rent_after: Some(breakdown.rent_after),
        internet: Some(input.internet),
        utilities: Some(input.utilities),
        total_amount: breakdown.total,
        payment_type: input.payment_type,
        prepaid_amount: input.prepaid_amount,
        memo,
        ..NewRevenueEntry::blank(RevenueKind::Rent, input.customer_id, period)
    })
}

pub struct RevenueService {
    notifier: Notifier,
}

impl RevenueService {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }

    pub async fn post_registration_fee(
        &self,
        pool: &PgPool,
        input: &RegistrationFeeInput,
        actor: Uuid,
    ) -> AppResult<RevenueEntry> {
        let entry = prepare_registration_fee(input)?;
        self.post(pool, entry, actor).await
    }

    pub async fn post_rent(
        &self,
        pool: &PgPool,
        input: &RentInput,
        actor: Uuid,
    ) -> AppResult<RevenueEntry> {
        let entry = prepare_rent(input)?;
        self.post(pool, entry, actor).await
    }

    async fn post(
        &self,
        pool: &PgPool,
        new: NewRevenueEntry,
        actor: Uuid,
    ) -> AppResult<RevenueEntry> {
        let mut tx = pool.begin().await?;

        let customer: (String,) = sqlx::query_as("SELECT name FROM customers WHERE id = $1")
            .bind(new.customer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let inserted = sqlx::query_as::<_, RevenueEntry>(
            r#"
            INSERT INTO revenue_entries (
                kind, customer_id, year, month,
                deposit, deposit_discount_pct, deposit_after,
                initial_fee, initial_fee_discount_pct, initial_fee_after,
                rent, rent_discount_pct, rent_after, internet, utilities,
                total_amount, payment_type, prepaid_amount, memo,
                created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $20)
            ON CONFLICT (kind, customer_id, year, month) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(new.kind)
        .bind(new.customer_id)
        .bind(new.year)
        .bind(new.month)
        .bind(new.deposit)
        .bind(new.deposit_discount_pct)
        .bind(new.deposit_after)
        .bind(new.initial_fee)
        .bind(new.initial_fee_discount_pct)
        .bind(new.initial_fee_after)
        .bind(new.rent)
        .bind(new.rent_discount_pct)
        .bind(new.rent_after)
        .bind(new.internet)
        .bind(new.utilities)
        .bind(new.total_amount)
        .bind(new.payment_type)
        .bind(new.prepaid_amount)
        .bind(&new.memo)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, || AppError::DuplicatePosting))?;

        let entry = inserted.ok_or(AppError::DuplicatePosting)?;
        tx.commit().await?;

        tracing::info!(
            "Posted {:?} for customer {} {}-{:02}: total {}",
            entry.kind,
            entry.customer_id,
            entry.year,
            entry.month,
            entry.total_amount
        );

        self.notify(pool, &entry, &customer.0).await;
        Ok(entry)
    }

    /// Runs after commit; nothing here can undo the posting.
    async fn notify(&self, pool: &PgPool, entry: &RevenueEntry, customer_name: &str) {
        let previous = if entry.kind == RevenueKind::Rent {
            let period = YearMonth {
                year: entry.year,
                month: entry.month as u32,
            }
            .prev();
            sqlx::query_as::<_, RevenueEntry>(
                r#"
                SELECT * FROM revenue_entries
                WHERE kind = $1 AND customer_id = $2 AND year = $3 AND month = $4
                "#,
            )
            .bind(RevenueKind::Rent)
            .bind(entry.customer_id)
            .bind(period.year)
            .bind(period.month as i32)
            .fetch_optional(pool)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Could not load previous rent entry for carry-over: {}", e);
                None
            })
        } else {
            None
        };

        self.notifier
            .revenue_posted(entry, customer_name, previous.as_ref())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::services::notifier::HttpMailSink;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rent_input(memo: &str) -> RentInput {
        RentInput {
            customer_id: Uuid::new_v4(),
            year: 2025,
            month: 3,
            rent: dec("50000"),
            rent_discount_pct: dec("10"),
            internet: dec("3000"),
            utilities: dec("2000"),
            payment_type: None,
            prepaid_amount: None,
            memo: memo.to_string(),
        }
    }

    fn registration_input(deposit_pct: &str, memo: &str) -> RegistrationFeeInput {
        RegistrationFeeInput {
            customer_id: Uuid::new_v4(),
            year: 2025,
            month: 1,
            deposit: dec("100000"),
            deposit_discount_pct: dec(deposit_pct),
            initial_fee: dec("50000"),
            initial_fee_discount_pct: dec("0"),
            memo: memo.to_string(),
        }
    }

    #[test]
    fn test_prepare_rent_with_discount() {
        let entry = prepare_rent(&rent_input("promo")).unwrap();
        assert_eq!(entry.kind, RevenueKind::Rent);
        assert_eq!(entry.rent_after, Some(dec("45000.00")));
        assert_eq!(entry.total_amount, dec("50000.00"));
        assert_eq!(entry.memo.as_deref(), Some("promo"));
        assert!(entry.deposit.is_none());
    }

    #[test]
    fn test_discount_without_memo_is_rejected() {
        let err = prepare_registration_fee(&registration_input("5", "")).unwrap_err();
        assert!(matches!(err, AppError::MemoRequired));

        let err = prepare_rent(&rent_input("   ")).unwrap_err();
        assert!(matches!(err, AppError::MemoRequired));
    }

    #[test]
    fn test_no_discount_needs_no_memo() {
        let entry = prepare_registration_fee(&registration_input("0", "")).unwrap();
        assert_eq!(entry.kind, RevenueKind::RegistrationFee);
        assert_eq!(entry.total_amount, dec("150000"));
        assert!(entry.memo.is_none());
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let mut input = rent_input("promo");
        input.month = 13;
        assert!(matches!(
            prepare_rent(&input).unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[test]
    fn test_negative_prepaid_amount_is_rejected() {
        let mut input = rent_input("promo");
        input.payment_type = Some(PaymentType::Prepaid);
        input.prepaid_amount = Some(dec("-1"));
        assert!(prepare_rent(&input).is_err());
    }

    #[test]
    fn test_identical_retries_prepare_identical_rows() {
        let input = rent_input("promo");
        assert_eq!(prepare_rent(&input).unwrap(), prepare_rent(&input).unwrap());
    }

    fn service() -> RevenueService {
        let config = crate::config::Config::for_tests();
        RevenueService::new(Notifier::new(
            Arc::new(HttpMailSink::new(config.clone())),
            config.mail_recipient,
            Duration::from_secs(1),
        ))
    }

    async fn stored_rent(pool: &PgPool, customer_id: Uuid) -> Vec<RevenueEntry> {
        sqlx::query_as::<_, RevenueEntry>(
            "SELECT * FROM revenue_entries WHERE kind = 'rent' AND customer_id = $1",
        )
        .bind(customer_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_second_rent_posting_is_rejected_and_keeps_row(pool: PgPool) {
        let actor = fixtures::user(&pool, false).await;
        let customer_id = fixtures::customer(&pool, "Nguyen").await;
        let revenue = service();

        let input = RentInput {
            customer_id,
            ..rent_input("promo")
        };
        let first = revenue.post_rent(&pool, &input, actor).await.unwrap();
        assert_eq!(first.rent_after, Some(dec("45000.00")));
        assert_eq!(first.total_amount, dec("50000.00"));

        let err = revenue.post_rent(&pool, &input, actor).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicatePosting));

        // a retry with different figures must not overwrite the posting either
        let changed = RentInput {
            rent: dec("60000"),
            rent_discount_pct: dec("0"),
            memo: String::new(),
            ..input.clone()
        };
        let err = revenue.post_rent(&pool, &changed, actor).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicatePosting));

        let rows = stored_rent(&pool, customer_id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, first.id);
        assert_eq!(rows[0].total_amount, dec("50000.00"));
        assert_eq!(rows[0].audit.updated_at, first.audit.updated_at);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_natural_key_includes_kind_and_month(pool: PgPool) {
        let actor = fixtures::user(&pool, false).await;
        let customer_id = fixtures::customer(&pool, "Tran").await;
        let revenue = service();

        let rent = RentInput {
            customer_id,
            ..rent_input("promo")
        };
        revenue.post_rent(&pool, &rent, actor).await.unwrap();

        let next_month = RentInput { month: 4, ..rent.clone() };
        revenue.post_rent(&pool, &next_month, actor).await.unwrap();

        let fee = RegistrationFeeInput {
            customer_id,
            year: 2025,
            month: 3,
            ..registration_input("0", "")
        };
        revenue.post_registration_fee(&pool, &fee, actor).await.unwrap();
        let err = revenue
            .post_registration_fee(&pool, &fee, actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicatePosting));

        assert_eq!(fixtures::count(&pool, "revenue_entries").await, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_discount_without_memo_writes_nothing(pool: PgPool) {
        let actor = fixtures::user(&pool, false).await;
        let customer_id = fixtures::customer(&pool, "Le").await;

        let fee = RegistrationFeeInput {
            customer_id,
            ..registration_input("5", "")
        };
        let err = service()
            .post_registration_fee(&pool, &fee, actor)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MemoRequired));
        assert_eq!(fixtures::count(&pool, "revenue_entries").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_posting_for_unknown_customer_is_not_found(pool: PgPool) {
        let actor = fixtures::user(&pool, false).await;
        let err = service()
            .post_rent(&pool, &rent_input("promo"), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
