//! Monthly sales targets and the admission gate for rental contracts.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{on_unique_violation, AppError, AppResult};
use crate::models::{
    BulkAssignTargetsRequest, CreateRentalContractRequest, CreateTargetRequest, RentalContract,
    Target, TargetResponse, TargetStatus, TargetsQuery,
};
use crate::services::clock::Clock;
use crate::utils::period::YearMonth;
use crate::utils::validators::{validate_customer_number, validate_money};

/// An active target whose month is already behind us is overdue.
pub fn effective_status(status: TargetStatus, period: YearMonth, today: NaiveDate) -> TargetStatus {
    if status == TargetStatus::Active && period < YearMonth::of(today) {
        TargetStatus::Overdue
    } else {
        status
    }
}

pub fn is_overdue(target: &Target, today: NaiveDate) -> bool {
    let period = YearMonth {
        year: target.year,
        month: target.month as u32,
    };
    target.status == TargetStatus::Active && period < YearMonth::of(today)
}

/// Returns the target a new contract counts against, or `NoActiveTarget`.
pub fn admit_contract(actor: Uuid, target: Option<&Target>, today: NaiveDate) -> AppResult<Uuid> {
    let current = YearMonth::of(today);
    match target {
        Some(t)
            if t.user_id == actor
                && t.status == TargetStatus::Active
                && t.year == current.year
                && t.month as u32 == current.month =>
        {
            Ok(t.id)
        }
        _ => Err(AppError::NoActiveTarget),
    }
}

pub fn validate_target_amount(amount: Decimal) -> AppResult<()> {
    validate_money("target_amount", amount)?;
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(
            "target_amount",
            "target amount must be greater than zero",
        ));
    }
    Ok(())
}

pub fn validate_contract(request: &CreateRentalContractRequest) -> AppResult<()> {
    if !validate_customer_number(&request.customer_number) {
        return Err(AppError::validation(
            "customer_number",
            "customer number must be 1 to 11 digits",
        ));
    }
    validate_money("agent_fee", request.agent_fee)?;
    validate_money("ad_fee", request.ad_fee)?;
    Ok(())
}

/// Achieved share of the target in percent, two decimals.
pub fn achievement_rate(achieved: Decimal, target_amount: Decimal) -> Decimal {
    if target_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (achieved * Decimal::ONE_HUNDRED / target_amount)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, FromRow)]
struct TargetProgressRow {
    #[sqlx(flatten)]
    target: Target,
    achieved_amount: Decimal,
    contract_count: i64,
}

pub struct TargetService {
    clock: Arc<dyn Clock>,
}

impl TargetService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub async fn create_target(
        &self,
        pool: &PgPool,
        request: &CreateTargetRequest,
        actor: Uuid,
    ) -> AppResult<Target> {
        let period = YearMonth::new(request.year, request.month)?;
        validate_target_amount(request.target_amount)?;
        let status = effective_status(TargetStatus::Active, period, self.clock.today());

        let target = insert_target(
            pool,
            request.user_id,
            period,
            request.target_amount,
            status,
            request.description.as_deref(),
            actor,
        )
        .await?;

        tracing::info!(
            "Target {} set for user {} in {}: {}",
            target.id,
            target.user_id,
            period,
            target.target_amount
        );
        Ok(target)
    }

    /// All-or-nothing: one colliding (user, year, month) rejects the batch.
    pub async fn bulk_assign(
        &self,
        pool: &PgPool,
        request: &BulkAssignTargetsRequest,
        actor: Uuid,
    ) -> AppResult<Vec<Target>> {
        let period = YearMonth::new(request.year, request.month)?;
        validate_target_amount(request.target_amount)?;
        if request.user_ids.is_empty() {
            return Err(AppError::validation("user_ids", "at least one user is required"));
        }
        let unique: HashSet<&Uuid> = request.user_ids.iter().collect();
        if unique.len() != request.user_ids.len() {
            return Err(AppError::validation("user_ids", "duplicate user in request"));
        }

        let status = effective_status(TargetStatus::Active, period, self.clock.today());
        let mut tx = pool.begin().await?;
        let mut targets = Vec::with_capacity(request.user_ids.len());

        for user_id in &request.user_ids {
            let target = insert_target(
                &mut *tx,
                *user_id,
                period,
                request.target_amount,
                status,
                request.description.as_deref(),
                actor,
            )
            .await?;
            targets.push(target);
        }

        tx.commit().await?;
        tracing::info!("Assigned {} targets for {}", targets.len(), period);
        Ok(targets)
    }

    /// Saving a target re-applies the overdue demotion.
    pub async fn update_status(
        &self,
        pool: &PgPool,
        target_id: Uuid,
        status: TargetStatus,
        actor: Uuid,
    ) -> AppResult<Target> {
        let mut tx = pool.begin().await?;

        let target = sqlx::query_as::<_, Target>("SELECT * FROM targets WHERE id = $1 FOR UPDATE")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Target not found".to_string()))?;

        let period = YearMonth {
            year: target.year,
            month: target.month as u32,
        };
        let status = effective_status(status, period, self.clock.today());

        let target = sqlx::query_as::<_, Target>(
            r#"
            UPDATE targets SET status = $2, updated_at = NOW(), updated_by = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(target.id)
        .bind(status)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(target)
    }

    pub async fn list_targets(
        &self,
        pool: &PgPool,
        query: &TargetsQuery,
    ) -> AppResult<Vec<TargetResponse>> {
        let rows = sqlx::query_as::<_, TargetProgressRow>(
            r#"
            SELECT t.*,
                   COALESCE(SUM(rc.agent_fee + rc.ad_fee), 0) AS achieved_amount,
                   COUNT(rc.id) AS contract_count
            FROM targets t
            LEFT JOIN rental_contracts rc ON rc.target_id = t.id
            WHERE ($1::uuid IS NULL OR t.user_id = $1)
              AND ($2::int IS NULL OR t.year = $2)
              AND ($3::int IS NULL OR t.month = $3)
            GROUP BY t.id
            ORDER BY t.year DESC, t.month DESC, t.user_id
            "#,
        )
        .bind(query.user_id)
        .bind(query.year)
        .bind(query.month)
        .fetch_all(pool)
        .await?;

        let today = self.clock.today();
        Ok(rows
            .into_iter()
            .map(|row| TargetResponse {
                is_overdue: is_overdue(&row.target, today),
                achievement_rate: achievement_rate(row.achieved_amount, row.target.target_amount),
                achieved_amount: row.achieved_amount,
                contract_count: row.contract_count,
                target: row.target,
            })
            .collect())
    }

    /// Records a contract against the actor's active target for the current month.
    pub async fn create_rental_contract(
        &self,
        pool: &PgPool,
        request: &CreateRentalContractRequest,
        actor: Uuid,
    ) -> AppResult<RentalContract> {
        validate_contract(request)?;
        let today = self.clock.today();
        let current = YearMonth::of(today);

        let mut tx = pool.begin().await?;

        let target = sqlx::query_as::<_, Target>(
            r#"
            SELECT * FROM targets
            WHERE user_id = $1 AND year = $2 AND month = $3
            FOR SHARE
            "#,
        )
        .bind(actor)
        .bind(current.year)
        .bind(current.month as i32)
        .fetch_optional(&mut *tx)
        .await?;

        let target_id = admit_contract(actor, target.as_ref(), today)?;

        let contract = sqlx::query_as::<_, RentalContract>(
            r#"
            INSERT INTO rental_contracts (
                target_id, customer_name, customer_number, building_address, contract_date,
                agent_fee, ad_fee, contract_type, contract_terms, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(target_id)
        .bind(request.customer_name.trim())
        .bind(&request.customer_number)
        .bind(request.building_address.trim())
        .bind(request.contract_date)
        .bind(request.agent_fee)
        .bind(request.ad_fee)
        .bind(request.contract_type)
        .bind(&request.contract_terms)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Rental contract {} recorded against target {} by {}",
            contract.id,
            target_id,
            actor
        );
        Ok(contract)
    }

    pub async fn list_contracts(
        &self,
        pool: &PgPool,
        target_id: Uuid,
    ) -> AppResult<Vec<RentalContract>> {
        let contracts = sqlx::query_as::<_, RentalContract>(
            "SELECT * FROM rental_contracts WHERE target_id = $1 ORDER BY contract_date DESC",
        )
        .bind(target_id)
        .fetch_all(pool)
        .await?;
        Ok(contracts)
    }
}

async fn insert_target<'e, E>(
    executor: E,
    user_id: Uuid,
    period: YearMonth,
    target_amount: Decimal,
    status: TargetStatus,
    description: Option<&str>,
    actor: Uuid,
) -> AppResult<Target>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query_as::<_, Target>(
        r#"
        INSERT INTO targets (user_id, year, month, target_amount, status, description, created_by, updated_by)
        SELECT $1, $2, $3, $4, $5, $6, $7, $7
        WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(period.year)
    .bind(period.month as i32)
    .bind(target_amount)
    .bind(status)
    .bind(description)
    .bind(actor)
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        on_unique_violation(e, || {
            AppError::Duplicate(format!(
                "Target already exists for user {} in {}",
                user_id, period
            ))
        })
    })?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}
