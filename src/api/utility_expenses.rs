use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    page_window, CreateUtilityExpenseRequest, UtilityExpense, UtilityExpenseQuery,
};
use crate::utils::validators::{validate_money, validate_month, validate_year};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_expenses).post(create_expense))
}

/// Record a paid utility bill for a hostel
#[utoipa::path(
    post,
    path = "/api/v1/utility-expenses",
    tag = "utilities",
    security(("bearer_auth" = [])),
    request_body = CreateUtilityExpenseRequest,
    responses(
        (status = 200, description = "Expense recorded", body = UtilityExpense),
        (status = 404, description = "Hostel not found"),
        (status = 422, description = "Invalid period or amount")
    )
)]
pub async fn create_expense(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUtilityExpenseRequest>,
) -> AppResult<Json<UtilityExpense>> {
    validate_year("billing_year", payload.billing_year)?;
    validate_month("billing_month", payload.billing_month)?;
    validate_money("amount", payload.amount)?;

    let expense = sqlx::query_as::<_, UtilityExpense>(
        r#"
        INSERT INTO utility_expenses (
            hostel_id, expense_type, billing_year, billing_month, amount, memo, created_by, updated_by
        )
        SELECT $1, $2, $3, $4, $5, $6, $7, $7
        WHERE EXISTS (SELECT 1 FROM hostels WHERE id = $1)
        RETURNING *
        "#,
    )
    .bind(payload.hostel_id)
    .bind(payload.expense_type)
    .bind(payload.billing_year)
    .bind(payload.billing_month as i32)
    .bind(payload.amount)
    .bind(payload.memo.as_deref().map(str::trim).filter(|m| !m.is_empty()))
    .bind(auth_user.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Hostel not found".to_string()))?;

    tracing::info!(
        "{} bill {}-{:02} recorded for hostel {}",
        expense.expense_type.label(),
        expense.billing_year,
        expense.billing_month,
        expense.hostel_id
    );
    Ok(Json(expense))
}

/// List utility expenses
#[utoipa::path(
    get,
    path = "/api/v1/utility-expenses",
    tag = "utilities",
    security(("bearer_auth" = [])),
    params(UtilityExpenseQuery),
    responses(
        (status = 200, description = "Expenses", body = Vec<UtilityExpense>)
    )
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<UtilityExpenseQuery>,
) -> AppResult<Json<Vec<UtilityExpense>>> {
    let (limit, offset) = page_window(query.page, query.limit);

    let expenses = sqlx::query_as::<_, UtilityExpense>(
        r#"
        SELECT * FROM utility_expenses
        WHERE ($1::uuid IS NULL OR hostel_id = $1)
          AND ($2::expense_type IS NULL OR expense_type = $2)
          AND ($3::int IS NULL OR billing_year = $3)
        ORDER BY billing_year DESC, billing_month DESC, expense_type
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(query.hostel_id)
    .bind(query.expense_type)
    .bind(query.billing_year)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(expenses))
}
