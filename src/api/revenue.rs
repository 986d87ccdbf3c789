use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{page_window, PostRevenueRequest, RevenueEntry, RevenueQuery};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_revenue).post(post_revenue))
}

/// Post a registration fee or a monthly rent to the ledger
///
/// At most one entry per (kind, customer, year, month). The back office is
/// notified after the entry is stored; notification failures never undo it.
#[utoipa::path(
    post,
    path = "/api/v1/revenue",
    tag = "revenue",
    security(("bearer_auth" = [])),
    request_body = PostRevenueRequest,
    responses(
        (status = 200, description = "Entry posted", body = RevenueEntry),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Entry already posted for this month"),
        (status = 422, description = "Invalid amounts, or a discount without a memo")
    )
)]
pub async fn post_revenue(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<PostRevenueRequest>,
) -> AppResult<Json<RevenueEntry>> {
    let entry = match &payload {
        PostRevenueRequest::RegistrationFee(input) => {
            state
                .revenue
                .post_registration_fee(&state.pool, input, auth_user.user_id)
                .await?
        }
        PostRevenueRequest::Rent(input) => {
            state
                .revenue
                .post_rent(&state.pool, input, auth_user.user_id)
                .await?
        }
    };

    Ok(Json(entry))
}

/// List ledger entries
#[utoipa::path(
    get,
    path = "/api/v1/revenue",
    tag = "revenue",
    security(("bearer_auth" = [])),
    params(RevenueQuery),
    responses(
        (status = 200, description = "Ledger entries", body = Vec<RevenueEntry>)
    )
)]
pub async fn list_revenue(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<RevenueQuery>,
) -> AppResult<Json<Vec<RevenueEntry>>> {
    let (limit, offset) = page_window(query.page, query.limit);

    let entries = sqlx::query_as::<_, RevenueEntry>(
        r#"
        SELECT * FROM revenue_entries
        WHERE ($1::uuid IS NULL OR customer_id = $1)
          AND ($2::revenue_kind IS NULL OR kind = $2)
          AND ($3::int IS NULL OR year = $3)
          AND ($4::int IS NULL OR month = $4)
        ORDER BY year DESC, month DESC, created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(query.customer_id)
    .bind(query.kind)
    .bind(query.year)
    .bind(query.month)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(entries))
}
