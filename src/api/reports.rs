use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::services::defaulter_service::{load_defaulters, Defaulter};
use crate::services::utility_status_service::{load_utility_status, UtilityStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/defaulters", get(defaulters))
        .route("/utility-status", get(utility_status))
}

/// Customers with unpaid rent months, current and past tenures
#[utoipa::path(
    get,
    path = "/api/v1/reports/defaulters",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Defaulters ordered by customer and tenure", body = Vec<Defaulter>)
    )
)]
pub async fn defaulters(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<Defaulter>>> {
    let report = load_defaulters(&state.pool, state.clock.today()).await?;
    Ok(Json(report))
}

/// Hostels with unpaid utility bills
#[utoipa::path(
    get,
    path = "/api/v1/reports/utility-status",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Hostels with at least one unpaid bill", body = Vec<UtilityStatus>)
    )
)]
pub async fn utility_status(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<UtilityStatus>>> {
    let report = load_utility_status(&state.pool, state.clock.today()).await?;
    Ok(Json(report))
}
