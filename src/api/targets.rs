use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    BulkAssignTargetsRequest, CreateRentalContractRequest, CreateTargetRequest,
    RentalContractResponse, Target, TargetResponse, TargetsQuery, UpdateTargetStatusRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/targets", get(list_targets).post(create_target))
        .route("/targets/bulk", post(bulk_assign_targets))
        .route("/targets/:id/status", put(update_target_status))
        .route("/targets/:id/contracts", get(list_contracts))
        .route("/rental-contracts", post(create_rental_contract))
}

/// Set a monthly sales target for a user (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/targets",
    tag = "targets",
    security(("bearer_auth" = [])),
    request_body = CreateTargetRequest,
    responses(
        (status = 200, description = "Target created", body = Target),
        (status = 403, description = "Staff privilege required"),
        (status = 409, description = "User already has a target for that month")
    )
)]
pub async fn create_target(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateTargetRequest>,
) -> AppResult<Json<Target>> {
    auth_user.require_staff()?;
    payload.validate()?;

    let target = state
        .targets
        .create_target(&state.pool, &payload, auth_user.user_id)
        .await?;

    Ok(Json(target))
}

/// Give the same target to several users at once (staff only)
///
/// Either every target is created or none is.
#[utoipa::path(
    post,
    path = "/api/v1/targets/bulk",
    tag = "targets",
    security(("bearer_auth" = [])),
    request_body = BulkAssignTargetsRequest,
    responses(
        (status = 200, description = "Targets created", body = Vec<Target>),
        (status = 403, description = "Staff privilege required"),
        (status = 409, description = "One of the users already has a target for that month")
    )
)]
pub async fn bulk_assign_targets(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<BulkAssignTargetsRequest>,
) -> AppResult<Json<Vec<Target>>> {
    auth_user.require_staff()?;

    let targets = state
        .targets
        .bulk_assign(&state.pool, &payload, auth_user.user_id)
        .await?;

    Ok(Json(targets))
}

/// Change a target's status (staff only)
#[utoipa::path(
    put,
    path = "/api/v1/targets/{id}/status",
    tag = "targets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Target ID")
    ),
    request_body = UpdateTargetStatusRequest,
    responses(
        (status = 200, description = "Target updated", body = Target),
        (status = 403, description = "Staff privilege required"),
        (status = 404, description = "Target not found")
    )
)]
pub async fn update_target_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTargetStatusRequest>,
) -> AppResult<Json<Target>> {
    auth_user.require_staff()?;

    let target = state
        .targets
        .update_status(&state.pool, id, payload.status, auth_user.user_id)
        .await?;

    Ok(Json(target))
}

/// Targets with their progress
///
/// Non-staff users only see their own targets.
#[utoipa::path(
    get,
    path = "/api/v1/targets",
    tag = "targets",
    security(("bearer_auth" = [])),
    params(TargetsQuery),
    responses(
        (status = 200, description = "Targets", body = Vec<TargetResponse>)
    )
)]
pub async fn list_targets(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(mut query): Query<TargetsQuery>,
) -> AppResult<Json<Vec<TargetResponse>>> {
    if !auth_user.is_staff {
        query.user_id = Some(auth_user.user_id);
    }

    let targets = state.targets.list_targets(&state.pool, &query).await?;
    Ok(Json(targets))
}

/// Record a rental contract against the caller's active target
#[utoipa::path(
    post,
    path = "/api/v1/rental-contracts",
    tag = "targets",
    security(("bearer_auth" = [])),
    request_body = CreateRentalContractRequest,
    responses(
        (status = 200, description = "Contract recorded", body = RentalContractResponse),
        (status = 403, description = "No active target for the current month"),
        (status = 422, description = "Invalid customer number or fees")
    )
)]
pub async fn create_rental_contract(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateRentalContractRequest>,
) -> AppResult<Json<RentalContractResponse>> {
    payload.validate()?;

    let contract = state
        .targets
        .create_rental_contract(&state.pool, &payload, auth_user.user_id)
        .await?;

    Ok(Json(RentalContractResponse::from(contract)))
}

/// Contracts counted towards a target
#[utoipa::path(
    get,
    path = "/api/v1/targets/{id}/contracts",
    tag = "targets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Target ID")
    ),
    responses(
        (status = 200, description = "Contracts", body = Vec<RentalContractResponse>)
    )
)]
pub async fn list_contracts(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<RentalContractResponse>>> {
    let contracts = state.targets.list_contracts(&state.pool, id).await?;
    Ok(Json(
        contracts
            .into_iter()
            .map(RentalContractResponse::from)
            .collect(),
    ))
}
