use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{on_unique_violation, AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    AssignBedRequest, Bed, BedAssignmentHistory, CreateBedRequest, SetReleasedDateRequest, Unit,
    UnitType,
};
use crate::services::occupancy_service::OccupancyOutcome;
use crate::utils::validators::validate_bed_num;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/units/:id/beds", get(list_beds).post(create_bed))
        .route("/beds/assign", post(assign_bed))
        .route("/beds/release", post(set_released_date))
        .route("/beds/:id/settle", post(settle_bed))
        .route("/beds/:id/history", get(bed_history))
}

/// Add a bed to a bedroom unit
#[utoipa::path(
    post,
    path = "/api/v1/units/{id}/beds",
    tag = "beds",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Bedroom unit ID")
    ),
    request_body = CreateBedRequest,
    responses(
        (status = 200, description = "Bed created", body = Bed),
        (status = 404, description = "Unit not found"),
        (status = 409, description = "Bed number taken"),
        (status = 422, description = "Unit is not a bedroom, is full, or bed number invalid")
    )
)]
pub async fn create_bed(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(unit_id): Path<Uuid>,
    Json(payload): Json<CreateBedRequest>,
) -> AppResult<Json<Bed>> {
    payload.validate()?;
    let bed_num = payload.bed_num.trim();
    if !validate_bed_num(bed_num) {
        return Err(AppError::validation(
            "bed_num",
            "bed number must be alphanumeric",
        ));
    }

    let mut tx = state.pool.begin().await?;

    let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = $1 FOR UPDATE")
        .bind(unit_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit not found".to_string()))?;

    if unit.unit_type != UnitType::Bedroom {
        return Err(AppError::validation(
            "unit_id",
            "beds can only be added to bedrooms",
        ));
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM beds WHERE unit_id = $1")
        .bind(unit.id)
        .fetch_one(&mut *tx)
        .await?;
    if count >= i64::from(unit.num_of_beds.unwrap_or(0)) {
        return Err(AppError::validation(
            "bed_num",
            "the bedroom already has all of its beds",
        ));
    }

    let bed = sqlx::query_as::<_, Bed>(
        r#"
        INSERT INTO beds (unit_id, bed_num, created_by, updated_by)
        VALUES ($1, $2, $3, $3)
        RETURNING *
        "#,
    )
    .bind(unit.id)
    .bind(bed_num)
    .bind(auth_user.user_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        on_unique_violation(e, || {
            AppError::Duplicate(format!("Bed {} already exists in this room", bed_num))
        })
    })?;

    tx.commit().await?;
    Ok(Json(bed))
}

/// List beds of a unit
#[utoipa::path(
    get,
    path = "/api/v1/units/{id}/beds",
    tag = "beds",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Unit ID")
    ),
    responses(
        (status = 200, description = "Beds", body = Vec<Bed>)
    )
)]
pub async fn list_beds(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(unit_id): Path<Uuid>,
) -> AppResult<Json<Vec<Bed>>> {
    let beds = sqlx::query_as::<_, Bed>("SELECT * FROM beds WHERE unit_id = $1 ORDER BY bed_num")
        .bind(unit_id)
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(beds))
}

/// Bind an active customer to an empty bed
#[utoipa::path(
    post,
    path = "/api/v1/beds/assign",
    tag = "beds",
    security(("bearer_auth" = [])),
    request_body = AssignBedRequest,
    responses(
        (status = 200, description = "Bed assigned", body = Bed),
        (status = 404, description = "Bed or customer not found"),
        (status = 409, description = "Bed occupied, customer inactive or already on a bed")
    )
)]
pub async fn assign_bed(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<AssignBedRequest>,
) -> AppResult<Json<Bed>> {
    let bed = state
        .occupancy
        .assign_bed(
            &state.pool,
            payload.bed_id,
            payload.customer_id,
            payload.assigned_date,
            auth_user.user_id,
        )
        .await?;

    Ok(Json(bed))
}

/// Set or clear the release date of an occupied bed
#[utoipa::path(
    post,
    path = "/api/v1/beds/release",
    tag = "beds",
    security(("bearer_auth" = [])),
    request_body = SetReleasedDateRequest,
    responses(
        (status = 200, description = "Release recorded; history is present when the tenure ended", body = OccupancyOutcome),
        (status = 404, description = "Bed not found"),
        (status = 409, description = "Bed has no customer"),
        (status = 422, description = "Release date precedes assignment date")
    )
)]
pub async fn set_released_date(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<SetReleasedDateRequest>,
) -> AppResult<Json<OccupancyOutcome>> {
    let outcome = state
        .occupancy
        .set_released_date(
            &state.pool,
            payload.bed_id,
            payload.released_date,
            auth_user.user_id,
        )
        .await?;

    Ok(Json(outcome))
}

/// Re-save a bed, rolling over a release that has come due
#[utoipa::path(
    post,
    path = "/api/v1/beds/{id}/settle",
    tag = "beds",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Bed ID")
    ),
    responses(
        (status = 200, description = "Bed state after settlement", body = OccupancyOutcome),
        (status = 404, description = "Bed not found")
    )
)]
pub async fn settle_bed(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(bed_id): Path<Uuid>,
) -> AppResult<Json<OccupancyOutcome>> {
    let outcome = state
        .occupancy
        .settle_bed(&state.pool, bed_id, auth_user.user_id)
        .await?;

    Ok(Json(outcome))
}

/// Finished tenures of a bed, newest first
#[utoipa::path(
    get,
    path = "/api/v1/beds/{id}/history",
    tag = "beds",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Bed ID")
    ),
    responses(
        (status = 200, description = "Assignment history", body = Vec<BedAssignmentHistory>)
    )
)]
pub async fn bed_history(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(bed_id): Path<Uuid>,
) -> AppResult<Json<Vec<BedAssignmentHistory>>> {
    let history = sqlx::query_as::<_, BedAssignmentHistory>(
        r#"
        SELECT * FROM bed_assignment_history
        WHERE bed_id = $1
        ORDER BY released_date DESC, assigned_date DESC
        "#,
    )
    .bind(bed_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(history))
}
