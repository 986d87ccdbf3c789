use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{on_unique_violation, AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    CreateHostelRequest, CreateUnitRequest, Hostel, PaginationQuery, Unit, UnitKind,
};
use crate::utils::validators::sanitize_string;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_hostels).post(create_hostel))
        .route("/:id", get(get_hostel))
        .route("/:id/units", get(list_units).post(create_unit))
}

/// Register a hostel with its fee schedule
#[utoipa::path(
    post,
    path = "/api/v1/hostels",
    tag = "hostels",
    security(("bearer_auth" = [])),
    request_body = CreateHostelRequest,
    responses(
        (status = 200, description = "Hostel created", body = Hostel),
        (status = 409, description = "Hostel name already used"),
        (status = 422, description = "Invalid fee schedule")
    )
)]
pub async fn create_hostel(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateHostelRequest>,
) -> AppResult<Json<Hostel>> {
    payload.validate()?;
    payload.validate_fees()?;

    let hostel = sqlx::query_as::<_, Hostel>(
        r#"
        INSERT INTO hostels (
            name, hostel_type, total_rooms, address, contract_start_date, contract_end_date,
            deposit_fee, initial_fee, internet_fee, utilities_fee, rent, created_by, updated_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        RETURNING *
        "#,
    )
    .bind(sanitize_string(&payload.name))
    .bind(payload.hostel_type)
    .bind(payload.total_rooms)
    .bind(sanitize_string(&payload.address))
    .bind(payload.contract_start_date)
    .bind(payload.contract_end_date)
    .bind(payload.deposit_fee)
    .bind(payload.initial_fee)
    .bind(payload.internet_fee)
    .bind(payload.utilities_fee)
    .bind(payload.rent)
    .bind(auth_user.user_id)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        on_unique_violation(e, || {
            AppError::Duplicate("A hostel with this name already exists".to_string())
        })
    })?;

    tracing::info!("Hostel {} ({}) created", hostel.id, hostel.name);
    Ok(Json(hostel))
}

/// List hostels
#[utoipa::path(
    get,
    path = "/api/v1/hostels",
    tag = "hostels",
    security(("bearer_auth" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Hostels", body = Vec<Hostel>)
    )
)]
pub async fn list_hostels(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<Vec<Hostel>>> {
    let (limit, offset) = query.limit_offset();
    let search_pattern = query.query.as_ref().map(|q| format!("%{}%", q.trim()));

    let hostels = sqlx::query_as::<_, Hostel>(
        r#"
        SELECT * FROM hostels
        WHERE ($1::varchar IS NULL OR name ILIKE $1 OR address ILIKE $1)
        ORDER BY name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(hostels))
}

/// Get a hostel by ID
#[utoipa::path(
    get,
    path = "/api/v1/hostels/{id}",
    tag = "hostels",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Hostel ID")
    ),
    responses(
        (status = 200, description = "Hostel", body = Hostel),
        (status = 404, description = "Hostel not found")
    )
)]
pub async fn get_hostel(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Hostel>> {
    let hostel = sqlx::query_as::<_, Hostel>("SELECT * FROM hostels WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Hostel not found".to_string()))?;

    Ok(Json(hostel))
}

/// Add a unit (bedroom or facility) to a hostel
#[utoipa::path(
    post,
    path = "/api/v1/hostels/{id}/units",
    tag = "hostels",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Hostel ID")
    ),
    request_body = CreateUnitRequest,
    responses(
        (status = 200, description = "Unit created", body = Unit),
        (status = 404, description = "Hostel not found"),
        (status = 409, description = "Unit already exists"),
        (status = 422, description = "Missing room number, bed count or unit identifier")
    )
)]
pub async fn create_unit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(hostel_id): Path<Uuid>,
    Json(payload): Json<CreateUnitRequest>,
) -> AppResult<Json<Unit>> {
    let kind = payload.kind()?;

    let unit = insert_unit(&state.pool, hostel_id, &kind, auth_user.user_id).await?;
    Ok(Json(unit))
}

/// Room numbers are unique among a hostel's bedrooms, unit ids among the rest.
pub(crate) async fn insert_unit(
    pool: &PgPool,
    hostel_id: Uuid,
    kind: &UnitKind,
    actor: Uuid,
) -> AppResult<Unit> {
    let (room_num, num_of_beds, unit_id) = match kind {
        UnitKind::Bedroom {
            room_num,
            num_of_beds,
        } => (Some(room_num.as_str()), Some(*num_of_beds), None),
        UnitKind::Facility { unit_id, .. } => (None, None, Some(unit_id.as_str())),
    };

    sqlx::query_as::<_, Unit>(
        r#"
        INSERT INTO units (hostel_id, unit_type, room_num, num_of_beds, unit_id, created_by, updated_by)
        SELECT $1, $2, $3, $4, $5, $6, $6
        WHERE EXISTS (SELECT 1 FROM hostels WHERE id = $1)
        RETURNING *
        "#,
    )
    .bind(hostel_id)
    .bind(kind.unit_type())
    .bind(room_num)
    .bind(num_of_beds)
    .bind(unit_id)
    .bind(actor)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        on_unique_violation(e, || match kind {
            UnitKind::Bedroom { room_num, .. } => {
                AppError::Duplicate(format!("Room {} already exists in the hostel", room_num))
            }
            UnitKind::Facility { unit_id, .. } => {
                AppError::Duplicate(format!("Unit {} already exists in the hostel", unit_id))
            }
        })
    })?
    .ok_or_else(|| AppError::NotFound("Hostel not found".to_string()))
}

/// List units of a hostel
#[utoipa::path(
    get,
    path = "/api/v1/hostels/{id}/units",
    tag = "hostels",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Hostel ID")
    ),
    responses(
        (status = 200, description = "Units", body = Vec<Unit>)
    )
)]
pub async fn list_units(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(hostel_id): Path<Uuid>,
) -> AppResult<Json<Vec<Unit>>> {
    let units = sqlx::query_as::<_, Unit>(
        r#"
        SELECT * FROM units
        WHERE hostel_id = $1
        ORDER BY unit_type, room_num NULLS LAST, unit_id NULLS LAST
        "#,
    )
    .bind(hostel_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::models::UnitType;

    fn facility(unit_type: UnitType, unit_id: &str) -> UnitKind {
        UnitKind::Facility {
            unit_type,
            unit_id: unit_id.to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_unit_id_is_unique_across_facility_types(pool: PgPool) {
        let actor = fixtures::user(&pool, true).await;
        let hostel_id = fixtures::hostel(&pool).await;

        insert_unit(&pool, hostel_id, &facility(UnitType::Kitchen, "K1"), actor)
            .await
            .unwrap();
        let err = insert_unit(&pool, hostel_id, &facility(UnitType::Bathroom, "K1"), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));

        // bedroom room numbers live in their own namespace
        let bedroom = UnitKind::Bedroom {
            room_num: "K1".to_string(),
            num_of_beds: 2,
        };
        insert_unit(&pool, hostel_id, &bedroom, actor).await.unwrap();

        // another hostel may reuse the id
        let other = fixtures::hostel(&pool).await;
        insert_unit(&pool, other, &facility(UnitType::Bathroom, "K1"), actor)
            .await
            .unwrap();

        assert_eq!(fixtures::count(&pool, "units").await, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_unit_for_unknown_hostel_is_not_found(pool: PgPool) {
        let actor = fixtures::user(&pool, true).await;
        let err = insert_unit(&pool, Uuid::new_v4(), &facility(UnitType::Toilet, "T1"), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
