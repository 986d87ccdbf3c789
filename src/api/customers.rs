use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{on_unique_violation, AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    page_window, CreateCustomerRequest, Customer, CustomerDocumentKind, CustomersQuery,
    UpdateCustomerStatusRequest,
};
use crate::utils::validators::{sanitize_string, validate_phone};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer))
        .route("/:id/status", put(update_customer_status))
        .route("/:id/documents", post(upload_document))
}

/// Register a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = Customer),
        (status = 409, description = "An active customer with this name and birth date exists"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> AppResult<Json<Customer>> {
    payload.validate()?;
    if !validate_phone(payload.phone.trim()) {
        return Err(AppError::validation("phone", "invalid phone number"));
    }

    let customer = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (
            name, date_of_birth, email, phone, address, nationality, visa_type,
            residence_card_number, residence_card_expiry, created_by, updated_by
        )
        VALUES ($1, $2, $3, $4, $5, upper($6), $7, $8, $9, $10, $10)
        RETURNING *
        "#,
    )
    .bind(sanitize_string(&payload.name))
    .bind(payload.date_of_birth)
    .bind(payload.email.as_deref().map(sanitize_string))
    .bind(sanitize_string(&payload.phone))
    .bind(payload.address.as_deref().map(sanitize_string))
    .bind(sanitize_string(&payload.nationality))
    .bind(payload.visa_type)
    .bind(sanitize_string(&payload.residence_card_number))
    .bind(payload.residence_card_expiry)
    .bind(auth_user.user_id)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        on_unique_violation(e, || {
            AppError::Duplicate(
                "An active customer with this name and date of birth already exists".to_string(),
            )
        })
    })?;

    tracing::info!("Customer {} registered", customer.id);
    Ok(Json(customer))
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(CustomersQuery),
    responses(
        (status = 200, description = "Customers", body = Vec<Customer>)
    )
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<CustomersQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let (limit, offset) = page_window(query.page, query.limit);
    let search_pattern = query.query.as_ref().map(|q| format!("%{}%", q.trim()));

    let customers = sqlx::query_as::<_, Customer>(
        r#"
        SELECT * FROM customers
        WHERE ($1::boolean IS NULL OR active = $1)
          AND ($2::varchar IS NULL OR name ILIKE $2 OR phone ILIKE $2)
        ORDER BY name, date_of_birth
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.active)
    .bind(&search_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(customers))
}

/// Get a customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn get_customer(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let customer = fetch_customer(&state, id).await?;
    Ok(Json(customer))
}

/// Activate or deactivate a customer
///
/// Reactivation needs staff privilege and is refused while the customer
/// still holds a bed.
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}/status",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    request_body = UpdateCustomerStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Customer),
        (status = 403, description = "Staff privilege required"),
        (status = 409, description = "Customer holds a bed or another active record exists")
    )
)]
pub async fn update_customer_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerStatusRequest>,
) -> AppResult<Json<Customer>> {
    if payload.active {
        auth_user.require_staff()?;
    }

    let mut tx = state.pool.begin().await?;

    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let held_bed: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM beds WHERE customer_id = $1")
        .bind(customer.id)
        .fetch_optional(&mut *tx)
        .await?;
    check_status_change(customer.active, payload.active, held_bed.is_some())?;

    let customer = sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers SET active = $2, updated_at = NOW(), updated_by = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(customer.id)
    .bind(payload.active)
    .bind(auth_user.user_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        on_unique_violation(e, || {
            AppError::Duplicate(
                "An active customer with this name and date of birth already exists".to_string(),
            )
        })
    })?;

    tx.commit().await?;

    tracing::info!(
        "Customer {} set {} by {}",
        customer.id,
        if customer.active { "active" } else { "inactive" },
        auth_user.user_id
    );
    Ok(Json(customer))
}

/// While a customer holds a bed their active flag belongs to the occupancy
/// engine: only a rollover turns it off.
pub(crate) fn check_status_change(
    current: bool,
    requested: bool,
    holds_bed: bool,
) -> AppResult<()> {
    if holds_bed && current != requested {
        return Err(AppError::CustomerHoldsBed);
    }
    Ok(())
}

/// Upload a passport or residence card scan
///
/// Multipart fields: `kind` (`passport` | `residence_card`) and `file`
/// (pdf, jpeg or png).
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/documents",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Document stored", body = Customer),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "Unsupported file type or size"),
        (status = 502, description = "Blob store unavailable")
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<Customer>> {
    let customer = fetch_customer(&state, id).await?;

    let mut kind: Option<CustomerDocumentKind> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "kind" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                kind = Some(parse_document_kind(&text)?);
            }
            "file" => {
                let content_type = field
                    .content_type()
                    .ok_or_else(|| AppError::validation("file", "missing content type"))?
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| AppError::validation("kind", "document kind is required"))?;
    let (content_type, data) =
        file.ok_or_else(|| AppError::validation("file", "file is required"))?;

    let url = state
        .files
        .upload_document(&format!("customers/{}", customer.id), &content_type, data)
        .await?;

    let sql = format!(
        "UPDATE customers SET {} = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1 RETURNING *",
        kind.column()
    );
    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(customer.id)
        .bind(&url)
        .bind(auth_user.user_id)
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(customer))
}

fn parse_document_kind(value: &str) -> AppResult<CustomerDocumentKind> {
    match value.trim() {
        "passport" => Ok(CustomerDocumentKind::Passport),
        "residence_card" => Ok(CustomerDocumentKind::ResidenceCard),
        _ => Err(AppError::validation(
            "kind",
            "kind must be passport or residence_card",
        )),
    }
}

async fn fetch_customer(state: &AppState, id: Uuid) -> AppResult<Customer> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}
