use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::{CreateUserRequest, PaginationQuery, User, UserPublic};
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_me))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserPublic),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserPublic>> {
    let user = AuthService::get_user_by_id(&state.pool, auth_user.user_id).await?;
    Ok(Json(UserPublic::from(user)))
}

/// Create a back-office user (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserPublic),
        (status = 403, description = "Staff privilege required"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserPublic>> {
    auth_user.require_staff()?;
    payload.validate()?;

    let user = AuthService::new(state.config.clone())
        .create_user(&state.pool, &payload, auth_user.user_id)
        .await?;

    tracing::info!("User {} created by {}", user.id, auth_user.user_id);
    Ok(Json(UserPublic::from(user)))
}

/// List back-office users (staff only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserPublic>),
        (status = 403, description = "Staff privilege required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<Vec<UserPublic>>> {
    auth_user.require_staff()?;
    let (limit, offset) = query.limit_offset();
    let search_pattern = query.query.as_ref().map(|q| format!("%{}%", q.trim()));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE ($1::varchar IS NULL OR email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1)
        ORDER BY email
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}
