use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{LoginRequest, TokenResponse, UserPublic};
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
}

/// Sign in with a back-office email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Wrong credentials or inactive user"),
        (status = 422, description = "Email outside the allowed domain")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    payload.validate()?;

    let auth_service = AuthService::new(state.config.clone());
    let user = auth_service
        .login(&state.pool, &payload.email, &payload.password)
        .await?;

    let access_token = auth_service.generate_access_token(user.id, user.is_staff)?;

    Ok(Json(TokenResponse {
        access_token,
        expires_in: auth_service.session_seconds(),
        user: UserPublic::from(user),
    }))
}

/// Re-issue the access token, sliding the idle window
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New token", body = TokenResponse),
        (status = 401, description = "Session expired")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<TokenResponse>> {
    let user = AuthService::get_user_by_id(&state.pool, auth_user.user_id).await?;
    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let auth_service = AuthService::new(state.config.clone());
    let access_token = auth_service.generate_access_token(user.id, user.is_staff)?;

    Ok(Json(TokenResponse {
        access_token,
        expires_in: auth_service.session_seconds(),
        user: UserPublic::from(user),
    }))
}
