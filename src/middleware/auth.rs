use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{
    AuthService, Clock, FileService, OccupancyService, RevenueService, TargetService,
};

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_staff: bool,
}

impl AuthUser {
    /// Elevated privilege is the staff flag.
    pub fn require_staff(&self) -> AppResult<()> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::PrivilegeRequired)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub occupancy: Arc<OccupancyService>,
    pub revenue: Arc<RevenueService>,
    pub targets: Arc<TargetService>,
    pub files: Arc<FileService>,
}

// Makes AppState reachable from extractors
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>().cloned().ok_or_else(|| {
            AppError::Internal("application state missing from request".to_string())
                .into_response()
        })?;

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized.into_response())?;

        let claims = AuthService::new(app_state.config)
            .verify_token(bearer.token())
            .map_err(|_| AppError::Unauthorized.into_response())?;

        if claims.token_type != "access" {
            return Err(AppError::Unauthorized.into_response());
        }

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized.into_response())?;

        Ok(AuthUser {
            user_id,
            is_staff: claims.is_staff,
        })
    }
}
