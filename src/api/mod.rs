pub mod auth;
pub mod beds;
pub mod customers;
pub mod hostels;
pub mod reports;
pub mod revenue;
pub mod targets;
pub mod users;
pub mod utility_expenses;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/hostels", hostels::routes())
        .nest("/customers", customers::routes())
        .nest("/revenue", revenue::routes())
        .nest("/utility-expenses", utility_expenses::routes())
        .nest("/reports", reports::routes())
        .merge(beds::routes())
        .merge(targets::routes())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        middleware as axum_middleware,
    };
    use chrono::NaiveDate;
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::fixtures;
    use crate::middleware::auth_middleware;
    use crate::services::{
        AuthService, Clock, FileService, FixedClock, HttpMailSink, Notifier, OccupancyService,
        RevenueService, TargetService,
    };

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy(&Config::for_tests().database_url)
            .unwrap();
        app_on(pool)
    }

    fn app_on(pool: PgPool) -> Router {
        let config = Config::for_tests();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        ));
        let notifier = Notifier::new(
            Arc::new(HttpMailSink::new(config.clone())),
            config.mail_recipient.clone(),
            Duration::from_secs(1),
        );
        let state = AppState {
            pool,
            config: config.clone(),
            clock: clock.clone(),
            occupancy: Arc::new(OccupancyService::new(clock.clone())),
            revenue: Arc::new(RevenueService::new(notifier)),
            targets: Arc::new(TargetService::new(clock)),
            files: Arc::new(FileService::new(&config)),
        };

        routes()
            .layer(axum_middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state)
    }

    fn token(is_staff: bool) -> String {
        token_for(Uuid::new_v4(), is_staff)
    }

    fn token_for(user_id: Uuid, is_staff: bool) -> String {
        AuthService::new(Config::for_tests())
            .generate_access_token(user_id, is_staff)
            .unwrap()
    }

    fn set_status(customer_id: Uuid, active: bool, token: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(format!("/customers/{}/status", customer_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "active": active }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/users/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forged_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/reports/defaulters")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_target_creation_requires_staff() {
        let body = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "year": 2025,
            "month": 3,
            "target_amount": "300000"
        });

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/targets")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token(false)))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_customer_reactivation_requires_staff() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/customers/{}/status", Uuid::new_v4()))
                    .header(header::AUTHORIZATION, format!("Bearer {}", token(false)))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"active": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_customer_on_a_bed_cannot_be_deactivated(pool: PgPool) {
        let clerk = fixtures::user(&pool, false).await;
        let manager = fixtures::user(&pool, true).await;
        let hostel_id = fixtures::hostel(&pool).await;
        let unit_id = fixtures::bedroom(&pool, hostel_id, "101").await;
        let bed_id = fixtures::bed(&pool, unit_id, "1").await;
        let customer_id = fixtures::customer(&pool, "Ngo").await;

        OccupancyService::new(Arc::new(FixedClock::at(fixtures::date(2025, 3, 5))))
            .assign_bed(&pool, bed_id, customer_id, fixtures::date(2025, 1, 15), clerk)
            .await
            .unwrap();

        let response = app_on(pool.clone())
            .oneshot(set_status(customer_id, false, &token_for(clerk, false)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let (active,): (bool,) = sqlx::query_as("SELECT active FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(active);

        // once the bed is gone the flag is free to change
        sqlx::query("UPDATE beds SET customer_id = NULL, assigned_date = NULL WHERE id = $1")
            .bind(bed_id)
            .execute(&pool)
            .await
            .unwrap();
        let response = app_on(pool.clone())
            .oneshot(set_status(customer_id, false, &token_for(manager, true)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
