use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{on_unique_violation, AppError, AppResult};
use crate::models::{CreateUserRequest, User};
use crate::utils::validators::validate_email_domain;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
}

pub struct AuthService {
    config: Config,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Token lifetime in seconds. Sessions expire after this much idle time.
    pub fn session_seconds(&self) -> i64 {
        self.config.session_idle_minutes * 60
    }

    pub fn generate_access_token(&self, user_id: Uuid, is_staff: bool) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.session_seconds());

        let claims = Claims {
            sub: user_id.to_string(),
            is_staff,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(AppError::from)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Emails outside the back-office domain are rejected before any lookup.
    pub fn check_email_domain(&self, email: &str) -> AppResult<()> {
        if !validate_email_domain(email, &self.config.allowed_email_domain) {
            return Err(AppError::validation(
                "email",
                format!("email must end with {}", self.config.allowed_email_domain),
            ));
        }
        Ok(())
    }

    pub async fn login(&self, pool: &PgPool, email: &str, password: &str) -> AppResult<User> {
        self.check_email_domain(email)?;

        let user = Self::get_user_by_email(pool, email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active || !verify_password(password, &user.password_hash)? {
            tracing::warn!("Rejected login for {}", email);
            return Err(AppError::Unauthorized);
        }

        tracing::info!("User {} logged in", user.id);
        Ok(user)
    }

    pub async fn create_user(
        &self,
        pool: &PgPool,
        request: &CreateUserRequest,
        actor: Uuid,
    ) -> AppResult<User> {
        self.check_email_domain(&request.email)?;
        let password_hash = hash_password(&request.password)?;

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_staff, created_by, updated_by)
            VALUES (lower($1), $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(request.email.trim())
        .bind(password_hash)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.is_staff)
        .bind(actor)
        .fetch_one(pool)
        .await
        .map_err(|e| on_unique_violation(e, || AppError::Duplicate("email".to_string())))
    }

    /// Creates the first staff user from configuration when the user table is empty.
    pub async fn ensure_bootstrap_admin(&self, pool: &PgPool) -> AppResult<()> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        self.check_email_domain(email)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_staff)
            VALUES (lower($1), $2, 'Admin', 'Admin', true)
            RETURNING *
            "#,
        )
        .bind(email.trim())
        .bind(hash_password(password)?)
        .fetch_one(pool)
        .await?;

        tracing::info!("Bootstrap staff user {} created", user.email);
        Ok(())
    }

    pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_user_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = lower($1)")
            .bind(email.trim())
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::for_tests()
    }

    #[test]
    fn test_token_round_trip_keeps_privilege() {
        let service = AuthService::new(config());
        let user_id = Uuid::new_v4();

        let token = service.generate_access_token(user_id, true).unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.is_staff);
        assert_eq!(claims.exp - claims.iat, 20 * 60);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = AuthService::new(config())
            .generate_access_token(Uuid::new_v4(), false)
            .unwrap();

        let mut other = config();
        other.jwt_secret = "another-secret".to_string();
        assert!(AuthService::new(other).verify_token(&token).is_err());
    }

    #[test]
    fn test_email_domain_is_enforced() {
        let service = AuthService::new(config());
        assert!(service.check_email_domain("clerk@hostel.local").is_ok());
        assert!(matches!(
            service.check_email_domain("clerk@example.com").unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }
}
