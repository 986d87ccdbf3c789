use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_idle_minutes: i64,
    pub allowed_email_domain: String,
    pub local_utc_offset_hours: i32,
    pub mail_enabled: bool,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_sender: String,
    pub mail_recipient: String,
    pub mail_timeout_secs: u64,
    pub minio_endpoint: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_bucket: String,
    pub minio_public_url: Option<String>,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            allowed_email_domain: env::var("ALLOWED_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "@hostel.local".to_string()),
            local_utc_offset_hours: env::var("LOCAL_UTC_OFFSET_HOURS")
                .unwrap_or_else(|_| "9".to_string())
                .parse()
                .unwrap_or(9),
            mail_enabled: env::var("MAIL_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_sender: env::var("MAIL_SENDER")
                .unwrap_or_else(|_| "noreply@hostel.local".to_string()),
            mail_recipient: env::var("MAIL_RECIPIENT")
                .unwrap_or_else(|_| "office@hostel.local".to_string()),
            mail_timeout_secs: env::var("MAIL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            minio_endpoint: env::var("MINIO_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            minio_access_key: env::var("MINIO_ACCESS_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            minio_secret_key: env::var("MINIO_SECRET_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            minio_bucket: env::var("MINIO_BUCKET").unwrap_or_else(|_| "hostel".to_string()),
            minio_public_url: env::var("MINIO_PUBLIC_URL").ok(),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/hostel".to_string(),
            jwt_secret: "test-secret".to_string(),
            session_idle_minutes: 20,
            allowed_email_domain: "@hostel.local".to_string(),
            local_utc_offset_hours: 9,
            mail_enabled: false,
            mail_api_url: String::new(),
            mail_api_key: String::new(),
            mail_sender: "noreply@hostel.local".to_string(),
            mail_recipient: "office@hostel.local".to_string(),
            mail_timeout_secs: 10,
            minio_endpoint: "http://localhost:9000".to_string(),
            minio_access_key: "minioadmin".to_string(),
            minio_secret_key: "minioadmin".to_string(),
            minio_bucket: "hostel".to_string(),
            minio_public_url: None,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}
