use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Blob store for customer identity documents. Every upload gets a fresh key,
/// so stored objects are never overwritten.
pub struct FileService {
    client: Client,
    bucket: String,
    public_url: Option<String>,
}

impl FileService {
    pub fn new(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.minio_access_key,
            &config.minio_secret_key,
            None,
            None,
            "hostel-backoffice",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .endpoint_url(&config.minio_endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.minio_bucket.clone(),
            public_url: config.minio_public_url.clone(),
        }
    }

    pub async fn upload_document(
        &self,
        folder: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> AppResult<String> {
        let extension = document_extension(content_type).ok_or_else(|| {
            AppError::validation("file", "only pdf, jpeg and png documents are accepted")
        })?;
        if data.is_empty() {
            return Err(AppError::validation("file", "file is empty"));
        }
        if data.len() > MAX_DOCUMENT_SIZE {
            return Err(AppError::validation("file", "file exceeds 10MB"));
        }

        let key = format!("{}/{}.{}", folder, Uuid::new_v4(), extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::File(e.to_string()))?;

        tracing::debug!("Stored document {}", key);
        Ok(self.url_for(&key))
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_url {
            Some(base_url) => format!("{}/{}/{}", base_url.trim_end_matches('/'), self.bucket, key),
            None => format!("/{}/{}", self.bucket, key),
        }
    }
}

pub fn document_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "application/pdf" => Some("pdf"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}
