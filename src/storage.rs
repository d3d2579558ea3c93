use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Lifetime of a presigned upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Credential documents trainers may upload: certifications and a government id.
pub const ALLOWED_DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// Largest credential document accepted, 5 MiB.
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

/// StorageService
///
/// Object storage for trainer credential documents. The browser uploads directly to the
/// bucket with a presigned URL; this service only signs.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if it is missing. Only called for local MinIO.
    async fn ensure_bucket_exists(&self);

    /// A time-limited PUT URL for `key`, bound to `content_type` and `content_length`.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> Result<String, String>;
}

/// S3StorageClient
///
/// `aws-sdk-s3` against MinIO locally or Supabase Storage's S3 gateway in production.
/// Both need path-style addressing.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket fails harmlessly.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?;
        let content_length = i64::try_from(content_length).map_err(|e| e.to_string())?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            .content_type(content_type)
            .content_length(content_length)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a client-supplied name cannot escape its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// document_key
///
/// Object key for a new credential document of `trainer_id`:
/// `trainers/{id}/documents/{random}.{ext}`. Only the extension of the original
/// filename survives, lowercased and restricted to alphanumerics.
pub fn document_key(trainer_id: Uuid, filename: &str) -> String {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    sanitize_key(&format!(
        "trainers/{}/documents/{}.{}",
        trainer_id,
        Uuid::new_v4(),
        extension
    ))
}

/// MockStorageService
///
/// Deterministic in-memory signer for tests.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?content-type={}&content-length={}&signature=fake",
            sanitize_key(key),
            content_type,
            content_length
        ))
    }
}

pub type StorageState = Arc<dyn StorageService>;
