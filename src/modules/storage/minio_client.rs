//! MinIO/S3-compatible implementation of `FileStorage`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::{FileStorage, FileVisibility};
use crate::core::config::StorageConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Documents and avatars in one bucket, split by the public and private prefixes
pub struct MinIOClient {
    bucket: Box<Bucket>,
    config: StorageConfig,
    http: Client,
}

fn storage_region(config: &StorageConfig) -> Region {
    Region::Custom {
        region: config.region.clone(),
        endpoint: config.endpoint.clone(),
    }
}

fn storage_credentials(config: &StorageConfig) -> Result<Credentials, AppError> {
    Credentials::new(
        Some(&config.access_key),
        Some(&config.secret_key),
        None,
        None,
        None,
    )
    .map_err(|e| AppError::Internal(format!("Invalid storage credentials: {}", e)))
}

/// Anonymous `GetObject` on everything under `{prefix}/`
fn public_read_policy(bucket: &str, prefix: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"AWS": "*"},
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{}/{}/*", bucket, prefix)],
        }],
    })
    .to_string()
}

impl MinIOClient {
    /// Connect, create the bucket if missing and open the public prefix for anonymous reads
    pub async fn new(config: StorageConfig) -> Result<Self, AppError> {
        let mut bucket = Bucket::new(
            &config.bucket,
            storage_region(&config),
            storage_credentials(&config)?,
        )
        .map_err(|e| AppError::Internal(format!("Failed to open storage bucket: {}", e)))?;

        // MinIO serves buckets at endpoint/bucket, not as subdomains
        bucket.set_path_style();

        let http = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build policy client: {}", e)))?;

        let client = Self {
            bucket,
            config,
            http,
        };

        client.ensure_bucket_exists().await?;
        client.open_public_prefix().await;

        info!(
            endpoint = %client.config.endpoint,
            bucket = %client.config.bucket,
            "Object storage ready"
        );

        Ok(client)
    }

    /// Create the bucket unless it is already there. Other creation errors are
    /// logged and startup continues, the first upload surfaces a real problem.
    async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let created = Bucket::create_with_path_style(
            &self.config.bucket,
            storage_region(&self.config),
            storage_credentials(&self.config)?,
            BucketConfiguration::default(),
        )
        .await;

        let Err(e) = created else {
            info!(bucket = %self.config.bucket, "Bucket created");
            return Ok(());
        };

        let message = e.to_string();
        let exists = ["BucketAlreadyOwnedByYou", "BucketAlreadyExists", "already own it"]
            .iter()
            .any(|marker| message.contains(marker));

        if exists {
            debug!(bucket = %self.config.bucket, "Bucket already exists");
        } else {
            warn!(bucket = %self.config.bucket, "Could not create bucket, continuing: {}", e);
        }

        Ok(())
    }

    /// Avatar URLs are served unsigned from the public prefix. A failure here
    /// only degrades avatars, so it is logged rather than fatal.
    async fn open_public_prefix(&self) {
        let bucket = &self.config.bucket;
        let prefix = &self.config.public_prefix;
        let policy = public_read_policy(bucket, prefix);

        match self.put_bucket_policy(&policy).await {
            Ok(()) => info!(bucket = %bucket, "Anonymous reads enabled for {}/*", prefix),
            Err(e) => warn!(
                bucket = %bucket,
                "Could not apply public read policy ({}); run `mc anonymous set download <alias>/{}/{}`",
                e, bucket, prefix
            ),
        }
    }

    /// `PUT /{bucket}?policy`, signed by hand since rust-s3 has no policy call
    async fn put_bucket_policy(&self, policy: &str) -> Result<(), AppError> {
        let endpoint = Url::parse(&self.config.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid storage endpoint: {}", e)))?;
        let host = endpoint
            .host_str()
            .ok_or_else(|| AppError::Internal("Storage endpoint has no host".to_string()))?;
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let signer = PolicySigner {
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
            region: &self.config.region,
        };
        let signed = signer.sign(&host, &self.config.bucket, policy, Utc::now())?;

        let response = self
            .http
            .put(format!(
                "{}/{}?policy",
                self.config.endpoint.trim_end_matches('/'),
                self.config.bucket
            ))
            .header("Host", &host)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Bucket policy request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Internal(format!(
            "Bucket policy rejected: {} {}",
            status, body
        )))
    }

    fn prefix(&self, visibility: FileVisibility) -> &str {
        match visibility {
            FileVisibility::Public => &self.config.public_prefix,
            FileVisibility::Private => &self.config.private_prefix,
        }
    }

    fn is_public_key(&self, key: &str) -> bool {
        key.strip_prefix(self.config.public_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[async_trait]
impl FileStorage for MinIOClient {
    fn object_key(&self, visibility: FileVisibility, path: &str) -> String {
        format!("{}/{}", self.prefix(visibility), path)
    }

    async fn store(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Upload of '{}' failed: {}", key, e)))?;

        debug!(key = %key, size = data.len(), "Stored object");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Removal of '{}' failed: {}", key, e)))?;

        debug!(key = %key, "Removed object");
        Ok(())
    }

    async fn file_url(&self, key: &str) -> Result<String, AppError> {
        if self.is_public_key(key) {
            return Ok(format!(
                "{}/{}/{}",
                self.config.public_endpoint.trim_end_matches('/'),
                self.config.bucket,
                key
            ));
        }

        self.bucket
            .presign_get(key, self.config.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| AppError::Storage(format!("Could not presign '{}': {}", key, e)))
    }
}

/// Headers for one signed bucket-policy request
struct SignedPolicyRequest {
    amz_date: String,
    payload_hash: String,
    authorization: String,
}

/// AWS Signature v4 for the bucket policy subresource
struct PolicySigner<'a> {
    access_key: &'a str,
    secret_key: &'a str,
    region: &'a str,
}

impl PolicySigner<'_> {
    const ALGORITHM: &'static str = "AWS4-HMAC-SHA256";
    const SIGNED_HEADERS: &'static str = "host;x-amz-content-sha256;x-amz-date";

    fn sign(
        &self,
        host: &str,
        bucket_name: &str,
        policy: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedPolicyRequest, AppError> {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let canonical_request = format!(
            "PUT\n/{bucket}\npolicy=\nhost:{host}\nx-amz-content-sha256:{hash}\nx-amz-date:{date}\n\n{signed}\n{hash}",
            bucket = bucket_name,
            host = host,
            hash = payload_hash,
            date = amz_date,
            signed = Self::SIGNED_HEADERS,
        );

        let scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            Self::ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date_stamp)?,
            string_to_sign.as_bytes(),
        )?);

        Ok(SignedPolicyRequest {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                Self::ALGORITHM,
                self.access_key,
                scope,
                Self::SIGNED_HEADERS,
                signature
            ),
            amz_date,
            payload_hash,
        })
    }

    fn signing_key(&self, date_stamp: &str) -> Result<Vec<u8>, AppError> {
        let key = format!("AWS4{}", self.secret_key);
        let key = hmac_sha256(key.as_bytes(), date_stamp.as_bytes())?;
        let key = hmac_sha256(&key, self.region.as_bytes())?;
        let key = hmac_sha256(&key, b"s3")?;
        hmac_sha256(&key, b"aws4_request")
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer(secret: &str) -> PolicySigner<'_> {
        PolicySigner {
            access_key: "minioadmin",
            secret_key: secret,
            region: "us-east-1",
        }
    }

    #[test]
    fn test_signed_request_carries_scope_and_payload_hash() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let signed = signer("secret")
            .sign("localhost:9000", "elevate", "", now)
            .unwrap();

        assert_eq!(signed.amz_date, "20250301T120000Z");
        assert_eq!(
            signed.payload_hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=minioadmin/20250301/us-east-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
    }

    #[test]
    fn test_public_read_policy_targets_prefix_only() {
        let policy: serde_json::Value =
            serde_json::from_str(&public_read_policy("elevate-media", "public")).unwrap();
        let statement = &policy["Statement"][0];

        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(
            statement["Resource"][0],
            "arn:aws:s3:::elevate-media/public/*"
        );
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let a = signer("one").sign("localhost", "b", "{}", now).unwrap();
        let again = signer("one").sign("localhost", "b", "{}", now).unwrap();
        let b = signer("two").sign("localhost", "b", "{}", now).unwrap();

        assert_eq!(a.authorization, again.authorization);
        assert_ne!(a.authorization, b.authorization);
    }
}
