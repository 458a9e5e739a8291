//! Object storage for avatars and application documents
//!
//! Keys are laid out as `{visibility prefix}/{path}`. Public keys are served by
//! direct URL, private keys only through presigned URLs.

mod minio_client;
pub mod paths;

use async_trait::async_trait;

use crate::core::error::Result;

pub use minio_client::MinIOClient;

/// File visibility for uploaded files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVisibility {
    /// Public files are accessible via direct URL
    Public,
    /// Private files require presigned URLs for access
    Private,
}

/// Storage backend used by the profile and application services
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Full object key for a path under the given visibility
    fn object_key(&self, visibility: FileVisibility, path: &str) -> String;

    async fn store(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Direct URL for public keys, presigned URL for everything else
    async fn file_url(&self, key: &str) -> Result<String>;
}
