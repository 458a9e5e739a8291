use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::features::applications::models::StatusPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub marketplace: MarketplaceConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// S3-compatible object storage configuration for uploaded documents and avatars
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for publicly accessible files (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Prefix for public files (avatars)
    pub public_prefix: String,
    /// Prefix for private files (CVs, cover letters)
    pub private_prefix: String,
    /// Presigned URL expiry time in seconds
    pub presigned_url_expiry_secs: u32,
}

/// Listing sizes and workflow policy for the internship marketplace
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Page size for the public browse listing
    pub browse_page_size: i64,
    /// Page size for a company's own postings
    pub owned_page_size: i64,
    /// Page size for company application lists
    pub applications_page_size: i64,
    /// Which status changes a company may make on an application
    pub status_policy: StatusPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // A missing .env is normal outside development
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: could not read .env: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            marketplace: MarketplaceConfig::from_env()?,
        })
    }
}

impl AppConfig {
    // Must stay above the largest accepted upload so oversized files reach validation
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 16 * 1024 * 1024;

    pub fn from_env() -> Result<Self, String> {
        let cors_allowed_origins = env_or("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 3000)?,
            cors_allowed_origins,
            max_request_body_size: env_parse(
                "MAX_REQUEST_BODY_SIZE",
                Self::DEFAULT_MAX_REQUEST_BODY_SIZE,
            )?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", 10)?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", 1)?,
            acquire_timeout_secs: env_parse("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            idle_timeout_secs: env_parse("DB_IDLE_TIMEOUT_SECS", 600)?,
            max_lifetime_secs: env_parse("DB_MAX_LIFETIME_SECS", 1800)?,
        })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("AUTH_ISSUER").map_err(|_| "AUTH_ISSUER must be set".to_string())?;
        let audience =
            env::var("AUTH_AUDIENCE").map_err(|_| "AUTH_AUDIENCE must be set".to_string())?;

        // Most OIDC providers publish keys next to the issuer
        let jwks_url = env::var("AUTH_JWKS_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| format!("{}/jwks", issuer.trim_end_matches('/')));

        Ok(Self {
            issuer,
            audience,
            jwks_url,
            jwks_cache_ttl: Duration::from_secs(env_parse("JWKS_CACHE_TTL", 3600)?),
            jwt_leeway: Duration::from_secs(env_parse("JWT_LEEWAY", 60)?),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            username: env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty()),
            password: env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty()),
            title: env_or("SWAGGER_TITLE", "Elevate API"),
            version: env_or("SWAGGER_VERSION", "0.1.0"),
            description: env_or("SWAGGER_DESCRIPTION", "Internship marketplace API"),
        })
    }

    /// `user:password` when both halves are configured
    pub fn credentials(&self) -> Option<String> {
        let (user, pass) = (self.username.as_ref()?, self.password.as_ref()?);
        Some(format!("{}:{}", user, pass))
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint = env_or("STORAGE_ENDPOINT", "http://localhost:9000");

        Ok(Self {
            public_endpoint: env_or("STORAGE_PUBLIC_ENDPOINT", &endpoint),
            endpoint,
            access_key: env_or("STORAGE_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("STORAGE_SECRET_KEY", "minioadmin"),
            bucket: env_or("STORAGE_BUCKET", "elevate-media"),
            region: env_or("STORAGE_REGION", "us-east-1"),
            public_prefix: env_or("STORAGE_PUBLIC_PREFIX", "public"),
            private_prefix: env_or("STORAGE_PRIVATE_PREFIX", "private"),
            presigned_url_expiry_secs: env_parse("STORAGE_PRESIGNED_URL_EXPIRY_SECS", 3600)?,
        })
    }
}

impl MarketplaceConfig {
    pub const DEFAULT_BROWSE_PAGE_SIZE: i64 = 6;
    pub const DEFAULT_OWNED_PAGE_SIZE: i64 = 6;
    pub const DEFAULT_APPLICATIONS_PAGE_SIZE: i64 = 20;

    pub fn from_env() -> Result<Self, String> {
        let browse_page_size = parse_page_size("BROWSE_PAGE_SIZE", Self::DEFAULT_BROWSE_PAGE_SIZE)?;
        let owned_page_size = parse_page_size("OWNED_PAGE_SIZE", Self::DEFAULT_OWNED_PAGE_SIZE)?;
        let applications_page_size = parse_page_size(
            "APPLICATIONS_PAGE_SIZE",
            Self::DEFAULT_APPLICATIONS_PAGE_SIZE,
        )?;

        let status_policy =
            env_or("APPLICATION_STATUS_POLICY", "guarded").parse::<StatusPolicy>()?;

        Ok(Self {
            browse_page_size,
            owned_page_size,
            applications_page_size,
            status_policy,
        })
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            browse_page_size: Self::DEFAULT_BROWSE_PAGE_SIZE,
            owned_page_size: Self::DEFAULT_OWNED_PAGE_SIZE,
            applications_page_size: Self::DEFAULT_APPLICATIONS_PAGE_SIZE,
            status_policy: StatusPolicy::Guarded,
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Parse `var` when set, otherwise fall back to `default`
fn env_parse<T: FromStr>(var: &str, default: T) -> Result<T, String> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", var)),
        Err(_) => Ok(default),
    }
}

fn parse_page_size(var: &str, default: i64) -> Result<i64, String> {
    let size = env_parse(var, default)?;
    if size < 1 {
        return Err(format!("{} must be at least 1", var));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back_when_unset() {
        assert_eq!(env_parse("ELEVATE_TEST_UNSET_NUMBER", 42u32), Ok(42));
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        env::set_var("ELEVATE_TEST_BAD_NUMBER", "many");
        let err = env_parse("ELEVATE_TEST_BAD_NUMBER", 1u64).unwrap_err();
        assert_eq!(err, "ELEVATE_TEST_BAD_NUMBER must be a valid number");
    }

    #[test]
    fn test_page_size_must_be_positive() {
        env::set_var("ELEVATE_TEST_PAGE_SIZE", "0");
        assert!(parse_page_size("ELEVATE_TEST_PAGE_SIZE", 6).is_err());
        env::set_var("ELEVATE_TEST_PAGE_SIZE_OK", " 12 ");
        assert_eq!(parse_page_size("ELEVATE_TEST_PAGE_SIZE_OK", 6), Ok(12));
    }

    #[test]
    fn test_swagger_credentials_need_both_halves() {
        let mut swagger = SwaggerConfig {
            username: Some("docs".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(swagger.credentials(), None);

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials().as_deref(), Some("docs:secret"));
    }
}
