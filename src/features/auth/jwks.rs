use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Deserialize)]
struct KeySet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[serde(default)]
    n: String,
    #[serde(default)]
    e: String,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Fetches and caches the identity provider's signing keys
pub struct JwksClient {
    jwks_url: String,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedKeys>>>,
    cache_ttl: Duration,
}

impl JwksClient {
    pub fn new(jwks_url: &str, cache_ttl: Duration) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            client: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    /// Look up a key by `kid`, refetching when the cache is stale or the key is
    /// unknown (the provider may have rotated keys)
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        self.fetch_jwks().await?;

        self.cached_key(kid)
            .await
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.cache_ttl)
            .and_then(|cached| cached.keys.get(kid).cloned())
    }

    async fn fetch_jwks(&self) -> Result<(), JwksError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwksError::FetchError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::FetchError(format!(
                "{} returned HTTP {}",
                self.jwks_url, status
            )));
        }

        let key_set: KeySet = response
            .json()
            .await
            .map_err(|e| JwksError::ParseError(e.to_string()))?;

        let keys = rsa_keys(key_set.keys)?;
        tracing::debug!("Fetched {} signing keys from {}", keys.len(), self.jwks_url);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        Ok(())
    }
}

/// Decoding keys for every RSA entry; other key types are skipped
fn rsa_keys(jwks: Vec<Jwk>) -> Result<HashMap<String, DecodingKey>, JwksError> {
    jwks.into_iter()
        .filter(|jwk| jwk.kty == "RSA")
        .map(|jwk| {
            DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
                .map(|key| (jwk.kid, key))
                .map_err(|e| JwksError::KeyConversionError(e.to_string()))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("Signing keys unavailable: {0}")]
    FetchError(String),

    #[error("Malformed key set: {0}")]
    ParseError(String),

    #[error("No signing key with kid {0}")]
    KeyNotFound(String),

    #[error("Unusable RSA key: {0}")]
    KeyConversionError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsa_keys_skips_other_key_types() {
        let jwks: KeySet = serde_json::from_str(
            r#"{"keys":[
                {"kid":"ec-1","kty":"EC","crv":"P-256","x":"a","y":"b"},
                {"kid":"rsa-1","kty":"RSA","n":"AQAB","e":"AQAB"}
            ]}"#,
        )
        .unwrap();

        let keys = rsa_keys(jwks.keys).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("rsa-1"));
    }
}
