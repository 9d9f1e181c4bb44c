// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key cache (JSON Web Key Set).
//!
//! - Keys are fetched lazily from the identity provider on first use and
//!   indexed by key id.
//! - Entries live for a configurable TTL; `invalidate()` drops them early.
//! - Concurrent misses share a single fetch.
//! - A failed fetch returns an error and leaves the cache as it was.
//! - An unknown key id never triggers a refetch on its own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;
use crate::providers::IdentityProvider;

/// Default key cache TTL (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A verification key ready for `jsonwebtoken::decode`.
#[derive(Clone)]
pub struct CachedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

type KeyMap = Arc<HashMap<String, CachedKey>>;

struct CacheEntry {
    keys: KeyMap,
    fetched_at: Instant,
}

/// Process-wide cache of the provider's signing keys.
pub struct SigningKeyCache {
    provider: Arc<dyn IdentityProvider>,
    cache_ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
    /// Serialises fetches so concurrent misses hit the provider once.
    fetch_guard: Mutex<()>,
}

impl SigningKeyCache {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: RwLock::new(None),
            fetch_guard: Mutex::new(()),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the decoding key for the given key id.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<CachedKey, AuthError> {
        let keys = self.current_keys().await?;
        keys.get(kid).cloned().ok_or(AuthError::NoMatchingKey)
    }

    /// Make sure fresh keys are cached, fetching them if needed.
    ///
    /// Shares the single-flight path with lookups, so concurrent callers on a
    /// cold cache trigger one fetch.
    pub async fn ensure_loaded(&self) -> Result<(), AuthError> {
        self.current_keys().await.map(|_| ())
    }

    /// Drop cached keys; the next lookup fetches again.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
        tracing::info!("Signing key cache invalidated");
    }

    async fn current_keys(&self) -> Result<KeyMap, AuthError> {
        if let Some(keys) = self.fresh_keys().await {
            return Ok(keys);
        }

        let _guard = self.fetch_guard.lock().await;
        // Another task may have populated the cache while we waited.
        if let Some(keys) = self.fresh_keys().await {
            return Ok(keys);
        }

        self.fetch_and_store().await
    }

    async fn fresh_keys(&self) -> Option<KeyMap> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| Arc::clone(&entry.keys))
    }

    /// Caller must hold `fetch_guard`.
    async fn fetch_and_store(&self) -> Result<KeyMap, AuthError> {
        let jwks = self
            .provider
            .fetch_jwks()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let keys: KeyMap = Arc::new(index_keys(&jwks));
        tracing::info!(keys = keys.len(), "Signing key set loaded");

        *self.cache.write().await = Some(CacheEntry {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}

/// Index usable keys by key id, skipping unsupported or anonymous ones.
fn index_keys(jwks: &JwkSet) -> HashMap<String, CachedKey> {
    let mut keys = HashMap::with_capacity(jwks.keys.len());
    for jwk in &jwks.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            tracing::warn!("Skipping JWKS entry without key id");
            continue;
        };
        match jwk_to_decoding_key(jwk) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable JWKS entry"),
        }
    }
    keys
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<CachedKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}")))?;

            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };

            Ok(CachedKey { key, algorithm })
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::InternalError(format!("Failed to create EC key: {e}")))?;

            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok(CachedKey { key, algorithm })
        }
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
