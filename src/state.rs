// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{SigningKeyCache, TokenVerifier};
use crate::config::Config;
use crate::providers::IdentityProvider;
use crate::storage::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub verifier: Arc<TokenVerifier>,
    pub provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        store: UserStore,
        provider: Arc<dyn IdentityProvider>,
        verifier: TokenVerifier,
    ) -> Self {
        Self {
            store: Arc::new(store),
            verifier: Arc::new(verifier),
            provider,
        }
    }

    /// Wire the verifier and key cache for `provider` from configuration.
    pub fn from_config(
        config: &Config,
        store: UserStore,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let keys = SigningKeyCache::new(provider.clone()).with_cache_ttl(config.jwks_cache_ttl);
        let verifier = TokenVerifier::new(keys, provider.clone(), config.cognito.issuer());
        Self::new(store, provider, verifier)
    }
}
