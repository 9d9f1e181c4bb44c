// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process identity provider for tests, with call counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;

use super::{IdentityProvider, ProviderError, UserAttributes};

pub struct FakeIdentityProvider {
    jwks: Mutex<Result<JwkSet, ProviderError>>,
    users: Mutex<HashMap<String, UserAttributes>>,
    accounts: Mutex<HashMap<String, (String, String)>>,
    outage: Mutex<Option<ProviderError>>,
    jwks_fetches: AtomicUsize,
    user_lookups: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new(jwks: JwkSet) -> Self {
        Self {
            jwks: Mutex::new(Ok(jwks)),
            users: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            outage: Mutex::new(None),
            jwks_fetches: AtomicUsize::new(0),
            user_lookups: AtomicUsize::new(0),
        }
    }

    /// Make subsequent JWKS fetches fail (or succeed again).
    pub fn set_jwks(&self, jwks: Result<JwkSet, ProviderError>) {
        *self.jwks.lock().unwrap() = jwks;
    }

    /// Attributes returned by `get_user` for `token`.
    pub fn register_token(&self, token: &str, attributes: UserAttributes) {
        self.users
            .lock()
            .unwrap()
            .insert(token.to_string(), attributes);
    }

    /// Account accepted by `authenticate`, issuing `token`.
    pub fn register_account(&self, email: &str, password: &str, token: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), token.to_string()));
    }

    /// Make `authenticate` and `get_user` fail with `error`.
    pub fn fail_user_calls(&self, error: ProviderError) {
        *self.outage.lock().unwrap() = Some(error);
    }

    fn outage(&self) -> Result<(), ProviderError> {
        match self.outage.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn jwks_fetches(&self) -> usize {
        self.jwks_fetches.load(Ordering::SeqCst)
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn fetch_jwks(&self) -> Result<JwkSet, ProviderError> {
        self.jwks_fetches.fetch_add(1, Ordering::SeqCst);
        self.jwks.lock().unwrap().clone()
    }

    async fn get_user(&self, access_token: &str) -> Result<UserAttributes, ProviderError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.outage()?;
        self.users
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("Invalid Access Token".to_string()))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        self.outage()?;
        match self.accounts.lock().unwrap().get(email) {
            Some((expected, token)) if expected == password => Ok(token.clone()),
            _ => Err(ProviderError::Rejected(
                "Incorrect username or password.".to_string(),
            )),
        }
    }
}
