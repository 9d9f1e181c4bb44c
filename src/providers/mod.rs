// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider integration.
//!
//! The service never issues credentials itself. Password checks, token
//! issuance, the signing key set and the live attribute lookup all belong to
//! the identity provider behind [`IdentityProvider`]. Production uses the
//! Cognito client in [`cognito`].

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;

pub mod cognito;
#[cfg(test)]
pub mod fake;

pub use cognito::CognitoClient;

/// Attribute holding the account email.
pub const EMAIL_ATTRIBUTE: &str = "email";

/// Attribute holding the account role.
pub const ROLE_ATTRIBUTE: &str = "profile";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered and refused (bad credentials, revoked token).
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or failed internally.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with something we cannot interpret.
    #[error("identity provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// A required attribute was absent from the provider's user record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("required attribute '{0}' is missing")]
pub struct MissingAttribute(pub String);

/// Named attributes of an account, as returned by the user-info call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAttributes {
    values: HashMap<String, String>,
}

impl UserAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Attribute value, treating empty strings as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &str) -> Result<&str, MissingAttribute> {
        self.get(name)
            .ok_or_else(|| MissingAttribute(name.to_string()))
    }
}

impl<K, V> FromIterator<(K, V)> for UserAttributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Operations the service needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the published JSON Web Key Set.
    async fn fetch_jwks(&self) -> Result<JwkSet, ProviderError>;

    /// Resolve the live attributes of the account owning `access_token`.
    async fn get_user(&self, access_token: &str) -> Result<UserAttributes, ProviderError>;

    /// Password grant. Returns the issued access token.
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, ProviderError>;
}
