// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! A token is accepted only when all of the following hold:
//!
//! 1. the header carries a key id present in the provider's signing key set,
//! 2. the signature verifies with that key, the token is unexpired (60 s
//!    leeway) and its issuer is the configured user pool,
//! 3. the provider still recognises the token on a user-info call and the
//!    account carries both `email` and `profile` attributes.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};

use super::claims::{AccessTokenClaims, CallerIdentity};
use super::error::AuthError;
use super::jwks::SigningKeyCache;
use crate::providers::{IdentityProvider, EMAIL_ATTRIBUTE, ROLE_ATTRIBUTE};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

pub struct TokenVerifier {
    keys: SigningKeyCache,
    provider: Arc<dyn IdentityProvider>,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(
        keys: SigningKeyCache,
        provider: Arc<dyn IdentityProvider>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            keys,
            provider,
            issuer: issuer.into(),
        }
    }

    pub fn keys(&self) -> &SigningKeyCache {
        &self.keys
    }

    /// Verify the bearer token carried by `headers`.
    pub async fn verify_request(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError> {
        let token = bearer_token(headers)?;
        self.verify(token).await
    }

    /// Verify a raw token and resolve the caller behind it.
    pub async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let claims = self.verify_signature(token).await?;

        let attributes = self.provider.get_user(token).await?;
        let email = attributes.require(EMAIL_ATTRIBUTE)?;
        let role = attributes.require(ROLE_ATTRIBUTE)?;

        tracing::debug!(sub = %claims.sub, "Access token verified");
        Ok(CallerIdentity::new(email, role))
    }

    /// Offline checks: key id, signature, expiry, issuer.
    async fn verify_signature(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::NoMatchingKey)?;
        let signing_key = self.keys.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(signing_key.algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;

        let token_data = decode::<AccessTokenClaims>(token, &signing_key.key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}
