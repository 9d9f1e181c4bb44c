// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated caller.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(caller): Auth) -> impl IntoResponse {
//!     // caller is CallerIdentity
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, CallerIdentity};
use crate::state::AppState;

/// Extractor for the verified caller.
///
/// Uses the identity stored by `require_auth` when present and otherwise
/// verifies the request's bearer token itself.
pub struct Auth(pub CallerIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<CallerIdentity>().cloned() {
            return Ok(Auth(caller));
        }

        let caller = state.verifier.verify_request(&parts.headers).await?;
        parts.extensions.insert(caller.clone());
        Ok(Auth(caller))
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub CallerIdentity);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(caller) = Auth::from_request_parts(parts, state).await?;

        if !caller.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use axum::http::Request;

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _provider, _dir) = test_state();
        let mut parts = parts();

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let (state, provider, _dir) = test_state();
        let mut parts = parts();
        parts
            .extensions
            .insert(CallerIdentity::new("from-middleware@example.com", "user"));

        let Auth(caller) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(caller.email, "from-middleware@example.com");
        assert_eq!(provider.jwks_fetches(), 0);
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _provider, _dir) = test_state();
        let mut parts = parts();
        parts
            .extensions
            .insert(CallerIdentity::new("ana@example.com", "user"));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let (state, _provider, _dir) = test_state();
        let mut parts = parts();
        parts
            .extensions
            .insert(CallerIdentity::new("root@example.com", "admin"));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }
}
