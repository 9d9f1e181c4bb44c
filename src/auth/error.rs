// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::providers::{MissingAttribute, ProviderError};

/// Authentication error type.
///
/// Header problems are malformed requests (400). Anything wrong with the
/// token itself, or the provider refusing it, is an authentication failure
/// (401). Dependency and internal faults are 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token header cannot be decoded
    MalformedToken,
    /// Token has no key id, or the key id is not in the signing key set
    NoMatchingKey,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Any other verification failure, with the verifier's reason
    InvalidToken(String),
    /// The identity provider refused the token on introspection
    TokenRejected(String),
    /// The provider's account record lacks a required attribute
    MissingAttribute(String),
    /// JWKS fetch failed
    JwksFetchError(String),
    /// Identity provider unreachable or answering garbage
    ProviderUnavailable(String),
    /// Internal error
    InternalError(String),
    /// Insufficient permissions
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::TokenRejected(_) => "token_rejected",
            AuthError::MissingAttribute(_) => "missing_attribute",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::InternalError(_) => "internal_error",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => StatusCode::BAD_REQUEST,
            AuthError::MalformedToken
            | AuthError::NoMatchingKey
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidIssuer
            | AuthError::TokenNotYetValid
            | AuthError::InvalidToken(_)
            | AuthError::TokenRejected(_)
            | AuthError::MissingAttribute(_) => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::JwksFetchError(_)
            | AuthError::ProviderUnavailable(_)
            | AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is a token verification failure (as opposed to a
    /// header, provider-data or dependency problem).
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::NoMatchingKey
                | AuthError::InvalidSignature
                | AuthError::TokenExpired
                | AuthError::InvalidIssuer
                | AuthError::TokenNotYetValid
                | AuthError::InvalidToken(_)
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Invalid token: header cannot be decoded"),
            AuthError::NoMatchingKey => write!(f, "Invalid token: unknown signing key id"),
            AuthError::InvalidSignature => {
                write!(f, "Token verification failed: invalid signature")
            }
            AuthError::TokenExpired => write!(f, "Token verification failed: token has expired"),
            AuthError::InvalidIssuer => write!(f, "Token verification failed: invalid issuer"),
            AuthError::TokenNotYetValid => {
                write!(f, "Token verification failed: token is not yet valid")
            }
            AuthError::InvalidToken(reason) => write!(f, "Token verification failed: {reason}"),
            AuthError::TokenRejected(reason) => {
                write!(f, "Token rejected by identity provider: {reason}")
            }
            AuthError::MissingAttribute(name) => {
                write!(f, "Required attribute '{name}' missing from identity provider account")
            }
            AuthError::JwksFetchError(msg) => write!(f, "Failed to fetch JWKS: {msg}"),
            AuthError::ProviderUnavailable(msg) => write!(f, "{msg}"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
            AuthError::InsufficientPermissions => {
                write!(f, "Access denied: admin role required")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl From<MissingAttribute> for AuthError {
    fn from(err: MissingAttribute) -> Self {
        AuthError::MissingAttribute(err.0)
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected(msg) => AuthError::TokenRejected(msg),
            other => AuthError::ProviderUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication dependency failure");
        } else {
            tracing::debug!(error_code = self.error_code(), "Request rejected by authentication");
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
