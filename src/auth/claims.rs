// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access-token claims and the authenticated caller.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims read from a Cognito access token.
///
/// Only `sub`, `exp` and `iss` take part in verification; identity and role
/// come from the provider's user-info call, not from the token body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (Cognito user id)
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer (user pool URL)
    pub iss: String,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,

    /// `access` for access tokens
    #[serde(default)]
    pub token_use: Option<String>,

    /// App client the token was issued to
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub username: Option<String>,
}

/// The verified caller of a request.
///
/// Built only by the token verifier; handlers receive it from request
/// extensions and never from client-supplied fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallerIdentity {
    pub email: String,
    pub role: String,
}

impl CallerIdentity {
    pub fn new(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        Role::of(&self.role) == Role::Admin
    }
}
