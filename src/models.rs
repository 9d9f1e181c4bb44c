// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Field names are camelCase on
//! the wire.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::policy::RequestedChanges;
use crate::storage::UserRecord;

// =============================================================================
// Login
// =============================================================================

/// Credentials for `POST /auth`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login: the local profile plus the provider access token.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserRecord,
    /// Cognito access token, to be sent as `Authorization: Bearer <token>`.
    pub token: String,
}

// =============================================================================
// Users
// =============================================================================

/// Public view of a profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserSummary {
    pub id: u64,
    pub email: String,
    pub role: String,
    pub name: Option<String>,
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            role: record.role,
            name: record.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Body of `PUT /edit-user/{id}`. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    /// Only admins editing another user may set this.
    pub role: Option<String>,
    /// Must name the same account as the path id when it differs from the
    /// caller's own email. Never written.
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn requested_changes(&self) -> RequestedChanges {
        RequestedChanges {
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user: UserRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserRecord>,
    pub total: usize,
}
