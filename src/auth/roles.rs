// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.
//!
//! Roles arrive as free-form strings from the identity provider's `profile`
//! attribute and are stored verbatim. Authorization only cares whether a
//! role is exactly `"admin"`.

/// Role string granting administrative access.
pub const ADMIN_ROLE: &str = "admin";

/// Privilege level derived from a role string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May edit other users and list everyone
    Admin,
    /// May only edit their own profile, never its role
    User,
}

impl Role {
    /// Classify a role string. Matching is exact.
    pub fn of(role: &str) -> Role {
        if role == ADMIN_ROLE {
            Role::Admin
        } else {
            Role::User
        }
    }
}
