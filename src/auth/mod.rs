// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cognito access-token authentication and the profile update rules.
//!
//! ## Auth Flow
//!
//! 1. The client signs in through `POST /auth` (or directly with Cognito)
//! 2. The client sends `Authorization: Bearer <access token>`
//! 3. The server:
//!    - Fetches the user pool JWKS over HTTPS and caches it with a TTL
//!    - Verifies signature, expiry and issuer
//!    - Calls `GetUser` with the token and reads:
//!      - `email` → identity used to find the local profile
//!      - `profile` → role (`admin` or anything else)
//!
//! ## Security
//!
//! - All routes except login, health and docs require authentication
//! - Identity never comes from the request body
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod policy;
pub mod roles;
pub mod verifier;

#[cfg(test)]
pub mod test_tokens;

pub use claims::CallerIdentity;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use jwks::SigningKeyCache;
pub use roles::Role;
pub use verifier::TokenVerifier;
