// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile Auth Server - Cognito-backed user profile service
//!
//! Verifies Cognito access tokens, provisions a local profile on first login
//! and enforces who may edit which profile.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification and update authorization
//! - `providers` - Identity provider seam and the Cognito client
//! - `storage` - Embedded user database (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;
pub mod telemetry;
