// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Storage
//!
//! Persistent user profiles live in a single embedded redb database under
//! `DATA_DIR`. The store mirrors a relational `user` table:
//!
//! ```text
//! id | name | email (unique) | role | isOnboarded | createdAt | updatedAt | deletedAt
//! ```
//!
//! Rows with `deletedAt` set are soft-deleted and never returned by lookups.

pub mod users;

pub use users::{NewUser, StoreError, StoreResult, UserPatch, UserRecord, UserStore};
