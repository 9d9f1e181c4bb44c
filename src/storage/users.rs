// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user profile database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized UserRecord (JSON bytes)
//! - `users_by_email`: email → user id (unique index)
//! - `user_meta`: key → value (id sequence)

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user id → serialized UserRecord (JSON bytes).
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Unique index: email → user id. Soft-deleted rows release their email.
const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");

/// Sequence state: key → value.
const USER_META: TableDefinition<&str, u64> = TableDefinition::new("user_meta");

const NEXT_ID_KEY: &str = "next_user_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Records
// =============================================================================

/// A persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields supplied when provisioning a profile.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub role: String,
    pub name: Option<String>,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub is_onboarded: Option<bool>,
}

// =============================================================================
// UserStore
// =============================================================================

/// Embedded ACID user database.
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(USER_META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Look up a live user by email.
    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERS_BY_EMAIL)?;
        let Some(id) = index.get(email)?.map(|v| v.value()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => {
                let user: UserRecord = serde_json::from_slice(value.value())?;
                Ok((!user.is_deleted()).then_some(user))
            }
            None => Ok(None),
        }
    }

    /// Look up a live user by id.
    pub fn find_by_id(&self, id: u64) -> StoreResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => {
                let user: UserRecord = serde_json::from_slice(value.value())?;
                Ok((!user.is_deleted()).then_some(user))
            }
            None => Ok(None),
        }
    }

    /// Insert a new profile, assigning the next id.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    pub fn create(&self, new_user: NewUser) -> StoreResult<UserRecord> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let mut index = write_txn.open_table(USERS_BY_EMAIL)?;
            let mut meta = write_txn.open_table(USER_META)?;

            if index.get(new_user.email.as_str())?.is_some() {
                return Err(StoreError::DuplicateEmail(new_user.email));
            }

            let id = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_ID_KEY, id + 1)?;

            let now = Utc::now();
            let user = UserRecord {
                id,
                name: new_user.name,
                email: new_user.email,
                role: new_user.role,
                is_onboarded: false,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            index.insert(user.email.as_str(), id)?;
            user
        };
        write_txn.commit()?;

        tracing::info!(user_id = user.id, "User profile created");
        Ok(user)
    }

    /// Apply a patch to a live user and refresh `updated_at`.
    pub fn update(&self, id: u64, patch: &UserPatch) -> StoreResult<UserRecord> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let existing = users.get(id)?.map(|v| v.value().to_vec());
            let mut user: UserRecord = match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => return Err(StoreError::NotFound(format!("User {id}"))),
            };
            if user.is_deleted() {
                return Err(StoreError::NotFound(format!("User {id}")));
            }

            if let Some(name) = &patch.name {
                user.name = Some(name.clone());
            }
            if let Some(role) = &patch.role {
                user.role = role.clone();
            }
            if let Some(onboarded) = patch.is_onboarded {
                user.is_onboarded = onboarded;
            }
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// All live users in id order.
    pub fn list_all(&self) -> StoreResult<Vec<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;

        let mut results = Vec::new();
        for entry in users.iter()? {
            let (_, value) = entry?;
            let user: UserRecord = serde_json::from_slice(value.value())?;
            if !user.is_deleted() {
                results.push(user);
            }
        }
        Ok(results)
    }

    /// Mark a user as deleted and release its email.
    ///
    /// Not exposed over HTTP. This is the maintenance entry point for
    /// retiring an account.
    pub fn soft_delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut index = write_txn.open_table(USERS_BY_EMAIL)?;

            let existing = users.get(id)?.map(|v| v.value().to_vec());
            let mut user: UserRecord = match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => return Err(StoreError::NotFound(format!("User {id}"))),
            };
            if user.is_deleted() {
                return Err(StoreError::NotFound(format!("User {id}")));
            }

            let now = Utc::now();
            user.deleted_at = Some(now);
            user.updated_at = now;

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            index.remove(user.email.as_str())?;
        }
        write_txn.commit()?;

        tracing::info!(user_id = id, "User profile soft-deleted");
        Ok(())
    }

    /// Verify the database answers a read transaction.
    pub fn health_check(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (UserStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = UserStore::open(&dir.path().join("users.redb")).unwrap();
        (store, dir)
    }

    fn new_user(email: &str, role: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            role: role.to_string(),
            name: None,
        }
    }

    #[test]
    fn create_assigns_sequential_ids_and_defaults() {
        let (store, _dir) = open_store();
        let first = store.create(new_user("ana@example.com", "user")).unwrap();
        let second = store.create(new_user("bo@example.com", "admin")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(!first.is_onboarded);
        assert!(first.name.is_none());
        assert!(first.deleted_at.is_none());
        assert_eq!(first.created_at, first.updated_at);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (store, _dir) = open_store();
        store.create(new_user("ana@example.com", "user")).unwrap();
        let err = store.create(new_user("ana@example.com", "admin")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(email) if email == "ana@example.com"));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn find_by_email_and_id() {
        let (store, _dir) = open_store();
        let created = store.create(new_user("ana@example.com", "user")).unwrap();

        assert_eq!(store.find_by_email("ana@example.com").unwrap(), Some(created.clone()));
        assert_eq!(store.find_by_id(created.id).unwrap(), Some(created));
        assert!(store.find_by_email("nobody@example.com").unwrap().is_none());
        assert!(store.find_by_id(99).unwrap().is_none());
    }

    #[test]
    fn update_applies_only_present_fields() {
        let (store, _dir) = open_store();
        let created = store.create(new_user("ana@example.com", "user")).unwrap();

        let updated = store
            .update(
                created.id,
                &UserPatch {
                    name: Some("Ana".to_string()),
                    role: None,
                    is_onboarded: Some(true),
                },
            )
            .unwrap();

        assert_eq!(updated.name.as_deref(), Some("Ana"));
        assert_eq!(updated.role, "user");
        assert!(updated.is_onboarded);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(store.find_by_id(created.id).unwrap(), Some(updated));
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let (store, _dir) = open_store();
        let err = store.update(42, &UserPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn soft_deleted_users_are_hidden_and_release_email() {
        let (store, _dir) = open_store();
        let created = store.create(new_user("ana@example.com", "user")).unwrap();
        store.create(new_user("bo@example.com", "user")).unwrap();

        store.soft_delete(created.id).unwrap();

        assert!(store.find_by_id(created.id).unwrap().is_none());
        assert!(store.find_by_email("ana@example.com").unwrap().is_none());
        assert_eq!(store.list_all().unwrap().len(), 1);
        assert!(matches!(
            store.update(created.id, &UserPatch::default()),
            Err(StoreError::NotFound(_))
        ));

        let recreated = store.create(new_user("ana@example.com", "user")).unwrap();
        assert_eq!(recreated.id, 3);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.redb");
        {
            let store = UserStore::open(&path).unwrap();
            store.create(new_user("ana@example.com", "user")).unwrap();
        }
        let store = UserStore::open(&path).unwrap();
        assert!(store.find_by_email("ana@example.com").unwrap().is_some());
        assert_eq!(store.create(new_user("bo@example.com", "user")).unwrap().id, 2);
    }

    #[test]
    fn serializes_with_camel_case_columns() {
        let (store, _dir) = open_store();
        let created = store.create(new_user("ana@example.com", "user")).unwrap();
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["isOnboarded"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("deletedAt").is_none());
    }
}
