// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and first-login provisioning.

use axum::{extract::State, Json};

use crate::{
    auth::AuthError,
    error::ApiError,
    models::{LoginRequest, LoginResponse},
    providers::ROLE_ATTRIBUTE,
    state::AppState,
    storage::{NewUser, StoreError, UserRecord, UserStore},
};

/// Sign in with email and password.
///
/// Creates the local profile on first login, taking the role from the
/// provider's `profile` attribute.
#[utoipa::path(
    post,
    path = "/auth",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Credentials rejected, identity provider failure or profile attribute missing"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    // Every provider failure on this path is a failed login.
    let token = state
        .provider
        .authenticate(email, &request.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Password grant failed");
            ApiError::unauthorized(e.to_string())
        })?;

    let attributes = state.provider.get_user(&token).await.map_err(|e| {
        tracing::warn!(error = %e, "User lookup after login failed");
        ApiError::unauthorized(e.to_string())
    })?;
    let role = attributes
        .require(ROLE_ATTRIBUTE)
        .map_err(|e| ApiError::from(AuthError::from(e)))?;

    let (user, created) = find_or_provision(&state.store, email, role)?;
    let message = if created {
        tracing::info!(user_id = user.id, "Provisioned profile on first login");
        "User created and logged in successfully"
    } else {
        tracing::debug!(user_id = user.id, "Existing profile logged in");
        "User logged in successfully"
    };

    Ok(Json(LoginResponse {
        message: message.to_string(),
        user,
        token,
    }))
}

/// Return the profile for `email`, creating it if absent.
fn find_or_provision(
    store: &UserStore,
    email: &str,
    role: &str,
) -> Result<(UserRecord, bool), StoreError> {
    match store.find_by_email(email)? {
        Some(existing) => Ok((existing, false)),
        None => provision(store, email, role),
    }
}

/// Insert the profile after a lookup miss.
///
/// A concurrent first login for the same email may have inserted it in the
/// meantime; the loser reads the winner's row instead.
fn provision(store: &UserStore, email: &str, role: &str) -> Result<(UserRecord, bool), StoreError> {
    let new_user = NewUser {
        email: email.to_string(),
        role: role.to_string(),
        name: None,
    };
    match store.create(new_user) {
        Ok(user) => Ok((user, true)),
        Err(StoreError::DuplicateEmail(_)) => store
            .find_by_email(email)?
            .map(|user| (user, false))
            .ok_or_else(|| StoreError::NotFound(format!("user {email}"))),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn provisioning_creates_one_row_per_email() {
        let dir = tempdir().unwrap();
        let store = UserStore::open(&dir.path().join("users.redb")).unwrap();

        let (first, created) = find_or_provision(&store, "ana@example.com", "user").unwrap();
        assert!(created);
        assert_eq!(first.role, "user");
        assert!(!first.is_onboarded);

        let (second, created) = find_or_provision(&store, "ana@example.com", "admin").unwrap();
        assert!(!created);
        assert_eq!(second, first);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn provisioning_after_lost_race_returns_existing_row() {
        let dir = tempdir().unwrap();
        let store = UserStore::open(&dir.path().join("users.redb")).unwrap();
        let winner = store
            .create(NewUser {
                email: "ana@example.com".to_string(),
                role: "admin".to_string(),
                name: None,
            })
            .unwrap();

        // The lookup missed before the winner committed.
        let (user, created) = provision(&store, "ana@example.com", "user").unwrap();
        assert!(!created);
        assert_eq!(user, winner);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_first_logins_create_one_row() {
        let dir = tempdir().unwrap();
        let store = Arc::new(UserStore::open(&dir.path().join("users.redb")).unwrap());

        let results: Vec<(UserRecord, bool)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    scope.spawn(move || find_or_provision(&store, "ana@example.com", "user").unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|(_, created)| *created).count(), 1);
        assert!(results.iter().all(|(user, _)| user.id == results[0].0.id));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
