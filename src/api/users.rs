// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User profile endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::{
        policy::{check_body_email_target, decide_update},
        AdminOnly, Auth, CallerIdentity,
    },
    error::ApiError,
    models::{MeResponse, UpdateUserRequest, UserListResponse, UserResponse},
    state::AppState,
    storage::{UserRecord, UserStore},
};

/// Stored profile of the verified caller.
fn acting_user(store: &UserStore, caller: &CallerIdentity) -> Result<UserRecord, ApiError> {
    store
        .find_by_email(&caller.email)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Get the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile of the caller", body = MeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "No local profile for the caller"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<MeResponse>, ApiError> {
    let user = acting_user(&state.store, &caller)?;
    Ok(Json(MeResponse {
        message: "User retrieved successfully".to_string(),
        user: user.into(),
    }))
}

/// Update a user's profile.
///
/// Ordinary users may edit only themselves and never their role. Admins may
/// change anyone's role except their own. Editing one's own profile marks it
/// onboarded.
#[utoipa::path(
    put,
    path = "/edit-user/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(
        ("id" = u64, Path, description = "Id of the user being edited")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Role change not permitted or body email names another user"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Ordinary users may edit only themselves"),
        (status = 404, description = "Caller, body email or target user not found"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(target_id): Path<u64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let acting = acting_user(&state.store, &caller)?;

    if let Some(email) = request.email.as_deref().map(str::trim) {
        if !email.is_empty() && email != caller.email {
            let named = state
                .store
                .find_by_email(email)?
                .ok_or_else(|| ApiError::not_found("User not found"))?;
            check_body_email_target(named.id, target_id)?;
        }
    }

    let patch = decide_update(&caller, acting.id, target_id, &request.requested_changes())
        .inspect_err(|denied| {
            tracing::debug!(
                acting_user_id = acting.id,
                target_id,
                reason = %denied,
                "Profile update denied"
            );
        })?;

    let user = state.store.update(target_id, &patch)?;
    tracing::info!(
        acting_user_id = acting.id,
        target_id,
        role_changed = patch.role.is_some(),
        "Profile updated"
    );

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// List all users (admin only).
#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All active users", body = UserListResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminOnly(_admin): AdminOnly,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.store.list_all()?;
    let total = users.len();
    Ok(Json(UserListResponse { users, total }))
}
