// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization rules for profile updates.
//!
//! The acting user is always the stored profile of the verified caller. The
//! path id names the account being edited. Everything here is pure so the
//! full rule table can be exercised without a database.

use axum::http::StatusCode;

use super::claims::CallerIdentity;
use crate::error::ApiError;
use crate::storage::UserPatch;

/// Fields a client asked to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedChanges {
    pub name: Option<String>,
    pub role: Option<String>,
}

impl RequestedChanges {
    /// Requested role, with blank values treated as absent.
    pub fn role(&self) -> Option<&str> {
        self.role
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty())
    }
}

/// Why an update was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UpdateDenied {
    #[error("Ordinary users may edit only their own profile")]
    NotSelf,

    #[error("Only admins may change roles")]
    RoleChangeNotAllowed,

    #[error("Admins may not alter their own role")]
    OwnRoleChange,

    #[error("The email in the request body does not belong to the user being edited")]
    EmailTargetMismatch,
}

impl UpdateDenied {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpdateDenied::NotSelf => StatusCode::FORBIDDEN,
            UpdateDenied::RoleChangeNotAllowed
            | UpdateDenied::OwnRoleChange
            | UpdateDenied::EmailTargetMismatch => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<UpdateDenied> for ApiError {
    fn from(denied: UpdateDenied) -> Self {
        ApiError::new(denied.status_code(), denied.to_string())
    }
}

/// A body email may name an account only if it is the one in the path.
pub fn check_body_email_target(resolved_id: u64, target_id: u64) -> Result<(), UpdateDenied> {
    if resolved_id == target_id {
        Ok(())
    } else {
        Err(UpdateDenied::EmailTargetMismatch)
    }
}

/// Decide whether `caller` (stored as `acting_user_id`) may apply
/// `requested` to the profile `target_id`, and build the patch to write.
///
/// Editing one's own profile always marks it onboarded.
pub fn decide_update(
    caller: &CallerIdentity,
    acting_user_id: u64,
    target_id: u64,
    requested: &RequestedChanges,
) -> Result<UserPatch, UpdateDenied> {
    let is_admin = caller.is_admin();
    let is_self = acting_user_id == target_id;
    let role = requested.role();

    if !is_admin && !is_self {
        return Err(UpdateDenied::NotSelf);
    }
    if !is_admin && role.is_some() {
        return Err(UpdateDenied::RoleChangeNotAllowed);
    }
    if is_admin && is_self && role.is_some() {
        return Err(UpdateDenied::OwnRoleChange);
    }

    Ok(UserPatch {
        name: requested.name.clone(),
        role: role.map(str::to_string),
        is_onboarded: is_self.then_some(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> CallerIdentity {
        CallerIdentity::new("root@example.com", "admin")
    }

    fn user() -> CallerIdentity {
        CallerIdentity::new("ana@example.com", "user")
    }

    fn changes(name: Option<&str>, role: Option<&str>) -> RequestedChanges {
        RequestedChanges {
            name: name.map(str::to_string),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn rule_table() {
        // (caller, editing self, role requested, expected outcome)
        let cases = [
            (admin(), true, true, Err(UpdateDenied::OwnRoleChange)),
            (admin(), true, false, Ok(())),
            (admin(), false, true, Ok(())),
            (admin(), false, false, Ok(())),
            (user(), true, true, Err(UpdateDenied::RoleChangeNotAllowed)),
            (user(), true, false, Ok(())),
            (user(), false, true, Err(UpdateDenied::NotSelf)),
            (user(), false, false, Err(UpdateDenied::NotSelf)),
        ];

        for (caller, is_self, with_role, expected) in cases {
            let target = if is_self { 10 } else { 20 };
            let requested = changes(Some("Name"), with_role.then_some("editor"));
            let outcome = decide_update(&caller, 10, target, &requested).map(|_| ());
            assert_eq!(
                outcome, expected,
                "role={} self={is_self} role_requested={with_role}",
                caller.role
            );
        }
    }

    #[test]
    fn user_editing_self_is_onboarded() {
        let patch = decide_update(&user(), 5, 5, &changes(Some("Ana"), None)).unwrap();
        assert_eq!(
            patch,
            UserPatch {
                name: Some("Ana".to_string()),
                role: None,
                is_onboarded: Some(true),
            }
        );
    }

    #[test]
    fn user_editing_someone_else_is_forbidden() {
        let denied = decide_update(&user(), 5, 7, &RequestedChanges::default()).unwrap_err();
        assert_eq!(denied, UpdateDenied::NotSelf);
        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_cannot_change_own_role() {
        let denied = decide_update(&admin(), 1, 1, &changes(None, Some("user"))).unwrap_err();
        assert_eq!(denied, UpdateDenied::OwnRoleChange);
        assert_eq!(denied.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn admin_sets_another_users_role_without_onboarding_them() {
        let patch = decide_update(&admin(), 1, 2, &changes(None, Some("admin"))).unwrap();
        assert_eq!(patch.role.as_deref(), Some("admin"));
        assert_eq!(patch.is_onboarded, None);
    }

    #[test]
    fn admin_editing_self_without_role_is_onboarded() {
        let patch = decide_update(&admin(), 1, 1, &changes(Some("Root"), None)).unwrap();
        assert_eq!(patch.is_onboarded, Some(true));
        assert_eq!(patch.role, None);
    }

    #[test]
    fn blank_role_counts_as_not_requested() {
        let patch = decide_update(&user(), 5, 5, &changes(None, Some("   "))).unwrap();
        assert_eq!(patch.role, None);

        let patch = decide_update(&admin(), 1, 2, &changes(None, Some(""))).unwrap();
        assert_eq!(patch.role, None);
    }

    #[test]
    fn requested_role_is_trimmed() {
        let patch = decide_update(&admin(), 1, 2, &changes(None, Some(" editor "))).unwrap();
        assert_eq!(patch.role.as_deref(), Some("editor"));
    }

    #[test]
    fn body_email_must_name_the_path_target() {
        assert_eq!(check_body_email_target(7, 7), Ok(()));
        assert_eq!(
            check_body_email_target(8, 7),
            Err(UpdateDenied::EmailTargetMismatch)
        );
    }

    #[test]
    fn denial_converts_to_api_error() {
        let err: ApiError = UpdateDenied::RoleChangeNotAllowed.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Only admins may change roles");
    }
}
