// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied to the protected router subtree. Verifies the bearer token once
//! and stores the resulting [`CallerIdentity`] in the request extensions,
//! where the `Auth` extractor picks it up.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/me", get(users::get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::CallerIdentity;
use crate::state::AppState;

/// Reject unauthenticated requests before they reach a handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.verifier.verify_request(request.headers()).await {
        Ok(caller) => {
            request.extensions_mut().insert::<CallerIdentity>(caller);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
