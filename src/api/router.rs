// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::api::{handlers, state::AppState};

/// Build the full HTTP router: `/health`, `/ready`, and the `/api/v1/*`
/// routes behind bearer auth, all wired against the shared [`AppState`].
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/api/v1/token", post(handlers::token))
        .route("/api/v1/users/me", get(handlers::users_me))
        .route("/api/v1/pulse", post(handlers::pulse))
        .route("/api/v1/status", get(handlers::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
