// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Thin request handlers: validate input, delegate to the core
//! (`fleet::pulse`/`fleet::relay_status`) or to `api::auth`, and shape the
//! JSON response. No device I/O happens here directly.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    api::{auth::AuthenticatedUser, error::ApiError, state::AppState},
    fleet,
};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn token(State(state): State<Arc<AppState>>, Json(body): Json<TokenRequest>) -> Result<Json<TokenResponse>, ApiError> {
    info!(username = %body.username, "login attempt");
    let access_token = crate::api::auth::authenticate(&state, &body.username, &body.password).ok_or(ApiError::Unauthorized)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[derive(Debug, Serialize)]
pub struct UserMeResponse {
    pub username: String,
}

pub async fn users_me(user: AuthenticatedUser) -> Json<UserMeResponse> {
    info!(username = %user.username, "user accessed protected route");
    Json(UserMeResponse { username: user.username })
}

#[derive(Debug, Deserialize)]
pub struct PulseRequest {
    pub id: String,
    /// Accepted for forward compatibility; not consumed by the core. The
    /// device auto-closes on its own internal timer.
    #[serde(default)]
    pub time_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PulseResponse {
    pub message: String,
}

pub async fn pulse(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(body): Json<PulseRequest>,
) -> Result<Json<PulseResponse>, ApiError> {
    info!(username = %user.username, lock_id = %body.id, "unlocking lock");
    fleet::pulse(&state.registry, &body.id)?;
    Ok(Json(PulseResponse {
        message: format!("Locker # {} opened", body.id),
    }))
}

pub async fn status(State(state): State<Arc<AppState>>, user: AuthenticatedUser) -> Json<fleet::FleetStatus> {
    info!(username = %user.username, "checking lock status");
    let report = fleet::relay_status(&state.registry, &state.devices).await;
    Json(report)
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "OK" })))
}

pub async fn ready() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "OK" })))
}
