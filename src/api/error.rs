// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Maps core/auth failures onto HTTP responses at the API boundary, the way
//! the FastAPI layer this service replaces raises `HTTPException`.
//!
//! There is no generic 500 variant here: every failure the core can
//! produce is either absorbed internally (a transport error degrades to
//! "offline" in status, or to a logged warning for an unlock write) or
//! surfaces as one of the two cases below. An unhandled panic still
//! produces axum's default 500, but this type has nothing to route there
//! on purpose — adding an `Internal` variant with no caller that ever
//! constructs it would just be dead code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::registry::RegistryError;

#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed, expired, or superseded bearer credential.
    Unauthorized,
    /// A referenced resource (lock id) doesn't exist.
    NotFound(String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => ApiError::NotFound(id),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "could not validate credentials".to_string()),
            ApiError::NotFound(id) => (StatusCode::NOT_FOUND, format!("lock id {id:?} not found")),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
