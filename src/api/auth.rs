// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Bearer-token issuance and verification. Ports the single-active-token
//! model of the system this crate replaces: a stateless HS256 JWT carries
//! `sub` (username) and `jti` (a fresh UUID per login), but a token only
//! verifies if its `jti` still matches the most recently minted one for that
//! `sub` — logging in again invalidates whatever token was issued before.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};

const TOKEN_TTL: Duration = Duration::days(14);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    exp: usize,
}

/// The identity a verified bearer token resolves to.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "password verification failed");
            false
        },
    }
}

/// Check the submitted credential against the configured operator identity
/// and, on success, mint and record a fresh access token.
pub fn authenticate(state: &AppState, username: &str, password: &str) -> Option<String> {
    if username != state.secrets.username || !verify_password(password, &state.secrets.password_hash) {
        warn!(username, "authentication failed");
        return None;
    }
    info!(username, "user authenticated");
    Some(mint_token(state, username))
}

fn mint_token(state: &AppState, username: &str) -> String {
    let jti = Uuid::new_v4().to_string();
    let exp = (Utc::now() + TOKEN_TTL).timestamp() as usize;
    let claims = Claims {
        sub: username.to_string(),
        jti: jti.clone(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.secrets.jwt_secret.as_bytes()),
    )
    .expect("HS256 encoding of a well-formed claim set cannot fail");

    state.active_tokens.insert(username.to_string(), jti);
    token
}

fn verify(state: &AppState, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.secrets.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    let claims = data.claims;
    let current = state.active_tokens.get(&claims.sub);
    match current {
        Some(active) if *active == claims.jti => Ok(AuthenticatedUser { username: claims.sub }),
        _ => Err(ApiError::Unauthorized),
    }
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        verify(state, token)
    }
}
