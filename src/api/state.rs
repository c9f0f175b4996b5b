// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Shared state handed to every axum handler: the device registry, the
//! declared config (for status shape), the auth secrets, and the
//! process-wide single-active-token store.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    cfg::config::{DeviceMap, Secrets},
    registry::DeviceRegistry,
};

/// `username -> jti` of the most recently issued token for that user. A
/// presented token is valid only if its `jti` matches the entry here, so
/// minting a new token invalidates any prior one for the same user.
pub type ActiveTokens = DashMap<String, String>;

#[derive(Debug)]
pub struct AppState {
    pub registry: Arc<DeviceRegistry>,
    pub devices: DeviceMap,
    pub secrets: Secrets,
    pub active_tokens: ActiveTokens,
}

impl AppState {
    pub fn new(registry: Arc<DeviceRegistry>, devices: DeviceMap, secrets: Secrets) -> Arc<Self> {
        Arc::new(Self {
            registry,
            devices,
            secrets,
            active_tokens: DashMap::new(),
        })
    }
}
