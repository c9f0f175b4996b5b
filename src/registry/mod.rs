// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Maps device address to device session, and logical lock-id to the
//! `(address, board, lock)` triple that resolves it. Lookups never block on
//! a device operation: the registry only ever hands out an `Arc` to a
//! session, which the caller then drives itself.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::device::session::DeviceSession;

pub mod init;

/// Where a logical lock id lives in the fleet.
#[derive(Debug, Clone)]
pub struct LockLocation {
    pub address: String,
    pub board: u8,
    pub lock: u8,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("lock id {0:?} not found")]
    NotFound(String),
}

/// Device address -> session, and lock-id -> location. Both maps grow only
/// (sessions are added as devices come online; locks are added alongside
/// the session that owns them) and are never removed from for the life of
/// the process.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    sessions: DashMap<String, Arc<DeviceSession>>,
    lock_lookup: DashMap<String, LockLocation>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_session(&self, address: &str) -> bool {
        self.sessions.contains_key(address)
    }

    /// Install a session under `address`. Exposed beyond the initializer so
    /// integration tests can assemble a registry against a mock device
    /// listening on an ephemeral port instead of the real port 23.
    pub fn insert_session(&self, address: String, session: Arc<DeviceSession>) {
        self.sessions.insert(address, session);
    }

    /// Register where a logical lock id resolves to. See
    /// [`Self::insert_session`] for why this is public.
    pub fn insert_lock(&self, lock_id: String, location: LockLocation) {
        self.lock_lookup.insert(lock_id, location);
    }

    /// Resolve a logical lock id to its owning session and board/lock pair.
    pub fn resolve(
        &self,
        lock_id: &str,
    ) -> Result<(Arc<DeviceSession>, u8, u8), RegistryError> {
        let location = self
            .lock_lookup
            .get(lock_id)
            .ok_or_else(|| RegistryError::NotFound(lock_id.to_string()))?;
        let session = self
            .sessions
            .get(&location.address)
            .ok_or_else(|| RegistryError::NotFound(lock_id.to_string()))?;
        Ok((Arc::clone(&session), location.board, location.lock))
    }

    /// All currently connected sessions, paired with their device address.
    pub fn all_sessions(&self) -> Vec<(String, Arc<DeviceSession>)> {
        self.sessions
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }
}
