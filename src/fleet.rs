// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Fans out status reads across every registered device in parallel and
//! shapes the result by walking the *declared* config, not the responses, so
//! the shape of the map is stable across partial failures.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

use crate::{
    cfg::config::DeviceDescriptor,
    device::session::DeviceSession,
    registry::{DeviceRegistry, RegistryError},
};

/// The status of one declared lock: closed/open, or unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Closed(bool),
    Offline,
}

impl Serialize for LockStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        match self {
            LockStatus::Closed(closed) => serializer.serialize_bool(*closed),
            LockStatus::Offline => serializer.serialize_str("offline"),
        }
    }
}

/// Result of a full fleet status sweep.
#[derive(Debug)]
pub struct FleetStatus {
    pub locks: BTreeMap<String, LockStatus>,
    pub duration: Duration,
}

/// Serializes as `{"id": {<lock_id>: {"status": true|false|"offline"}, ...}}`,
/// matching the wire shape of the system this service replaces. The sweep
/// duration is observability-only and isn't part of the response body.
impl Serialize for FleetStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        use serde::ser::SerializeMap;

        #[derive(Serialize)]
        struct Entry {
            status: LockStatus,
        }

        let mut outer = serializer.serialize_map(Some(1))?;
        let by_id: BTreeMap<&String, Entry> = self
            .locks
            .iter()
            .map(|(id, status)| (id, Entry { status: *status }))
            .collect();
        outer.serialize_entry("id", &by_id)?;
        outer.end()
    }
}

/// Route a pulse request to the device that owns `lock_id` and enqueue the
/// unlock. Returns as soon as the command is queued, not once it's sent:
/// acceptance, not execution, is the caller-visible contract.
pub fn pulse(registry: &DeviceRegistry, lock_id: &str) -> Result<(), RegistryError> {
    let (session, board, lock) = registry.resolve(lock_id)?;
    session.enqueue_unlock(board, lock);
    Ok(())
}

/// Issue `get_status()` against every registered session in parallel and
/// wait for all of them — no early cancellation — then assemble one entry
/// per declared lock regardless of how many devices answered.
pub async fn relay_status(
    registry: &DeviceRegistry,
    devices: &HashMap<String, DeviceDescriptor>,
) -> FleetStatus {
    let started = Instant::now();

    let sessions = registry.all_sessions();
    let reports = poll_all_sessions(sessions).await;
    let by_address: HashMap<String, BTreeMap<u8, BTreeMap<u8, bool>>> =
        reports.into_iter().collect();

    let mut locks = BTreeMap::new();
    for (address, descriptor) in devices {
        let device_status = by_address.get(address);
        for lock in &descriptor.locks {
            let status = device_status
                .and_then(|boards| boards.get(&lock.board))
                .and_then(|board_locks| board_locks.get(&lock.lock))
                .map(|closed| LockStatus::Closed(*closed))
                .unwrap_or(LockStatus::Offline);
            locks.insert(lock.id.clone(), status);
        }
    }

    let duration = started.elapsed();
    info!(duration_ms = duration.as_millis() as u64, "fleet status request completed");
    FleetStatus { locks, duration }
}

/// Spawn one task per session so the `board_count x 3 retries` worst case of
/// a single slow/unreachable device never delays the others; join all of
/// them before returning (no early cancellation).
async fn poll_all_sessions(
    sessions: Vec<(String, Arc<DeviceSession>)>,
) -> Vec<(String, BTreeMap<u8, BTreeMap<u8, bool>>)> {
    let tasks: Vec<_> = sessions
        .into_iter()
        .map(|(address, session)| {
            tokio::spawn(async move {
                let status = session.get_status().await;
                (address, status)
            })
        })
        .collect();

    let mut out = Vec::with_capacity(tasks.len());
    for task in tasks {
        if let Ok(pair) = task.await {
            out.push(pair);
        }
    }
    out
}
