// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-session short-TTL memo of status responses, keyed by the raw command
//! bytes. Intentionally tiny — cardinality is bounded by `board_count` — so a
//! plain map with lazy expiration is enough; there is no pressure for an
//! LRU policy here.

use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

use crate::protocol::frame::COMMAND_LEN;

const TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Entry {
    response: Vec<u8>,
    inserted_at: Instant,
}

/// Maps a command frame to the last response seen for it, valid for 5
/// seconds from insertion.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<[u8; COMMAND_LEN], Entry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached response for `command` if present and still within
    /// TTL. Stale entries are pruned lazily on lookup.
    pub fn get(&mut self, command: &[u8; COMMAND_LEN]) -> Option<Vec<u8>> {
        match self.entries.get(command) {
            Some(entry) if entry.inserted_at.elapsed() < TTL => {
                Some(entry.response.clone())
            },
            Some(_) => {
                self.entries.remove(command);
                None
            },
            None => None,
        }
    }

    /// Record a fresh response for `command`, overwriting any prior entry.
    pub fn insert(&mut self, command: [u8; COMMAND_LEN], response: Vec<u8>) {
        self.entries.insert(command, Entry {
            response,
            inserted_at: Instant::now(),
        });
    }
}
