// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

/// Errors surfaced by the frame codec. Pure decode failures only — this
/// module never touches a socket.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed response frame: expected 12 bytes, got {0}")]
    MalformedFrame(usize),
}
