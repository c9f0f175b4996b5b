// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

/// Transport-level errors a [`crate::device::session::DeviceSession`] can
/// encounter. All of these are absorbed inside the session (bounded retry,
/// then a graceful "offline"/"no response") — none of them are meant to
/// reach the API boundary directly.
///
/// A read that exceeds the 2s timeout never reaches this enum: it breaks
/// out of the read loop and is returned as a short frame, which the
/// caller's decode step turns into a malformed-frame skip — see
/// [`crate::device::session::DeviceSession::get_status`]. Likewise a
/// [`crate::protocol::error::ProtocolError`] from a bad bitmap is logged
/// and the board is omitted rather than propagated as a `DeviceError`.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device {0} unreachable")]
    Unreachable(String),
    #[error("connection to {0} was reset")]
    TransportReset(String),
    #[error("short read from {0}")]
    ShortRead(String),
}
