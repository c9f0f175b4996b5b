// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! FIFO of pending unlock commands. The queue itself is just a channel; the
//! drainer that consumes it lives on [`crate::device::session::DeviceSession`]
//! as a single long-lived worker spawned once at connect time, which is the
//! simplest way to guarantee at-most-one-drainer-per-device without a
//! separate "is a drainer already running" flag.

use tokio::sync::mpsc;

use crate::protocol::frame::COMMAND_LEN;

/// One queued unlock write with its remaining retry budget.
#[derive(Debug, Clone, Copy)]
pub struct PendingUnlock {
    pub command: [u8; COMMAND_LEN],
    pub retries: u8,
}

pub type UnlockSender = mpsc::UnboundedSender<PendingUnlock>;
pub type UnlockReceiver = mpsc::UnboundedReceiver<PendingUnlock>;

/// Create the channel backing one session's unlock queue.
pub fn channel() -> (UnlockSender, UnlockReceiver) {
    mpsc::unbounded_channel()
}
