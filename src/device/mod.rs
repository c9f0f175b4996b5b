// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-device connection lifecycle: the session owning one TCP connection,
//! its response cache, and its unlock command queue.

pub mod cache;
pub mod error;
pub mod queue;
pub mod session;
