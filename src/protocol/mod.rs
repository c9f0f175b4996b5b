// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pure encode/decode for the type-C relay board wire protocol. No I/O, no
//! state — see [`crate::device`] for the stateful session that drives this
//! codec over a TCP connection.

pub mod error;
pub mod frame;
