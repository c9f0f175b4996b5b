// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Process-wide `tracing` setup. A single subscriber, driven by `LOG_LEVEL`
//! (falling back to `info`), writing leveled fmt output to stdout. No span
//! field capture, no file rotation: a single-binary service doesn't need
//! either.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. Call once at process start,
/// before any other module logs.
pub fn init_logger() -> Result<()> {
    let env_filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install global tracing subscriber: {e}"))
}
