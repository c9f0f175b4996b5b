// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "lockfleetd", about = "Fleet controller for type-C relay lock boards")]
pub struct Cli {
    /// Path to the device map (config.json).
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Address the HTTP API listens on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,
}

pub fn resolve_config_path(rel: impl AsRef<Path>) -> Result<PathBuf> {
    let p = rel.as_ref();

    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot get current working dir")?
            .join(p)
    };

    let canon = abs
        .canonicalize()
        .with_context(|| format!("failed to canonicalize path {abs:?}"))?;

    Ok(canon)
}
