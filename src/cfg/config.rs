// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use serde::Deserialize;
use thiserror::Error;

use crate::protocol::frame::LOCKS_PER_BOARD;

/// Falls back to this key if `SECRET_KEY` isn't set in the environment,
/// matching the behavior of the system this crate reimplements.
const DEFAULT_SECRET_KEY: &str =
    "0511e09a13eeb1b552b86fff313ad7c53fa0bb0828ce5df9fbd09b2faea4ade7";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
    #[error("device {address:?} has boards=0, must be >= 1")]
    InvalidBoardCount { address: String },
    #[error("lock {id:?} on device {address:?} references board {board}, but the device only has {boards} board(s)")]
    BoardOutOfRange {
        address: String,
        id: String,
        board: u8,
        boards: u8,
    },
    #[error("lock {id:?} on device {address:?} has lock number {lock}, must be in 1..={max}")]
    LockOutOfRange {
        address: String,
        id: String,
        lock: u8,
        max: u8,
    },
    #[error("duplicate lock id {0:?} across the fleet")]
    DuplicateLockId(String),
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
}

/// One lock declared under a device in `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LockMapping {
    pub id: String,
    pub board: u8,
    pub lock: u8,
}

/// One device entry in `config.json`: its board count and declared locks.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceDescriptor {
    pub boards: u8,
    #[serde(default)]
    pub locks: Vec<LockMapping>,
}

pub type DeviceMap = HashMap<String, DeviceDescriptor>;

/// Operator credentials and the HMAC key used to sign bearer tokens, sourced
/// from the environment. `USERNAME`/`PASSWORD_HASH` are mandatory; missing
/// either one aborts startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub jwt_secret: String,
    pub username: String,
    pub password_hash: String,
}

impl Secrets {
    fn from_env() -> Result<Self, ConfigError> {
        let username = non_empty_env("USERNAME").ok_or(ConfigError::MissingEnv("USERNAME"))?;
        let password_hash =
            non_empty_env("PASSWORD_HASH").ok_or(ConfigError::MissingEnv("PASSWORD_HASH"))?;
        let jwt_secret =
            non_empty_env("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());

        Ok(Self {
            jwt_secret,
            username,
            password_hash,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// The loaded device map plus the operator secrets needed to run the
/// service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub devices: DeviceMap,
    pub secrets: Secrets,
}

impl AppConfig {
    /// Load `config.json` from `path` and the secrets from the environment.
    /// Validates board bounds and fleet-wide lock-id uniqueness; any
    /// violation is fatal (`ConfigError`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let devices = load_devices(path)?;
        validate_devices(&devices)?;
        let secrets = Secrets::from_env()?;
        Ok(Self { devices, secrets })
    }
}

fn load_devices(path: &Path) -> Result<DeviceMap, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn validate_devices(devices: &DeviceMap) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for (address, descriptor) in devices {
        if descriptor.boards == 0 {
            return Err(ConfigError::InvalidBoardCount {
                address: address.clone(),
            });
        }
        for lock in &descriptor.locks {
            if lock.board >= descriptor.boards {
                return Err(ConfigError::BoardOutOfRange {
                    address: address.clone(),
                    id: lock.id.clone(),
                    board: lock.board,
                    boards: descriptor.boards,
                });
            }
            if lock.lock == 0 || lock.lock > LOCKS_PER_BOARD {
                return Err(ConfigError::LockOutOfRange {
                    address: address.clone(),
                    id: lock.id.clone(),
                    lock: lock.lock,
                    max: LOCKS_PER_BOARD,
                });
            }
            if !seen_ids.insert(lock.id.clone()) {
                return Err(ConfigError::DuplicateLockId(lock.id.clone()));
            }
        }
    }

    Ok(())
}
