// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Builds the device registry from config at startup, then keeps retrying
//! any device that failed to connect in the background until the whole
//! fleet is reachable.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    cfg::config::DeviceDescriptor,
    device::session::DeviceSession,
    registry::{DeviceRegistry, LockLocation},
};

const RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Attempt to connect every device not already present in `registry`. Returns
/// `true` once every configured device has a session.
async fn connect_missing(
    registry: &DeviceRegistry,
    devices: &HashMap<String, DeviceDescriptor>,
) -> bool {
    let mut all_connected = true;
    for (address, descriptor) in devices {
        if registry.has_session(address) {
            continue;
        }
        match DeviceSession::connect(address.clone(), descriptor.boards).await {
            Ok(session) => {
                registry.insert_session(address.clone(), session);
                for lock in &descriptor.locks {
                    registry.insert_lock(lock.id.clone(), LockLocation {
                        address: address.clone(),
                        board: lock.board,
                        lock: lock.lock,
                    });
                }
                info!(address, "device initialized successfully");
            },
            Err(e) => {
                warn!(address, error = %e, "failed to initialize device");
                all_connected = false;
            },
        }
    }
    all_connected
}

/// Build the registry synchronously (best effort) and spawn a background
/// task that retries every 10 seconds until all configured devices are
/// present.
pub async fn initialize(devices: HashMap<String, DeviceDescriptor>) -> Arc<DeviceRegistry> {
    let registry = Arc::new(DeviceRegistry::new());

    if !connect_missing(&registry, &devices).await {
        let background = Arc::clone(&registry);
        tokio::spawn(async move {
            loop {
                sleep(RETRY_INTERVAL).await;
                if connect_missing(&background, &devices).await {
                    info!("all devices initialized successfully");
                    break;
                }
            }
        });
    } else {
        info!("all devices initialized successfully");
    }

    registry
}
