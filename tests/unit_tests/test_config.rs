// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::Path;

use lockfleet_rs::cfg::config::{AppConfig, DeviceMap};
use serial_test::serial;

fn set_valid_secrets_env() {
    unsafe {
        std::env::set_var("USERNAME", "admin");
        std::env::set_var("PASSWORD_HASH", "not-a-real-hash-but-present");
        std::env::set_var("SECRET_KEY", "unit-test-secret");
    }
}

fn clear_secrets_env() {
    unsafe {
        std::env::remove_var("USERNAME");
        std::env::remove_var("PASSWORD_HASH");
        std::env::remove_var("SECRET_KEY");
    }
}

#[test]
fn fixture_config_deserializes_into_the_declared_device_map() {
    let raw = std::fs::read_to_string("tests/fixtures/config.json").expect("fixture readable");
    let devices: DeviceMap = serde_json::from_str(&raw).expect("fixture parses");

    assert_eq!(devices.len(), 2);
    let dev1 = &devices["10.0.0.1"];
    assert_eq!(dev1.boards, 1);
    assert_eq!(dev1.locks.len(), 2);
    let dev2 = &devices["10.0.0.2"];
    assert_eq!(dev2.locks[0].board, 1);
    assert_eq!(dev2.locks[0].lock, 48);
}

#[test]
#[serial]
fn loading_a_well_formed_config_succeeds_once_secrets_are_present() {
    set_valid_secrets_env();
    let loaded = AppConfig::load(Path::new("tests/fixtures/config.json"));
    clear_secrets_env();

    let config = loaded.expect("valid config and secrets should load");
    assert_eq!(config.devices.len(), 2);
    assert_eq!(config.secrets.username, "admin");
}

#[test]
#[serial]
fn missing_username_env_var_is_a_fatal_startup_error() {
    clear_secrets_env();
    unsafe {
        std::env::set_var("PASSWORD_HASH", "whatever");
    }

    let err = AppConfig::load(Path::new("tests/fixtures/config.json")).unwrap_err();
    clear_secrets_env();

    assert!(matches!(err, lockfleet_rs::cfg::config::ConfigError::MissingEnv("USERNAME")));
}

#[test]
#[serial]
fn duplicate_lock_ids_across_devices_fail_startup() {
    set_valid_secrets_env();
    let err = AppConfig::load(Path::new("tests/fixtures/config_duplicate_id.json")).unwrap_err();
    clear_secrets_env();

    assert!(matches!(
        err,
        lockfleet_rs::cfg::config::ConfigError::DuplicateLockId(id) if id == "A"
    ));
}
