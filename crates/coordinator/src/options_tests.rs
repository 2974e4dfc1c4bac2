// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    for key in [
        "DMTCP_PORT",
        "DMTCP_CHECKPOINT_DIR",
        "DMTCP_TMPDIR",
        "DMTCP_CHECKPOINT_INTERVAL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_when_nothing_is_given() {
    clear_env();
    let opts = Options::parse_from(["dmtcp_coordinator"]).unwrap();
    assert_eq!(opts.port, env::DEFAULT_PORT);
    assert_eq!(opts.checkpoint_interval_seconds, 0);
    assert!(!opts.exit_on_last);
}

#[test]
#[serial]
fn cli_port_overrides_default() {
    clear_env();
    let opts = Options::parse_from(["dmtcp_coordinator", "--port", "9000"]).unwrap();
    assert_eq!(opts.port, 9000);
}

#[test]
#[serial]
fn env_port_used_when_cli_absent() {
    clear_env();
    std::env::set_var("DMTCP_PORT", "9100");
    let opts = Options::parse_from(["dmtcp_coordinator"]).unwrap();
    assert_eq!(opts.port, 9100);
    std::env::remove_var("DMTCP_PORT");
}

#[test]
#[serial]
fn batch_mode_defaults_interval_to_one_hour() {
    clear_env();
    let opts = Options::parse_from(["dmtcp_coordinator", "--batch"]).unwrap();
    assert_eq!(opts.checkpoint_interval_seconds, 3600);
    assert!(opts.batch);
}

#[test]
#[serial]
fn background_and_batch_are_mutually_exclusive() {
    clear_env();
    let err = Options::parse_from(["dmtcp_coordinator", "--background", "--batch"]).unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidArgs(_)));
}

#[test]
#[serial]
fn explicit_interval_flag_sets_env_and_wins_over_batch_default() {
    clear_env();
    let opts = Options::parse_from(["dmtcp_coordinator", "--batch", "--interval", "42"]).unwrap();
    assert_eq!(opts.checkpoint_interval_seconds, 42);
}
