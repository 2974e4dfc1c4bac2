// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_epoch_seconds() {
    let clock = FakeClock::new();
    let before = clock.epoch_seconds();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.epoch_seconds(), before + 5);
}

#[test]
fn coord_timestamp_packs_seconds_and_deciseconds() {
    let clock = FakeClock::new();
    clock.set_epoch_seconds(1_700_000_000);
    let ts = clock.coord_timestamp();
    assert_eq!(ts >> 4, 1_700_000_000);
    assert_eq!(ts & 0xF, 0);
}

#[test]
fn set_epoch_seconds_is_observable_immediately() {
    let clock = FakeClock::new();
    clock.set_epoch_seconds(42);
    assert_eq!(clock.epoch_seconds(), 42);
}
