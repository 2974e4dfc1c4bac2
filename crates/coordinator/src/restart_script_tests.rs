// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;

use dmtcp_core::FakeClock;
use tempfile::tempdir;

use super::*;
use crate::client::ClientId;
use crate::options::Options;

fn test_options(checkpoint_dir: std::path::PathBuf) -> Options {
    Options {
        port: 7779,
        checkpoint_dir,
        tmp_dir: "/tmp".into(),
        checkpoint_interval_seconds: 0,
        exit_on_last: false,
        background: false,
        batch: false,
    }
}

#[test]
fn single_host_script_is_written_and_symlinked() {
    let dir = tempdir().expect("tempdir");
    let mut coord = Coordinator::new(test_options(dir.path().to_path_buf()), FakeClock::new());
    coord.computation_id = dmtcp_core::ComputationId(dmtcp_core::UniqueProcessId::new(1, 2, 100, 3));
    coord.restart_filenames.insert("hostA".into(), vec!["ckpt_a1.dmtcp".into(), "ckpt_a2.dmtcp".into()]);
    coord.registry.insert(
        ClientId(0),
        dmtcp_core::UniqueProcessId::new(1, 2, 100, 3),
        40_000,
        "hostA".into(),
        "prog".into(),
        None,
        dmtcp_core::WorkerState::Checkpointed,
    );

    write(&coord).expect("write succeeds");

    let symlink_path = dir.path().join("dmtcp_restart_script.sh");
    let meta = fs::symlink_metadata(&symlink_path).expect("symlink exists");
    assert!(meta.file_type().is_symlink());

    let target = fs::read_link(&symlink_path).expect("readlink");
    let body = fs::read_to_string(&target).expect("unique script readable");
    assert!(body.contains("#!/bin/bash"));
    assert!(body.contains("ckpt_a1.dmtcp"));
    assert!(body.contains("exec $dmt_rstr_cmd"));

    let perms = fs::metadata(&target).expect("stat").permissions();
    use std::os::unix::fs::PermissionsExt;
    assert_ne!(perms.mode() & 0o100, 0, "script must be executable");
}

#[test]
fn multi_host_script_embeds_worker_ckpts_record() {
    let dir = tempdir().expect("tempdir");
    let mut coord = Coordinator::new(test_options(dir.path().to_path_buf()), FakeClock::new());
    coord.computation_id = dmtcp_core::ComputationId(dmtcp_core::UniqueProcessId::new(1, 2, 100, 1));
    coord.restart_filenames.insert("hostA".into(), vec!["a1.dmtcp".into()]);
    coord.restart_filenames.insert("hostB".into(), vec!["b1.dmtcp".into()]);

    write(&coord).expect("write succeeds");

    let target = unique_filename(&coord);
    let body = fs::read_to_string(&target).expect("unique script readable");
    assert!(body.contains("worker_ckpts='"));
    assert!(body.contains(":: hostA :bg: a1.dmtcp"));
    assert!(body.contains(":: hostB :bg: b1.dmtcp"));
}

#[test]
fn rewriting_the_script_replaces_the_symlink() {
    let dir = tempdir().expect("tempdir");
    let mut coord = Coordinator::new(test_options(dir.path().to_path_buf()), FakeClock::new());
    coord.computation_id = dmtcp_core::ComputationId(dmtcp_core::UniqueProcessId::new(1, 2, 100, 1));
    coord.restart_filenames.insert("hostA".into(), vec!["first.dmtcp".into()]);
    write(&coord).expect("first write succeeds");
    let first_target = fs::read_link(dir.path().join("dmtcp_restart_script.sh")).expect("readlink");

    coord.computation_id.increment_generation();
    coord.restart_filenames.clear();
    coord.restart_filenames.insert("hostA".into(), vec!["second.dmtcp".into()]);
    write(&coord).expect("second write succeeds");
    let second_target = fs::read_link(dir.path().join("dmtcp_restart_script.sh")).expect("readlink");

    assert_ne!(first_target, second_target);
    assert!(fs::read_to_string(&second_target).expect("read").contains("second.dmtcp"));
}
