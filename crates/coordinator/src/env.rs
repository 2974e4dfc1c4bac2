// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the coordinator crate.

use std::path::PathBuf;

/// Default listening port when neither `--port` nor `DMTCP_PORT` is set.
pub const DEFAULT_PORT: u16 = 7779;

/// TCP port: `DMTCP_PORT`.
pub fn port() -> Option<u16> {
    std::env::var("DMTCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Checkpoint image directory: `DMTCP_CHECKPOINT_DIR`, default `.`.
pub fn checkpoint_dir() -> PathBuf {
    std::env::var("DMTCP_CHECKPOINT_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Scratch directory for coordinator-owned temp files: `DMTCP_TMPDIR`, default `/tmp`.
pub fn tmp_dir() -> PathBuf {
    std::env::var("DMTCP_TMPDIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Periodic checkpoint interval in seconds: `DMTCP_CHECKPOINT_INTERVAL`, default 0 (disabled).
pub fn checkpoint_interval_seconds() -> u32 {
    std::env::var("DMTCP_CHECKPOINT_INTERVAL").ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or(0)
}

/// Hostname embedded in generated restart scripts: `DMTCP_HOST`, falling back to `HOSTNAME`
/// and finally the literal `localhost`.
pub fn coordinator_host() -> String {
    std::env::var("DMTCP_HOST")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}

/// Sets the environment-variable fallback for checkpoint directory, mirroring the `--ckptdir`
/// CLI flag's documented effect of also setting the environment for any child processes.
pub fn set_checkpoint_dir(dir: &str) {
    std::env::set_var("DMTCP_CHECKPOINT_DIR", dir);
}

/// Sets the environment-variable fallback for the scratch directory (`--tmpdir`).
pub fn set_tmp_dir(dir: &str) {
    std::env::set_var("DMTCP_TMPDIR", dir);
}

/// Sets the environment-variable fallback for the checkpoint interval (`--interval`).
pub fn set_checkpoint_interval_seconds(seconds: u32) {
    std::env::set_var("DMTCP_CHECKPOINT_INTERVAL", seconds.to_string());
}
