// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the coordinator. Admission rejections are deliberately
//! *not* modeled here: rejecting a handshake is ordinary control flow, not a
//! failure, and is represented by [`crate::admission::AdmissionOutcome`].

use thiserror::Error;

/// Conditions severe enough to propagate as a `Result` rather than fold into
/// an `Effect`: startup failures (`InvalidArgs`, `BindFailed`) abort before
/// the event loop ever runs; `VirtualPidPoolExhausted` terminates the whole
/// process, since there is no way to admit further workers once the pool is
/// full; `RestartScriptWrite`/`Io` are logged and otherwise non-fatal. Per-
/// client wire faults never reach this enum — the event loop closes the
/// offending socket directly off a `dmtcp_wire::ProtocolError`.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("virtual PID pool exhausted ({live} live entries)")]
    VirtualPidPoolExhausted { live: usize },

    #[error("invalid command-line arguments: {0}")]
    InvalidArgs(String),

    #[error("failed to bind listening socket on port {port}: {source}")]
    BindFailed { port: u16, source: std::io::Error },

    #[error("failed to write restart script {path}: {source}")]
    RestartScriptWrite { path: String, source: std::io::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
