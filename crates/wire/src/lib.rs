// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for coordinator/worker IPC.
//!
//! Wire format: a fixed-size control record (`ControlRecord::WIRE_LEN` bytes,
//! little-endian) followed by exactly `extra_bytes` bytes of opaque payload.
//! Numeric values on the record are part of the ABI (see `dmtcp_core::MessageType`
//! and `dmtcp_core::WorkerState`).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod message;
mod record;

pub use codec::{read_message, write_message};
pub use message::Message;
pub use record::{
    ControlRecord, ProtocolError, ERROR_INVALID_COMMAND, ERROR_NOT_RUNNING_STATE, MAGIC_COOKIE, NOERROR,
};
