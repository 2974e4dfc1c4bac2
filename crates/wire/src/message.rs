// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A decoded control record plus its variable-length payload.

use crate::record::{ControlRecord, ProtocolError};

/// One complete wire message: the fixed record and its `extra_bytes` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub record: ControlRecord,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(record: ControlRecord, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        if payload.len() != record.extra_bytes as usize {
            return Err(ProtocolError::PayloadMismatch {
                expected: record.extra_bytes,
                actual: payload.len(),
            });
        }
        Ok(Self { record, payload })
    }

    /// Splits a lookup-service payload into its key and value slices, per
    /// `record.key_len` / `record.val_len`.
    pub fn key_value(&self) -> Option<(&[u8], &[u8])> {
        let key_len = self.record.key_len as usize;
        let val_len = self.record.val_len as usize;
        if key_len + val_len != self.payload.len() {
            return None;
        }
        Some((&self.payload[..key_len], &self.payload[key_len..]))
    }

    /// Parses a `DMT_CKPT_FILENAME` payload of the form `<filename>\0<hostname>\0`.
    pub fn ckpt_filename_and_hostname(&self) -> Option<(&str, &str)> {
        let mut parts = self.payload.split(|&b| b == 0).filter(|s| !s.is_empty());
        let filename = std::str::from_utf8(parts.next()?).ok()?;
        let hostname = std::str::from_utf8(parts.next()?).ok()?;
        Some((filename, hostname))
    }

    pub fn encode_ckpt_filename_payload(filename: &str, hostname: &str) -> Vec<u8> {
        let mut payload = Vec::with_capacity(filename.len() + hostname.len() + 2);
        payload.extend_from_slice(filename.as_bytes());
        payload.push(0);
        payload.extend_from_slice(hostname.as_bytes());
        payload.push(0);
        payload
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
