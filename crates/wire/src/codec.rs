// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async framing: read/write one control record plus its payload as a unit.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::message::Message;
use crate::record::{ControlRecord, ProtocolError};

/// Reads exactly one framed message. A short read before a single full
/// record is consumed is a fatal protocol error on that socket.
pub async fn read_message<R>(reader: &mut R) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut record_buf = [0u8; ControlRecord::WIRE_LEN];
    reader.read_exact(&mut record_buf).await?;
    let record = ControlRecord::decode(&record_buf)?;

    let mut payload = vec![0u8; record.extra_bytes as usize];
    if !payload.is_empty() {
        reader.read_exact(&mut payload).await?;
    }

    Message::new(record, payload)
}

/// Writes one framed message: the fixed record, then its payload.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = message.record.encode();
    writer.write_all(&bytes).await?;
    if !message.payload.is_empty() {
        writer.write_all(&message.payload).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
