// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis health check over RESP.

use super::{ProbeError, REDIS_TIMEOUT};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// PING, `INFO replication`, QUIT. Healthy when every reply is as expected
/// and the server reports `role:master`.
pub(super) async fn check_master(addr: &str) -> Result<bool, ProbeError> {
    tokio::time::timeout(REDIS_TIMEOUT, converse(addr)).await.map_err(|_| ProbeError::Timeout)?
}

async fn converse(addr: &str) -> Result<bool, ProbeError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ProbeError::Connect(format!("{}: {}", addr, e)))?;
    let mut reader = BufReader::new(stream);

    send(&mut reader, "PING").await?;
    if read_line(&mut reader).await? != "+PONG" {
        return Ok(false);
    }

    send(&mut reader, "INFO replication").await?;
    let info = read_bulk(&mut reader).await?;
    if !info.lines().any(|l| l.trim() == "role:master") {
        return Ok(false);
    }

    send(&mut reader, "QUIT").await?;
    Ok(read_line(&mut reader).await? == "+OK")
}

async fn send(reader: &mut BufReader<TcpStream>, command: &str) -> Result<(), ProbeError> {
    reader
        .get_mut()
        .write_all(format!("{}\r\n", command).as_bytes())
        .await
        .map_err(|e| ProbeError::Connect(format!("write failed: {}", e)))
}

async fn read_line<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<String, ProbeError> {
    let mut line = String::new();
    reader.read_line(&mut line).await.map_err(|e| ProbeError::Protocol(e.to_string()))?;
    Ok(line.trim_end().to_string())
}

/// Read a `$<len>` bulk string reply.
async fn read_bulk<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<String, ProbeError> {
    let header = read_line(reader).await?;
    let len = header
        .strip_prefix('$')
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| ProbeError::Protocol(format!("expected bulk reply, got {:?}", header)))?;
    let mut buf = vec![0u8; len + 2];
    reader.read_exact(&mut buf).await.map_err(|e| ProbeError::Protocol(e.to_string()))?;
    buf.truncate(len);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
#[path = "resp_tests.rs"]
mod tests;
