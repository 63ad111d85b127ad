// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 client over TCP.
//!
//! Reads responses using Content-Length or chunked framing, so a server that
//! keeps the connection open does not stall the check.

use super::{ProbeError, PROBE_TIMEOUT};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl HttpTarget {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split an `http://host[:port][/path]` URL. The port defaults to 80.
pub fn parse_http_url(url: &str) -> Result<HttpTarget, ProbeError> {
    let rest = url.strip_prefix("http://").ok_or_else(|| ProbeError::InvalidUrl(url.to_string()))?;
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    if authority.is_empty() {
        return Err(ProbeError::InvalidUrl(url.to_string()));
    }
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| ProbeError::InvalidUrl(url.to_string()))?;
            (host, port)
        }
        None => (authority, 80),
    };
    Ok(HttpTarget { host: host.to_string(), port, path: path.to_string() })
}

/// Connect, send, and read within [`PROBE_TIMEOUT`].
pub(super) async fn timed_request(addr: &str, request: &str) -> Result<String, ProbeError> {
    tokio::time::timeout(PROBE_TIMEOUT, send_request(addr, request))
        .await
        .map_err(|_| ProbeError::Timeout)?
}

async fn send_request(addr: &str, request: &str) -> Result<String, ProbeError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ProbeError::Connect(format!("{}: {}", addr, e)))?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| ProbeError::Connect(format!("write failed: {}", e)))?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub(super) async fn read_http_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<String, ProbeError> {
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(|e| ProbeError::Protocol(format!("read status failed: {}", e)))?;

    let status_code =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);
    if status_code == 0 {
        return Err(ProbeError::Protocol(format!("bad status line: {:?}", status_line.trim())));
    }

    // Header names are matched case-insensitively
    let mut content_length: usize = 0;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| ProbeError::Protocol(format!("read header failed: {}", e)))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line_lower.strip_prefix("transfer-encoding:") {
            chunked = val.split(',').any(|coding| coding.trim() == "chunked");
        }
    }

    let body = if chunked {
        read_chunked_body(reader).await?
    } else if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|e| ProbeError::Protocol(format!("read body failed: {}", e)))?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    };

    if status_code >= 400 {
        return Err(ProbeError::Status { code: status_code, body: body.trim().to_string() });
    }

    Ok(body)
}

/// Decode a chunked body up to the terminating zero-size chunk.
async fn read_chunked_body<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<String, ProbeError> {
    let read_failed = |e: std::io::Error| ProbeError::Protocol(format!("read body failed: {}", e));
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await.map_err(read_failed)?;
        // Chunk extensions follow a ';'
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| {
            ProbeError::Protocol(format!("bad chunk size: {:?}", size_line.trim()))
        })?;
        if size == 0 {
            // Skip trailers through the closing blank line
            loop {
                let mut trailer = String::new();
                let n = reader.read_line(&mut trailer).await.map_err(read_failed)?;
                if n == 0 || trailer == "\r\n" || trailer == "\n" {
                    break;
                }
            }
            break;
        }
        let start = body.len();
        body.resize(start + size, 0);
        reader.read_exact(&mut body[start..]).await.map_err(read_failed)?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await.map_err(read_failed)?;
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
