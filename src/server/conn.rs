//! Per-connection request handling.
//!
//! Each accepted socket is parsed just far enough to dispatch: method and
//! request target, exact matches only. `/stream` takes the socket over for
//! raw multipart writes; everything else gets a single response and the
//! connection closes.

use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::handlers;
use super::state::RelayState;

const MAX_REQUEST_BYTES: usize = 8192;

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Request {
    pub method: String,
    pub target: String,
}

/// Parse the request line out of a raw request head.
pub(crate) fn parse_request_head(head: &[u8]) -> Option<Request> {
    let text = std::str::from_utf8(head).ok()?;
    let line = text.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    Some(Request {
        method: method.to_string(),
        target: target.to_string(),
    })
}

/// Read until the end of the request head (or the size cap).
async fn read_request_head(stream: &mut TcpStream) -> io::Result<Option<Vec<u8>>> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|window| window == b"\r\n\r\n") || head.len() > MAX_REQUEST_BYTES {
            return Ok(Some(head));
        }
    }
}

async fn respond(mut stream: TcpStream, response: Bytes) {
    if let Err(e) = stream.write_all(&response).await {
        debug!("Response write failed: {}", e);
        return;
    }
    let _ = stream.shutdown().await;
}

/// Drive one accepted connection to completion.
pub(crate) async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: Arc<RelayState>,
    request_timeout: Duration,
    shutdown: CancellationToken,
) {
    let head = match timeout(request_timeout, read_request_head(&mut stream)).await {
        Ok(Ok(Some(head))) => head,
        Ok(Ok(None)) => {
            debug!("Client {} closed before sending a request", peer);
            return;
        }
        Ok(Err(e)) => {
            debug!("Request read from {} failed: {}", peer, e);
            return;
        }
        Err(_) => {
            debug!("Request from {} timed out", peer);
            return;
        }
    };

    let Some(request) = parse_request_head(&head) else {
        respond(stream, handlers::bad_request_response()).await;
        return;
    };

    debug!("{} {} from {}", request.method, request.target, peer);

    match (request.method.as_str(), request.target.as_str()) {
        ("GET", "/stream") => serve_stream(stream, peer, state, shutdown).await,
        ("GET", "/") => respond(stream, handlers::index_response()).await,
        ("GET", "/ping") => respond(stream, handlers::ping_response(&state)).await,
        ("GET", "/snapshot") => respond(stream, handlers::snapshot_response(&state)).await,
        ("HEAD", "/" | "/ping" | "/snapshot" | "/stream") => {
            respond(stream, handlers::head_ok_response()).await
        }
        ("GET", _) | ("HEAD", _) => respond(stream, handlers::not_found_response()).await,
        _ => respond(stream, handlers::method_not_allowed_response()).await,
    }
}

/// Register the client and relay fan-out buffers onto the socket until it
/// goes away.
///
/// The read half stays armed so EOF from the client surfaces immediately;
/// the receiver closing means the fan-out evicted us or the server is
/// shutting down. Every exit path removes the client, and removal is
/// idempotent.
async fn serve_stream(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: Arc<RelayState>,
    shutdown: CancellationToken,
) {
    let (id, mut rx) = state.registry().lock().add();
    info!("Stream client {} connected from {}", id, peer);

    let (mut reader, mut writer) = stream.split();
    let mut drain = [0u8; 512];

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(bytes) => {
                    if let Err(e) = writer.write_all(&bytes).await {
                        debug!("Stream write to {} failed: {}", id, e);
                        break;
                    }
                }
                None => break,
            },
            read = reader.read(&mut drain) => match read {
                Ok(0) => {
                    debug!("Stream client {} hung up", id);
                    break;
                }
                // Streaming clients are not expected to talk; discard
                Ok(_) => {}
                Err(e) => {
                    debug!("Stream read from {} failed: {}", id, e);
                    break;
                }
            },
            _ = shutdown.cancelled() => break,
        }
    }

    state.registry().lock().remove(&id);
    info!("Stream client {} disconnected", id);
}
