//! Response assembly for the fixed, non-stream routes.

use bytes::{Bytes, BytesMut};
use serde::Serialize;

use super::push;
use super::state::RelayState;

/// Body of `/ping`. Field order is the wire order.
#[derive(Debug, Serialize)]
pub(crate) struct PingReply {
    stream: StreamStatus,
}

#[derive(Debug, Serialize)]
struct StreamStatus {
    resolution: Resolution,
    online: bool,
}

#[derive(Debug, Serialize)]
struct Resolution {
    width: u32,
    height: u32,
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>mjpeg-relay</title>
</head>
<body>
    <h1>mjpeg-relay</h1>
    <ul>
        <li><a href="/ping">/ping</a>: stream status as JSON</li>
        <li><a href="/snapshot">/snapshot</a>: current frame as JPEG</li>
        <li><a href="/stream">/stream</a>: live MJPEG stream</li>
    </ul>
</body>
</html>
"#;

/// Assemble a complete HTTP/1.1 response. Connections are single-shot,
/// so every response closes.
fn response(status: &str, content_type: Option<&str>, extra: &[(&str, &str)], body: &[u8]) -> Bytes {
    let mut head = format!("HTTP/1.1 {}\r\n", status);
    if let Some(content_type) = content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    for (name, value) in extra {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));

    let mut buf = BytesMut::with_capacity(head.len() + body.len());
    buf.extend_from_slice(head.as_bytes());
    buf.extend_from_slice(body);
    buf.freeze()
}

/// `GET /`: HTML index linking the other routes.
pub(crate) fn index_response() -> Bytes {
    response("200 OK", Some("text/html"), &[], INDEX_HTML.as_bytes())
}

/// `GET /ping`: resolution and online flag of the exposed frame.
pub(crate) fn ping_response(state: &RelayState) -> Bytes {
    let snapshot = state.frame_snapshot();
    let reply = PingReply {
        stream: StreamStatus {
            resolution: Resolution {
                width: snapshot.width,
                height: snapshot.height,
            },
            online: snapshot.online,
        },
    };
    // Serialization of this reply shape cannot fail
    let body = serde_json::to_string(&reply).unwrap_or_default();
    response("200 OK", Some("application/json"), &[], body.as_bytes())
}

/// `GET /snapshot`: the exposed frame bytes with anti-cache headers and a
/// write-time timestamp.
pub(crate) fn snapshot_response(state: &RelayState) -> Bytes {
    let snapshot = state.frame_snapshot();
    let stamp = push::now_timestamp();
    response(
        "200 OK",
        Some("image/jpeg"),
        &[
            ("Cache-Control", push::ANTI_CACHE),
            ("Pragma", "no-cache"),
            ("Expires", push::EXPIRES),
            ("Access-Control-Allow-Origin", "*"),
            ("X-Timestamp", stamp.as_str()),
        ],
        &snapshot.data,
    )
}

/// `HEAD` on any known route: 200 with an empty body and no body-specific
/// headers.
pub(crate) fn head_ok_response() -> Bytes {
    response("200 OK", None, &[], b"")
}

pub(crate) fn not_found_response() -> Bytes {
    response(
        "404 Not Found",
        Some("text/html"),
        &[],
        b"<h1>404 Not Found</h1>",
    )
}

pub(crate) fn method_not_allowed_response() -> Bytes {
    response(
        "405 Method Not Allowed",
        Some("text/html"),
        &[("Allow", "GET, HEAD")],
        b"<h1>405 Method Not Allowed</h1>",
    )
}

pub(crate) fn bad_request_response() -> Bytes {
    response(
        "400 Bad Request",
        Some("text/html"),
        &[],
        b"<h1>400 Bad Request</h1>",
    )
}
