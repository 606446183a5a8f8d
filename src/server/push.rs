//! Byte-level assembly of the multipart MJPEG push protocol.
//!
//! The wire format is fixed: browsers and players key on the exact
//! boundary and header layout, so everything here is emitted verbatim.

use bytes::BytesMut;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Literal multipart boundary token.
pub const BOUNDARY: &str = "boundarydonotcross";

/// Cache-busting directives shared by the stream preamble and `/snapshot`.
pub(crate) const ANTI_CACHE: &str =
    "no-store, no-cache, must-revalidate, pre-check=0, post-check=0, max-age=0";

/// A date in the past, shared by the stream preamble and `/snapshot`.
pub(crate) const EXPIRES: &str = "Mon, 3 Jan 2000 12:34:56 GMT";

/// Status line, headers and first boundary, sent once per client as a
/// single contiguous write.
pub(crate) const PREAMBLE: &[u8] = b"HTTP/1.0 200 OK\r\n\
Access-Control-Allow-Origin: *\r\n\
Cache-Control: no-store, no-cache, must-revalidate, pre-check=0, post-check=0, max-age=0\r\n\
Pragma: no-cache\r\n\
Expires: Mon, 3 Jan 2000 12:34:56 GMT\r\n\
Content-Type: multipart/x-mixed-replace;boundary=boundarydonotcross\r\n\
\r\n\
--boundarydonotcross\r\n";

/// Format a wall-clock offset as `<sec>.<usec>`, truncating nanoseconds.
pub(crate) fn timestamp(now: Duration) -> String {
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Timestamp for the current wall-clock time, sampled at write time.
pub(crate) fn now_timestamp() -> String {
    timestamp(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default(),
    )
}

/// Append one boundary-delimited part: headers, JPEG payload, trailing
/// boundary line.
pub(crate) fn write_part(buf: &mut BytesMut, jpeg: &[u8], stamp: &str) {
    let header = format!(
        "Content-Type: image/jpeg\r\nContent-Length: {}\r\nX-Timestamp: {}\r\n\r\n",
        jpeg.len(),
        stamp
    );
    buf.reserve(header.len() + jpeg.len() + BOUNDARY.len() + 6);
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(jpeg);
    buf.extend_from_slice(b"\r\n--boundarydonotcross\r\n");
}
