//! Bounded copies of request and response bodies for log lines.
//!
//! Bodies pass through to the handler and the client untouched; only a copy
//! of at most `limit` bytes is kept for logging.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use futures_util::{stream, StreamExt};
use http_body_util::BodyExt;

use crate::logging::event::{HttpLogData, LogLevel};
use crate::logging::shipper::LogShipper;

/// Up to `limit` bytes of a body, or a note that it was longer.
#[derive(Debug, Clone)]
pub struct BodyCapture {
    buf: Vec<u8>,
    seen: usize,
    limit: usize,
    truncated: bool,
}

impl BodyCapture {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            seen: 0,
            limit,
            truncated: false,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.seen += chunk.len();
        if self.truncated {
            return;
        }
        if self.buf.len() + chunk.len() > self.limit {
            self.mark_incomplete();
        } else {
            self.buf.extend_from_slice(chunk);
        }
    }

    /// Drop the copy; the log line records only that the body was not captured.
    pub fn mark_incomplete(&mut self) {
        self.truncated = true;
        self.buf = Vec::new();
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Bytes observed so far, captured or not.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Read the request body up to the capture limit and hand back a body that
/// replays it in full.
///
/// A body within the limit is forwarded as one buffer. A longer one is
/// forwarded as the chunks already read followed by the rest of the stream;
/// read errors are forwarded to the handler unchanged.
pub async fn capture_request(body: Body, limit: usize) -> (Body, BodyCapture) {
    let mut capture = BodyCapture::new(limit);
    let mut rest = body.into_data_stream();
    let mut head: Vec<Result<Bytes, axum::Error>> = Vec::new();

    while !capture.is_truncated() {
        match rest.next().await {
            Some(Ok(chunk)) => {
                capture.push(&chunk);
                head.push(Ok(chunk));
            }
            Some(Err(e)) => {
                capture.mark_incomplete();
                head.push(Err(e));
                return (Body::from_stream(stream::iter(head)), capture);
            }
            None => {
                let body = Body::from(capture.bytes().to_vec());
                return (body, capture);
            }
        }
    }

    (Body::from_stream(stream::iter(head).chain(rest)), capture)
}

/// A log line waiting for its response body. Shipped exactly once, when the
/// response body is finished or abandoned.
struct PendingLog {
    shipper: Arc<LogShipper>,
    data: HttpLogData,
    capture: BodyCapture,
    failed: Arc<AtomicBool>,
}

impl Drop for PendingLog {
    fn drop(&mut self) {
        if self.failed.load(Ordering::Relaxed) {
            self.capture.mark_incomplete();
        }
        self.data.res_body = self.shipper.render_capture(&self.capture);
        let level = LogLevel::from_status(self.data.status_code);
        self.shipper.log(level, "http", &self.data);
    }
}

/// Wrap a response body so its bytes are copied as they stream to the client.
/// `data` is shipped once the body is done.
pub fn tee_response(shipper: Arc<LogShipper>, data: HttpLogData, body: Body) -> Body {
    let failed = Arc::new(AtomicBool::new(false));
    let mut pending = PendingLog {
        capture: BodyCapture::new(shipper.max_body_bytes()),
        shipper,
        data,
        failed: failed.clone(),
    };

    let body = body
        .inspect_err(move |_| failed.store(true, Ordering::Relaxed))
        .inspect_frame(move |frame| {
            if let Some(chunk) = frame.data_ref() {
                pending.capture.push(chunk);
            }
        });
    Body::new(body)
}
