//! Outbound response sinks.
//!
//! # Responsibilities
//! - Define the base write contract (`headers`, `write_header`, `write`)
//! - Expose the optional `flush` and `hijack` capabilities, each queryable
//!   on its own; unsupported capabilities answer `ResponseError::Unsupported`
//! - Provide `StreamingSink`, the sink routed requests write to, and
//!   `BufferedSink` for the server's own 404/405 answers
//!
//! # Design Decisions
//! - Sinks do not enforce write-once; `Response` does, so a sink sees at
//!   most one `write_header` call per request
//! - `StreamingSink` buffers until the first `flush`. Only then does the
//!   response head leave, so handlers that never flush still get a
//!   `Content-Length` and a single-frame body
//! - Chunks are handed over with `blocking_send`; the sink must only be
//!   flushed from the blocking pool the handler chain runs on
//!
//! # Data Flow
//! ```text
//! handler writes → buffer
//! first flush    → head (status, headers, channel body) → oneshot → server
//! every flush    → buffered bytes → mpsc → hyper body frame
//! finish         → last bytes sent, channel closed (or, without a flush,
//!                  one buffered response returned)
//! ```

use std::io;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};
use hyper::upgrade::OnUpgrade;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Capability, ResponseError};

/// The transport-facing side of a response.
pub trait ResponseSink: Send {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers.
    fn write_header(&mut self, status: StatusCode);

    /// Append body bytes.
    fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Whether an optional capability is available.
    fn supports(&self, _capability: Capability) -> bool {
        false
    }

    /// Push buffered bytes to the client.
    fn flush(&mut self) -> Result<(), ResponseError> {
        Err(ResponseError::Unsupported(Capability::Flush))
    }

    /// Take over the connection once the response is sent.
    fn hijack(&mut self) -> Result<OnUpgrade, ResponseError> {
        Err(ResponseError::Unsupported(Capability::Hijack))
    }

    /// Produce the final response. A sink that already handed its response
    /// to the transport returns an empty one carrying the same status.
    fn finish(self: Box<Self>) -> axum::http::Response<Body>;
}

fn assemble(status: Option<StatusCode>, headers: HeaderMap, body: Body) -> axum::http::Response<Body> {
    let mut response = axum::http::Response::new(body);
    *response.status_mut() = status.unwrap_or(StatusCode::OK);
    *response.headers_mut() = headers;
    response
}

/// Sink that buffers the whole body in memory.
///
/// Supports `hijack` when the connection offered an upgrade; never supports
/// `flush`.
#[derive(Debug, Default)]
pub struct BufferedSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    upgrade: Option<OnUpgrade>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the connection's upgrade handle so handlers can hijack it.
    pub fn with_upgrade(mut self, upgrade: Option<OnUpgrade>) -> Self {
        self.upgrade = upgrade;
        self
    }
}

impl ResponseSink for BufferedSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::Hijack && self.upgrade.is_some()
    }

    fn hijack(&mut self) -> Result<OnUpgrade, ResponseError> {
        self.upgrade
            .take()
            .ok_or(ResponseError::Unsupported(Capability::Hijack))
    }

    fn finish(self: Box<Self>) -> axum::http::Response<Body> {
        let BufferedSink {
            status,
            headers,
            body,
            ..
        } = *self;
        assemble(status, headers, Body::from(body.freeze()))
    }
}

/// Frames a flushed response may queue before the writer blocks.
const STREAM_CAPACITY: usize = 16;

/// The server's handle on a `StreamingSink`: resolves once the handler
/// flushes, and is dropped unresolved when it never does.
pub type StreamedResponse = oneshot::Receiver<axum::http::Response<Body>>;

/// Sink that supports `flush` by switching to a streamed body.
#[derive(Debug)]
pub struct StreamingSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    buffer: BytesMut,
    head: Option<oneshot::Sender<axum::http::Response<Body>>>,
    frames: Option<mpsc::Receiver<io::Result<Bytes>>>,
    sender: mpsc::Sender<io::Result<Bytes>>,
    streaming: bool,
    upgrade: Option<OnUpgrade>,
}

impl StreamingSink {
    pub fn new() -> (Self, StreamedResponse) {
        let (head, streamed) = oneshot::channel();
        let (sender, frames) = mpsc::channel(STREAM_CAPACITY);
        let sink = Self {
            status: None,
            headers: HeaderMap::new(),
            buffer: BytesMut::new(),
            head: Some(head),
            frames: Some(frames),
            sender,
            streaming: false,
            upgrade: None,
        };
        (sink, streamed)
    }

    pub fn with_upgrade(mut self, upgrade: Option<OnUpgrade>) -> Self {
        self.upgrade = upgrade;
        self
    }

    fn start_stream(&mut self) -> Result<(), ResponseError> {
        if self.streaming {
            return Ok(());
        }
        let (Some(head), Some(frames)) = (self.head.take(), self.frames.take()) else {
            return Err(ResponseError::Disconnected);
        };
        let body = Body::from_stream(ReceiverStream::new(frames));
        head.send(assemble(self.status, self.headers.clone(), body))
            .map_err(|_| ResponseError::Disconnected)?;
        self.streaming = true;
        Ok(())
    }

    fn push(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = self.buffer.split().freeze();
        self.sender
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client stopped reading"))
    }
}

impl ResponseSink for StreamingSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Flush => true,
            Capability::Hijack => self.upgrade.is_some(),
        }
    }

    fn flush(&mut self) -> Result<(), ResponseError> {
        self.start_stream()?;
        self.push().map_err(|_| ResponseError::Disconnected)
    }

    fn hijack(&mut self) -> Result<OnUpgrade, ResponseError> {
        self.upgrade
            .take()
            .ok_or(ResponseError::Unsupported(Capability::Hijack))
    }

    fn finish(self: Box<Self>) -> axum::http::Response<Body> {
        let mut sink = *self;
        if !sink.streaming {
            return assemble(sink.status, sink.headers, Body::from(sink.buffer.freeze()));
        }
        if let Err(error) = sink.push() {
            tracing::debug!(error = %error, "Streamed response dropped by client");
        }
        assemble(sink.status, HeaderMap::new(), Body::empty())
    }
}
