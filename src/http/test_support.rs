//! Fixtures shared by the http unit tests.

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};

use crate::config::Settings;
use crate::http::request::{decorate, Request, RequestBody};
use crate::http::response::{RequestHead, Response, ResponseSink};

#[derive(Debug, Default)]
struct Recorded {
    status: Option<StatusCode>,
    header_writes: usize,
    body: Vec<u8>,
}

/// Observes what a `RecordingSink` received.
#[derive(Debug, Clone, Default)]
pub struct Probe(Arc<Mutex<Recorded>>);

impl Probe {
    pub fn status(&self) -> Option<StatusCode> {
        self.0.lock().unwrap().status
    }

    pub fn header_writes(&self) -> usize {
        self.0.lock().unwrap().header_writes
    }

    pub fn body(&self) -> Vec<u8> {
        self.0.lock().unwrap().body.clone()
    }
}

/// Sink that records every call; supports no optional capability.
#[derive(Debug, Default)]
pub struct RecordingSink {
    headers: HeaderMap,
    probe: Probe,
}

impl ResponseSink for RecordingSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        let mut recorded = self.probe.0.lock().unwrap();
        recorded.status = Some(status);
        recorded.header_writes += 1;
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.probe.0.lock().unwrap().body.extend_from_slice(chunk);
        Ok(())
    }

    fn finish(self: Box<Self>) -> axum::http::Response<Body> {
        let mut response = axum::http::Response::new(Body::from(self.probe.body()));
        *response.status_mut() = self.probe.status().unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

pub fn response() -> (Response, Probe) {
    response_for(RequestHead::default())
}

pub fn response_for(head: RequestHead) -> (Response, Probe) {
    let probe = Probe::default();
    let sink = RecordingSink {
        headers: HeaderMap::new(),
        probe: probe.clone(),
    };
    (Response::new(Box::new(sink), head), probe)
}

pub fn request(uri: &str) -> Request {
    request_with(uri, |_| {})
}

pub fn request_with(uri: &str, edit: impl FnOnce(&mut axum::http::Request<()>)) -> Request {
    let mut raw = axum::http::Request::get(uri)
        .header("host", "example.com")
        .body(())
        .unwrap();
    edit(&mut raw);
    let (parts, ()) = raw.into_parts();
    decorate(
        parts,
        RequestBody::empty(),
        Vec::new(),
        "/",
        &Settings::default(),
        &HeaderMap::new(),
    )
    .unwrap()
}
