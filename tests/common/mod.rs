//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use tokio::net::TcpListener;
use tower::ServiceExt;

use trellis::{Application, Handler};

/// What a test observed from one response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Drive one request through the application in process.
pub async fn send(app: &Application, request: Request<Body>) -> Reply {
    let response = app.router().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

pub async fn get(app: &Application, uri: &str) -> Reply {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

/// Shared log of which handlers ran, in order.
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    /// A middleware that records `tag` and continues the chain.
    pub fn pass(&self, tag: &'static str) -> Handler {
        let log = Arc::clone(&self.0);
        Handler::named(tag, move |res, req, next| {
            log.lock().unwrap().push(tag.to_string());
            next.run(res, req);
        })
    }

    /// A terminal handler that records `tag` and answers with it.
    pub fn answer(&self, tag: &'static str) -> Handler {
        let log = Arc::clone(&self.0);
        Handler::named(tag, move |res, _req, _next| {
            log.lock().unwrap().push(tag.to_string());
            res.send(tag);
        })
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

/// Serve the application on an ephemeral port.
pub async fn start_server(app: Application) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = app.serve(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
