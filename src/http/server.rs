//! axum integration.
//!
//! # Responsibilities
//! - Build the axum `Router` that hands every request to the dispatcher
//! - Wire up middleware (request ID, tracing, timeout, body limit,
//!   `X-Powered-By`)
//! - Answer unmatched requests from static mounts, then with 405 or 404
//! - Record request metrics
//!
//! # Design Decisions
//! - A single fallback handler; all routing is ours, none is axum's
//! - The request body is buffered before the chain runs, the chain itself
//!   runs on the blocking pool because handlers are synchronous
//! - Routed responses go through a `StreamingSink`: the server answers as
//!   soon as a handler flushes, otherwise when the chain returns
//! - Terminal 404/405 answers go through `Response` so they look exactly
//!   like the one an exhausted chain produces
//!
//! # Data Flow
//! ```text
//! axum fallback
//!     → Dispatcher::lookup(method, path)
//!         Found            → buffer body → decorate → RequestContext::run
//!                            (first flush or chain end, whichever is first)
//!         MethodNotAllowed → 405 + Allow
//!         NotFound         → static mount (ServeDir) or 404
//!     → metrics::record_request
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::Router;
use hyper::upgrade::OnUpgrade;
use tower::ServiceExt;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::fs::FileSystem;
use crate::http::context::RequestContext;
use crate::http::request::{decorate, CancelSignal, RequestBody};
use crate::http::request_id::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::http::response::{BufferedSink, RequestHead, Response, ResponseSink, StreamingSink};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{Dispatcher, Lookup, Matched};
use crate::view::Templates;

/// A path prefix served from a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMount {
    prefix: String,
    dir: PathBuf,
}

impl StaticMount {
    /// `prefix` must already be a clean absolute path.
    pub fn new(prefix: String, dir: impl Into<PathBuf>) -> Self {
        Self {
            prefix,
            dir: dir.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// The request path relative to the mount, if the mount covers it.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        match rest {
            "" => Some("/"),
            r if r.starts_with('/') => Some(r),
            _ => None,
        }
    }
}

/// Everything the fallback handler needs. Read-only once serving begins.
pub struct ServerState {
    pub dispatcher: Dispatcher,
    pub settings: Arc<Settings>,
    pub templates: Arc<Templates>,
    pub fs: Arc<dyn FileSystem>,
    pub statics: Vec<StaticMount>,
    pub body_limit: usize,
    pub request_timeout: Duration,
    pub shutdown: Shutdown,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("dispatcher", &self.dispatcher)
            .field("statics", &self.statics)
            .field("body_limit", &self.body_limit)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ServerState {
    fn static_mount(&self, path: &str) -> Option<(&StaticMount, String)> {
        self.statics
            .iter()
            .find_map(|mount| mount.strip(path).map(|rest| (mount, rest.to_string())))
    }

    fn response(&self, head: RequestHead, sink: Box<dyn ResponseSink>) -> Response {
        Response::new(sink, head)
            .with_templates(Arc::clone(&self.templates))
            .with_file_system(Arc::clone(&self.fs))
    }
}

/// Build the axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: Arc<ServerState>) -> Router {
    let powered_by = state.settings.x_powered_by;
    let timeout = state.request_timeout;
    let body_limit = state.body_limit;

    let mut router = Router::new().fallback(dispatch).with_state(state);
    if powered_by {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-powered-by"),
            HeaderValue::from_static("trellis"),
        ));
    }
    router
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

async fn dispatch(
    State(state): State<Arc<ServerState>>,
    request: axum::http::Request<Body>,
) -> axum::http::Response<Body> {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let lookup = match state.dispatcher.lookup(&method, &path) {
        Ok(lookup) => lookup,
        Err(error) => {
            tracing::error!(error = %error, "Route table unavailable");
            let response = plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            metrics::record_request(method.as_str(), 500, metrics::UNMATCHED, start);
            return response;
        }
    };

    let (response, route) = match lookup {
        Lookup::Found(matched) => {
            let route = matched.route.path.clone();
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route = %route,
                "Dispatching request"
            );
            (run_route(&state, request, matched).await, route)
        }
        Lookup::MethodNotAllowed(allowed) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            (terminal(&state, request, StatusCode::METHOD_NOT_ALLOWED, &allowed), metrics::UNMATCHED.to_string())
        }
        Lookup::NotFound => match state.static_mount(&path) {
            Some((mount, rest)) if method == Method::GET || method == Method::HEAD => {
                (serve_static(mount, &rest, request).await, metrics::STATIC.to_string())
            }
            _ => {
                tracing::debug!(request_id = %request_id, method = %method, path = %path, "No route matched");
                (terminal(&state, request, StatusCode::NOT_FOUND, &[]), metrics::UNMATCHED.to_string())
            }
        },
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), &route, start);
    response
}

async fn run_route(
    state: &Arc<ServerState>,
    request: axum::http::Request<Body>,
    matched: Matched,
) -> axum::http::Response<Body> {
    let (mut parts, body) = request.into_parts();
    let upgrade = parts.extensions.remove::<OnUpgrade>();
    let head = RequestHead {
        method: parts.method.clone(),
        headers: parts.headers.clone(),
    };
    let (sink, mut streamed) = StreamingSink::new();
    let mut response = state.response(head, Box::new(sink.with_upgrade(upgrade)));

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let data = axum::body::to_bytes(body, state.body_limit)
        .await
        .map_err(|e| e.to_string());

    let mut request = match decorate(
        parts,
        RequestBody::new(content_type, data),
        matched.params.clone(),
        &matched.route.base,
        &state.settings,
        response.headers(),
    ) {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(error = %error, "Request decoration failed");
            response.send_error(error.status(), &error.to_string());
            return response.finish();
        }
    };
    request.set_cancel_signal(CancelSignal::with_timeout(
        Some(state.shutdown.subscribe()),
        state.request_timeout,
    ));

    let context = RequestContext::new(matched.route.chain(&matched.params), request, response);
    let mut chain = tokio::task::spawn_blocking(move || context.run().finish());

    // A flush hands the head over before the chain returns; the sender is
    // dropped unresolved when the chain ends without one.
    tokio::select! {
        biased;
        Ok(response) = &mut streamed => {
            tracing::debug!(route = %matched.route.path, "Streaming response");
            response
        }
        joined = &mut chain => match joined {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(error = %error, route = %matched.route.path, "Handler chain panicked");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        },
    }
}

/// 404 or 405, written through the response builder.
fn terminal(
    state: &ServerState,
    request: axum::http::Request<Body>,
    status: StatusCode,
    allowed: &[Method],
) -> axum::http::Response<Body> {
    let head = RequestHead {
        method: request.method().clone(),
        headers: request.headers().clone(),
    };
    let mut response = state.response(head, Box::new(BufferedSink::new()));
    if !allowed.is_empty() {
        let allow: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        response.set(header::ALLOW.as_str(), &allow.join(", "));
    }
    response.send_status(status);
    response.finish()
}

async fn serve_static(
    mount: &StaticMount,
    rest: &str,
    request: axum::http::Request<Body>,
) -> axum::http::Response<Body> {
    let (mut parts, body) = request.into_parts();
    let rewritten = match parts.uri.query() {
        Some(query) => format!("{}?{}", rest, query),
        None => rest.to_string(),
    };
    match rewritten.parse::<Uri>() {
        Ok(uri) => parts.uri = uri,
        Err(error) => {
            tracing::warn!(error = %error, path = %rest, "Static path rejected");
            return plain(StatusCode::BAD_REQUEST, "Bad Request");
        }
    }

    let request = axum::http::Request::from_parts(parts, body);
    let response = ServeDir::new(mount.dir())
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    tracing::debug!(prefix = %mount.prefix(), path = %rest, status = response.status().as_u16(), "Static file served");
    response.map(Body::new)
}

fn plain(status: StatusCode, body: &'static str) -> axum::http::Response<Body> {
    let mut response = axum::http::Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
