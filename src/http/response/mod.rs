//! Response builder.
//!
//! # Responsibilities
//! - Wrap a `ResponseSink` with Express-style helpers (headers, cookies,
//!   status, bodies, redirects, file transfer, rendering)
//! - Enforce write-once: the first body write (or explicit commit) fixes
//!   the status and headers; later `status` calls and header edits are
//!   ignored and the sink sees a single `write_header`
//!
//! # Design Decisions
//! - `set` logs and skips invalid input so handlers can chain calls;
//!   `try_set` reports the error instead
//! - Serialization and template failures become 500 responses carrying the
//!   error text

pub mod cookie;
pub mod file;
pub mod sink;
pub mod vary;

use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use hyper::upgrade::OnUpgrade;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::{Capability, ResponseError};
use crate::fs::{FileSystem, OsFileSystem};
use crate::view::Templates;

pub use file::{Dotfiles, FileOptions};
pub use sink::{BufferedSink, ResponseSink, StreamedResponse, StreamingSink};

/// RFC 5987 `attr-char`: everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// The parts of the inbound request some response helpers consult
/// (`Referer` for `location("back")`, conditional and range headers for
/// file transfers).
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub method: Method,
    pub headers: HeaderMap,
}

/// Body accepted by `Response::send`.
#[derive(Debug, Clone)]
pub enum SendBody {
    /// Sent as `text/plain` unless a Content-Type is already set.
    Text(String),
    /// Sent as-is.
    Bytes(Bytes),
    /// Encoded with `json`.
    Json(serde_json::Value),
}

impl From<&str> for SendBody {
    fn from(v: &str) -> Self {
        SendBody::Text(v.to_string())
    }
}

impl From<String> for SendBody {
    fn from(v: String) -> Self {
        SendBody::Text(v)
    }
}

impl From<Vec<u8>> for SendBody {
    fn from(v: Vec<u8>) -> Self {
        SendBody::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for SendBody {
    fn from(v: &[u8]) -> Self {
        SendBody::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<Bytes> for SendBody {
    fn from(v: Bytes) -> Self {
        SendBody::Bytes(v)
    }
}

impl From<serde_json::Value> for SendBody {
    fn from(v: serde_json::Value) -> Self {
        SendBody::Json(v)
    }
}

/// The response handed to handlers.
pub struct Response {
    sink: Box<dyn ResponseSink>,
    pending: StatusCode,
    committed: Option<StatusCode>,
    request: RequestHead,
    templates: Arc<Templates>,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("pending", &self.pending)
            .field("committed", &self.committed)
            .field("headers", self.sink.headers())
            .finish()
    }
}

impl Response {
    pub fn new(sink: Box<dyn ResponseSink>, request: RequestHead) -> Self {
        Self {
            sink,
            pending: StatusCode::OK,
            committed: None,
            request,
            templates: Arc::new(Templates::empty()),
            fs: Arc::new(OsFileSystem),
        }
    }

    pub fn with_templates(mut self, templates: Arc<Templates>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    // ---- status -------------------------------------------------------

    /// Set the pending status. No-op once the response is committed.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        match self.committed {
            Some(committed) => {
                tracing::debug!(
                    committed = committed.as_u16(),
                    ignored = status.as_u16(),
                    "Status ignored, response already committed"
                );
            }
            None => self.pending = status,
        }
        self
    }

    /// Committed status, or the pending one.
    pub fn status_code(&self) -> StatusCode {
        self.committed.unwrap_or(self.pending)
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Send the status with its reason phrase as a plain-text body.
    pub fn send_status(&mut self, status: StatusCode) -> &mut Self {
        self.set(header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8");
        self.status(status);
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());
        self.write_logged(reason.as_bytes());
        self
    }

    /// Write a plain-text error response. Ignored once committed.
    pub fn send_error(&mut self, status: StatusCode, message: &str) -> &mut Self {
        if self.is_committed() {
            tracing::warn!(
                status = status.as_u16(),
                error = %message,
                "Cannot send error, response already committed"
            );
            return self;
        }
        let headers = self.sink.headers_mut();
        headers.remove(header::CONTENT_LENGTH);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        self.status(status);
        self.write_logged(message.as_bytes());
        self
    }

    /// Commit the status line and headers without writing a body.
    pub fn commit(&mut self) {
        if self.committed.is_none() {
            self.sink.write_header(self.pending);
            self.committed = Some(self.pending);
        }
    }

    // ---- headers ------------------------------------------------------

    pub fn headers(&self) -> &HeaderMap {
        self.sink.headers()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sink.headers().get(key).and_then(|v| v.to_str().ok())
    }

    /// Set a header, appending `; charset=utf-8` to textual Content-Types
    /// that lack a charset.
    pub fn try_set(&mut self, key: &str, value: &str) -> Result<&mut Self, ResponseError> {
        let (name, value) = header_pair(key, value)?;
        self.writable_headers()?.insert(name, value);
        Ok(self)
    }

    /// `try_set` that logs and skips invalid input.
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        if let Err(error) = self.try_set(key, value) {
            tracing::warn!(header = %key, error = %error, "Header not set");
        }
        self
    }

    /// Add a header value without replacing existing ones.
    pub fn append(&mut self, key: &str, value: &str) -> &mut Self {
        let result = header_pair(key, value)
            .and_then(|(name, value)| self.writable_headers().map(|h| h.append(name, value)));
        if let Err(error) = result {
            tracing::warn!(header = %key, error = %error, "Header not appended");
        }
        self
    }

    /// Content-Type from a file name's extension.
    pub fn content_type(&mut self, filename: &str) -> &mut Self {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        self.set(header::CONTENT_TYPE.as_str(), mime.essence_str())
    }

    /// Mark the response as a download.
    pub fn attachment(&mut self, filename: Option<&str>) -> &mut Self {
        match filename.and_then(|f| std::path::Path::new(f).file_name()?.to_str()) {
            Some(name) => {
                let disposition = content_disposition(name);
                self.content_type(name);
                self.set(header::CONTENT_DISPOSITION.as_str(), &disposition)
            }
            None => self.set(header::CONTENT_DISPOSITION.as_str(), "attachment"),
        }
    }

    /// Merge `field` (one name or a comma-separated list) into `Vary`.
    pub fn vary(&mut self, field: &str) -> Result<&mut Self, ResponseError> {
        let fields = vary::parse_fields(field)?;
        let existing = self
            .sink
            .headers()
            .get_all(header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        let merged = vary::merge(&existing, &fields);
        let value = HeaderValue::from_str(&merged)
            .map_err(|_| ResponseError::InvalidHeaderValue(header::VARY.to_string()))?;
        self.writable_headers()?.insert(header::VARY, value);
        Ok(self)
    }

    /// Set `Location`. `"back"` means the request's `Referer`, falling back
    /// to `/`.
    pub fn location(&mut self, path: &str) -> &mut Self {
        let target = if path == "back" {
            self.request
                .headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        } else {
            path.to_string()
        };
        let target = if target.is_empty() { "/".to_string() } else { target };
        self.set(header::LOCATION.as_str(), &target)
    }

    /// Redirect with `302 Found`.
    pub fn redirect(&mut self, path: &str) -> &mut Self {
        self.redirect_with(path, StatusCode::FOUND)
    }

    pub fn redirect_with(&mut self, path: &str, status: StatusCode) -> &mut Self {
        self.location(path);
        self.status(status)
    }

    // ---- cookies ------------------------------------------------------

    /// Append a `Set-Cookie` header. Name and value are percent-encoded so
    /// a value can never smuggle in attributes.
    pub fn cookie(&mut self, cookie: ::cookie::Cookie<'_>) -> &mut Self {
        self.append(header::SET_COOKIE.as_str(), &cookie.encoded().to_string())
    }

    /// Set a cookie whose value is signed with `secret`.
    pub fn signed_cookie(
        &mut self,
        cookie: ::cookie::Cookie<'_>,
        secret: &str,
    ) -> Result<&mut Self, ResponseError> {
        let mut cookie = cookie.into_owned();
        let signed = cookie::sign_value(cookie.value(), secret)?;
        cookie.set_value(signed);
        Ok(self.cookie(cookie))
    }

    /// Expire a cookie immediately.
    pub fn clear_cookie(&mut self, name: &str) -> &mut Self {
        let mut cookie = ::cookie::Cookie::new(name.to_string(), "");
        cookie.make_removal();
        self.cookie(cookie)
    }

    // ---- bodies -------------------------------------------------------

    /// Write body bytes, committing the response first.
    pub fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.commit();
        self.sink.write(chunk)
    }

    pub fn send(&mut self, body: impl Into<SendBody>) -> &mut Self {
        match body.into() {
            SendBody::Text(text) => {
                if self.get(header::CONTENT_TYPE.as_str()).is_none() {
                    self.set(header::CONTENT_TYPE.as_str(), "text/plain");
                }
                self.write_logged(text.as_bytes());
            }
            SendBody::Bytes(bytes) => self.write_logged(&bytes),
            SendBody::Json(value) => {
                self.json(&value);
            }
        }
        self
    }

    /// Send `value` as JSON. Serialization failures answer 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set(header::CONTENT_TYPE.as_str(), "application/json");
                self.write_logged(&body);
            }
            Err(error) => {
                tracing::error!(error = %error, "JSON serialization failed");
                self.send_error(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string());
            }
        }
        self
    }

    /// Render template `name` as `text/html`. Failures answer 500.
    pub fn render<T: Serialize>(&mut self, name: &str, data: &T) -> &mut Self {
        let templates = Arc::clone(&self.templates);
        match templates.render(name, data) {
            Ok(html) => {
                self.set(header::CONTENT_TYPE.as_str(), "text/html");
                self.write_logged(html.as_bytes());
            }
            Err(error) => {
                tracing::error!(template = %name, error = %error, "Render failed");
                self.send_error(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string());
            }
        }
        self
    }

    // ---- capabilities -------------------------------------------------

    pub fn supports(&self, capability: Capability) -> bool {
        self.sink.supports(capability)
    }

    /// Commit and push buffered output to the client.
    pub fn flush(&mut self) -> Result<(), ResponseError> {
        if !self.sink.supports(Capability::Flush) {
            return Err(ResponseError::Unsupported(Capability::Flush));
        }
        self.commit();
        self.sink.flush()
    }

    /// Take the connection's upgrade handle. The handler is responsible for
    /// answering with a `101 Switching Protocols` status.
    pub fn hijack(&mut self) -> Result<OnUpgrade, ResponseError> {
        self.sink.hijack()
    }

    /// Finish the response, committing it if no handler did.
    pub fn finish(mut self) -> axum::http::Response<Body> {
        self.commit();
        self.sink.finish()
    }

    // ---- internals ----------------------------------------------------

    fn writable_headers(&mut self) -> Result<&mut HeaderMap, ResponseError> {
        if self.is_committed() {
            return Err(ResponseError::AlreadyCommitted);
        }
        Ok(self.sink.headers_mut())
    }

    fn write_logged(&mut self, chunk: &[u8]) {
        if let Err(error) = self.write(chunk) {
            tracing::warn!(error = %error, "Response write failed");
        }
    }

    pub(crate) fn request_head(&self) -> &RequestHead {
        &self.request
    }

    pub(crate) fn file_system(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }
}

fn header_pair(key: &str, value: &str) -> Result<(HeaderName, HeaderValue), ResponseError> {
    let name = HeaderName::from_bytes(key.trim().as_bytes())
        .map_err(|_| ResponseError::InvalidHeaderName(key.to_string()))?;
    let value = if name == header::CONTENT_TYPE {
        with_charset(value)
    } else {
        value.to_string()
    };
    let value = HeaderValue::from_str(&value)
        .map_err(|_| ResponseError::InvalidHeaderValue(name.to_string()))?;
    Ok((name, value))
}

fn with_charset(content_type: &str) -> String {
    let lower = content_type.to_ascii_lowercase();
    let textual = lower.starts_with("text/") || lower.contains("application/json");
    if textual && !lower.contains("charset") {
        format!("{}; charset=utf-8", content_type)
    } else {
        content_type.to_string()
    }
}

/// `attachment; filename*=UTF-8''<percent-encoded name>`.
pub(crate) fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::response;
    use std::collections::HashMap;

    #[test]
    fn test_set_appends_charset() {
        let (mut res, _probe) = response();
        res.set("content-type", "text/html");
        assert_eq!(res.get("Content-Type"), Some("text/html; charset=utf-8"));

        res.set("content-type", "application/json");
        assert_eq!(res.get("content-type"), Some("application/json; charset=utf-8"));

        res.set("content-type", "text/plain; charset=latin1");
        assert_eq!(res.get("content-type"), Some("text/plain; charset=latin1"));

        res.set("content-type", "image/png");
        assert_eq!(res.get("content-type"), Some("image/png"));
    }

    #[test]
    fn test_try_set_rejects_invalid() {
        let (mut res, _probe) = response();
        assert_eq!(
            res.try_set("bad header", "x").unwrap_err(),
            ResponseError::InvalidHeaderName("bad header".into())
        );
        assert!(matches!(
            res.try_set("x-ok", "line\nbreak"),
            Err(ResponseError::InvalidHeaderValue(_))
        ));
        res.set("bad header", "ignored");
        assert!(res.get("bad header").is_none());
    }

    #[test]
    fn test_append_keeps_existing() {
        let (mut res, _probe) = response();
        res.set("x-trace", "a").append("x-trace", "b");
        let values: Vec<_> = res.headers().get_all("x-trace").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_send_text_sets_plain_content_type() {
        let (mut res, probe) = response();
        res.send("hello");
        assert_eq!(res.get("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(probe.body(), b"hello");
        assert_eq!(probe.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_send_text_keeps_existing_content_type() {
        let (mut res, probe) = response();
        res.set("content-type", "text/html").send("<p>hi</p>");
        assert_eq!(res.get("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(probe.body(), b"<p>hi</p>");
    }

    #[test]
    fn test_send_bytes_has_no_content_type() {
        let (mut res, probe) = response();
        res.send(vec![0u8, 1, 2]);
        assert!(res.get("content-type").is_none());
        assert_eq!(probe.body(), vec![0u8, 1, 2]);
    }

    #[test]
    fn test_send_value_is_json() {
        let (mut res, probe) = response();
        res.send(serde_json::json!({"ok": true}));
        assert_eq!(res.get("content-type"), Some("application/json; charset=utf-8"));
        assert_eq!(probe.body(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_json_failure_is_500() {
        let (mut res, probe) = response();
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");

        res.json(&bad);

        assert_eq!(probe.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(String::from_utf8(probe.body()).unwrap().contains("key must be a string"));
    }

    #[test]
    fn test_status_is_write_once() {
        let (mut res, probe) = response();
        res.status(StatusCode::CREATED).send("made");
        res.status(StatusCode::ACCEPTED);
        res.status(StatusCode::ACCEPTED);

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(probe.header_writes(), 1);
        assert_eq!(probe.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_status_before_commit_is_replaced() {
        let (mut res, probe) = response();
        res.status(StatusCode::ACCEPTED).status(StatusCode::CREATED);
        assert_eq!(probe.header_writes(), 0);
        res.finish();
        assert_eq!(probe.status(), Some(StatusCode::CREATED));
        assert_eq!(probe.header_writes(), 1);
    }

    #[test]
    fn test_headers_frozen_after_commit() {
        let (mut res, _probe) = response();
        res.send("body");
        assert_eq!(
            res.try_set("x-late", "1").unwrap_err(),
            ResponseError::AlreadyCommitted
        );
        assert!(res.get("x-late").is_none());
    }

    #[test]
    fn test_send_status_writes_reason() {
        let (mut res, probe) = response();
        res.send_status(StatusCode::NOT_FOUND);
        assert_eq!(probe.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(probe.body(), b"Not Found");
        assert_eq!(res.get("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_cookies() {
        let (mut res, _probe) = response();
        res.cookie(::cookie::Cookie::build(("theme", "dark")).path("/").build());
        res.clear_cookie("session");

        let cookies: Vec<_> = res
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies[0], "theme=dark; Path=/");
        assert!(cookies[1].starts_with("session=;"));
        assert!(cookies[1].contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_cannot_add_attributes() {
        let (mut res, _probe) = response();
        let value = "abc; Domain=evil.example; Max-Age=999999";
        res.cookie(::cookie::Cookie::new("session", value));

        let raw = res.get("set-cookie").unwrap().to_string();
        assert!(!raw.contains(';'));

        let parsed = ::cookie::Cookie::parse_encoded(raw).unwrap();
        assert_eq!(parsed.name(), "session");
        assert_eq!(parsed.value(), value);
        assert_eq!(parsed.domain(), None);
        assert_eq!(parsed.max_age(), None);
    }

    #[test]
    fn test_signed_cookie_verifies() {
        let (mut res, _probe) = response();
        res.signed_cookie(::cookie::Cookie::new("user", "alice"), "s3cret").unwrap();

        let raw = res.get("set-cookie").unwrap().to_string();
        let parsed = ::cookie::Cookie::parse_encoded(raw).unwrap();
        assert_eq!(
            cookie::verify_signed_value(parsed.value(), "s3cret").as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn test_signed_cookie_empty_value() {
        let (mut res, _probe) = response();
        res.signed_cookie(::cookie::Cookie::new("flag", ""), "k").unwrap();
        let raw = res.get("set-cookie").unwrap().to_string();
        let parsed = ::cookie::Cookie::parse_encoded(raw).unwrap();
        assert_eq!(cookie::verify_signed_value(parsed.value(), "k").as_deref(), Some(""));
    }

    #[test]
    fn test_attachment() {
        let (mut res, _probe) = response();
        res.attachment(Some("reports/q1 résumé.pdf"));
        assert_eq!(
            res.get("content-disposition"),
            Some("attachment; filename*=UTF-8''q1%20r%C3%A9sum%C3%A9.pdf")
        );
        assert_eq!(res.get("content-type"), Some("application/pdf"));

        let (mut bare, _probe) = response();
        bare.attachment(None);
        assert_eq!(bare.get("content-disposition"), Some("attachment"));
        assert!(bare.get("content-type").is_none());
    }

    #[test]
    fn test_content_type_from_filename() {
        let (mut res, _probe) = response();
        res.content_type("index.html");
        assert_eq!(res.get("content-type"), Some("text/html; charset=utf-8"));
        res.content_type("blob.unknownext");
        assert_eq!(res.get("content-type"), Some("application/octet-stream"));
    }

    #[test]
    fn test_vary() {
        let (mut res, _probe) = response();
        res.vary("Origin").unwrap();
        assert_eq!(res.get("vary"), Some("Origin"));
        res.vary("Accept").unwrap().vary("origin").unwrap();
        assert_eq!(res.get("vary"), Some("Origin, Accept"));
        res.vary("*").unwrap();
        assert_eq!(res.get("vary"), Some("*"));
        assert!(matches!(res.vary("bad field"), Err(ResponseError::InvalidVaryField(_))));
    }

    #[test]
    fn test_location_back_uses_referer() {
        let mut head = RequestHead::default();
        head.headers
            .insert(header::REFERER, HeaderValue::from_static("/previous"));
        let (mut res, _probe) = crate::http::test_support::response_for(head);
        res.location("back");
        assert_eq!(res.get("location"), Some("/previous"));

        let (mut res, _probe) = response();
        res.location("back");
        assert_eq!(res.get("location"), Some("/"));
    }

    #[test]
    fn test_redirect_defaults_to_found() {
        let (mut res, probe) = response();
        res.redirect("/login");
        res.finish();
        assert_eq!(probe.status(), Some(StatusCode::FOUND));

        let (mut res, probe) = response();
        res.redirect_with("/moved", StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.get("location"), Some("/moved"));
        res.finish();
        assert_eq!(probe.status(), Some(StatusCode::MOVED_PERMANENTLY));
    }

    #[test]
    fn test_render() {
        let fs = crate::fs::MemoryFileSystem::new().with_file("v/hello.html", "Hello {{ name }}");
        let templates = Templates::load(
            &fs,
            std::path::Path::new("v"),
            &crate::config::TemplatesConfig::default(),
        )
        .unwrap();
        let (res, probe) = response();
        let mut res = res.with_templates(Arc::new(templates));

        res.render("hello", &serde_json::json!({"name": "Ada"}));
        assert_eq!(probe.body(), b"Hello Ada");
        assert_eq!(res.get("content-type"), Some("text/html; charset=utf-8"));
    }

    #[test]
    fn test_render_missing_template_is_500() {
        let (mut res, probe) = response();
        res.render("ghost", &serde_json::json!({}));
        assert_eq!(probe.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(probe.body(), b"template ghost not found");
    }

    #[test]
    fn test_capabilities_pass_through() {
        let (mut res, _probe) = response();
        assert!(!res.supports(Capability::Flush));
        assert_eq!(
            res.flush(),
            Err(ResponseError::Unsupported(Capability::Flush))
        );
        assert!(!res.is_committed());
        assert!(matches!(
            res.hijack(),
            Err(ResponseError::Unsupported(Capability::Hijack))
        ));
    }
}
