//! The decorated request handed to handlers.
//!
//! # Data Flow
//! ```text
//! axum Request<Body>
//!     → server.rs buffers the body (limit from config)
//!     → decorate.rs derives host, ip, xhr, subdomains, cookies, query,
//!       params, freshness, forwarded ips
//!     → Request (read-mostly; body readers and the cancel signal are the
//!       only mutable parts)
//! ```

pub mod accepts;
pub mod body;
pub mod cancel;
pub mod decorate;
pub mod freshness;
pub mod range;

use std::collections::HashMap;
use std::net::IpAddr;

use axum::http::{header, HeaderMap, Method, Uri, Version};
use serde::de::DeserializeOwned;

use crate::error::{BodyError, RangeError};

pub use body::RequestBody;
pub use cancel::CancelSignal;
pub use decorate::decorate;
pub use range::ByteRange;

/// A decorated inbound request.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) version: Version,
    pub(crate) headers: HeaderMap,
    pub(crate) base_url: String,
    pub(crate) hostname: String,
    pub(crate) ip: Option<IpAddr>,
    pub(crate) ips: Vec<String>,
    pub(crate) protocol: String,
    pub(crate) xhr: bool,
    pub(crate) subdomains: Vec<String>,
    pub(crate) cookies: HashMap<String, String>,
    pub(crate) signed_cookies: HashMap<String, String>,
    pub(crate) query: HashMap<String, String>,
    pub(crate) params: HashMap<String, String>,
    pub(crate) fresh: bool,
    pub(crate) body: RequestBody,
    pub(crate) cancel: CancelSignal,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Path and query as sent by the client.
    pub fn original_url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Mount path of the router that matched the request.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// `X-Forwarded-For` addresses; empty unless `trust proxy` is enabled.
    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    /// `"http"` or `"https"`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn secure(&self) -> bool {
        self.protocol == "https"
    }

    pub fn xhr(&self) -> bool {
        self.xhr
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Cookies whose signature verified against `cookie secret`, unsigned.
    pub fn signed_cookies(&self) -> &HashMap<String, String> {
        &self.signed_cookies
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Path parameter `name`, or `default` when absent.
    pub fn get<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.param(name).unwrap_or(default)
    }

    /// Best-effort freshness computed at decoration time.
    pub fn fresh(&self) -> bool {
        self.fresh
    }

    pub fn stale(&self) -> bool {
        !self.fresh
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(crate::http::request_id::X_REQUEST_ID)
    }

    /// Whether the request `Content-Type` matches `mime`.
    ///
    /// Accepts the short names `json`, `html`, `xml` and `text`, full media
    /// types and `type/*` wildcards.
    pub fn is(&self, mime: &str) -> bool {
        let Some(content_type) = self.header(header::CONTENT_TYPE.as_str()) else {
            return false;
        };
        let actual = body::essence(content_type);
        let expected = match mime {
            "json" => "application/json".to_string(),
            "html" => "text/html".to_string(),
            "xml" => "application/xml".to_string(),
            "text" => "text/plain".to_string(),
            other => other.to_ascii_lowercase(),
        };

        match expected.split_once('/') {
            Some((kind, "*")) => actual.split('/').next() == Some(kind),
            _ => actual == expected,
        }
    }

    /// Best candidate according to `Accept`, in the caller's form.
    pub fn accepts<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        accepts::negotiate_media(self.header(header::ACCEPT.as_str()), candidates)
    }

    pub fn accepts_charsets<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        accepts::negotiate_token(self.header(header::ACCEPT_CHARSET.as_str()), candidates)
    }

    pub fn accepts_encodings<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        accepts::negotiate_token(self.header(header::ACCEPT_ENCODING.as_str()), candidates)
    }

    pub fn accepts_languages<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        accepts::negotiate_language(self.header(header::ACCEPT_LANGUAGE.as_str()), candidates)
    }

    /// Parse the `Range` header for a representation of `size` bytes.
    /// `Ok(None)` when the request has no `Range` header.
    pub fn range(&self, size: u64) -> Result<Option<Vec<ByteRange>>, RangeError> {
        match self.header(header::RANGE.as_str()) {
            None => Ok(None),
            Some(value) => range::parse_range(value, size).map(Some),
        }
    }

    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        self.body.json()
    }

    pub fn text(&mut self) -> Result<String, BodyError> {
        self.body.text()
    }

    pub fn form_data(&mut self) -> Result<HashMap<String, Vec<String>>, BodyError> {
        self.body.form_data()
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    /// Replace the cancellation signal, e.g. to impose a tighter deadline.
    pub fn set_cancel_signal(&mut self, signal: CancelSignal) {
        self.cancel = signal;
    }
}
