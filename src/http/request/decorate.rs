//! Request decoration.
//!
//! # Responsibilities
//! - Derive the decorated fields from the raw request, in order: hostname,
//!   remote ip, xhr flag, subdomains, cookies, query, path params,
//!   freshness, forwarded ips
//! - Fail the request on a malformed `Host` header
//!
//! # Design Decisions
//! - Duplicate cookie names: the last one wins
//! - Duplicate query names: the first one wins
//! - Subdomains keep their original left-to-right order; IP literals have
//!   none
//! - Signed cookies move from `cookies` to `signed_cookies` once verified

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, Method};
use cookie::Cookie;

use crate::config::Settings;
use crate::error::DecorationError;
use crate::http::request::{freshness, CancelSignal, Request, RequestBody};
use crate::http::response::cookie::verify_signed_value;

/// Build the decorated request.
///
/// `response_headers` are whatever the response carries before any handler
/// runs; freshness is computed against them.
pub fn decorate(
    parts: Parts,
    body: RequestBody,
    params: Vec<(String, String)>,
    base_url: &str,
    settings: &Settings,
    response_headers: &HeaderMap,
) -> Result<Request, DecorationError> {
    let hostname = parse_hostname(&parts)?;
    let ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let xhr = header_str(&parts.headers, header::HeaderName::from_static("x-requested-with"))
        .map(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
        .unwrap_or(false);
    let subdomains = parse_subdomains(&hostname, settings.subdomain_offset);

    let mut cookies = parse_cookies(&parts.headers);
    let signed_cookies = match settings.cookie_secret.as_deref() {
        Some(secret) => extract_signed(&mut cookies, secret),
        None => HashMap::new(),
    };

    let query = parse_query(parts.uri.query());
    let params: HashMap<String, String> = params.into_iter().collect();

    let fresh = (parts.method == Method::GET || parts.method == Method::HEAD)
        && freshness::is_fresh(&parts.headers, response_headers);

    let ips = if settings.trust_proxy {
        header_str(&parts.headers, header::HeaderName::from_static("x-forwarded-for"))
            .map(parse_forwarded_for)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let protocol = parse_protocol(&parts, settings.trust_proxy);

    Ok(Request {
        method: parts.method,
        uri: parts.uri,
        version: parts.version,
        headers: parts.headers,
        base_url: base_url.to_string(),
        hostname,
        ip,
        ips,
        protocol,
        xhr,
        subdomains,
        cookies,
        signed_cookies,
        query,
        params,
        fresh,
        body,
        cancel: CancelSignal::never(),
    })
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Host without port. Falls back to the URI authority (HTTP/2), then "".
fn parse_hostname(parts: &Parts) -> Result<String, DecorationError> {
    let raw = match parts.headers.get(header::HOST) {
        Some(value) => value
            .to_str()
            .map_err(|_| DecorationError::MalformedHost(String::from_utf8_lossy(value.as_bytes()).into_owned()))?
            .trim()
            .to_string(),
        None => match parts.uri.authority() {
            Some(authority) => return Ok(authority.host().to_string()),
            None => return Ok(String::new()),
        },
    };

    if raw.is_empty() {
        return Ok(raw);
    }
    let authority =
        Authority::from_str(&raw).map_err(|_| DecorationError::MalformedHost(raw.clone()))?;
    if authority.as_str().contains('@') {
        return Err(DecorationError::MalformedHost(raw));
    }
    Ok(authority.host().to_string())
}

fn parse_subdomains(hostname: &str, offset: usize) -> Vec<String> {
    let bare = hostname.trim_start_matches('[').trim_end_matches(']');
    if hostname.is_empty() || bare.parse::<IpAddr>().is_ok() {
        return Vec::new();
    }

    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() <= offset {
        return Vec::new();
    }
    parts[..parts.len() - offset]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse_encoded(value).flatten() {
            cookies.insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }
    cookies
}

fn extract_signed(cookies: &mut HashMap<String, String>, secret: &str) -> HashMap<String, String> {
    let verified: Vec<(String, String)> = cookies
        .iter()
        .filter_map(|(name, value)| {
            verify_signed_value(value, secret).map(|unsigned| (name.clone(), unsigned))
        })
        .collect();

    for (name, _) in &verified {
        cookies.remove(name);
    }
    verified.into_iter().collect()
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
    }
    map
}

fn parse_forwarded_for(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_protocol(parts: &Parts, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = header_str(&parts.headers, header::HeaderName::from_static("x-forwarded-proto"))
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty());
        if let Some(proto) = forwarded {
            return proto;
        }
    }
    parts.uri.scheme_str().unwrap_or("http").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::cookie::sign_value;
    use crate::http::test_support::response;
    use axum::http::Request as HttpRequest;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn run(builder: axum::http::request::Builder, settings: &Settings) -> Result<Request, DecorationError> {
        decorate(
            parts(builder),
            RequestBody::empty(),
            Vec::new(),
            "/",
            settings,
            &HeaderMap::new(),
        )
    }

    #[test]
    fn test_hostname_strips_port() {
        let req = run(
            HttpRequest::get("/").header("host", "shop.example.com:8080"),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(req.hostname(), "shop.example.com");
    }

    #[test]
    fn test_malformed_host_fails() {
        let err = run(
            HttpRequest::get("/").header("host", "bad host"),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err, DecorationError::MalformedHost("bad host".into()));
    }

    #[test]
    fn test_missing_host_is_empty() {
        let req = run(HttpRequest::get("/"), &Settings::default()).unwrap();
        assert_eq!(req.hostname(), "");
        assert!(req.subdomains().is_empty());
    }

    #[test]
    fn test_remote_ip_from_connect_info() {
        let mut raw = parts(HttpRequest::get("/").header("host", "a.test"));
        raw.extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51234))));
        let req = decorate(
            raw,
            RequestBody::empty(),
            Vec::new(),
            "/",
            &Settings::default(),
            &HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(req.ip(), Some(IpAddr::from([10, 0, 0, 7])));
    }

    #[test]
    fn test_xhr_is_case_insensitive() {
        let req = run(
            HttpRequest::get("/").header("x-requested-with", "xmlhttprequest"),
            &Settings::default(),
        )
        .unwrap();
        assert!(req.xhr());
    }

    #[test]
    fn test_subdomains_respect_offset() {
        assert_eq!(parse_subdomains("tobi.ferrets.example.com", 2), vec!["tobi", "ferrets"]);
        assert_eq!(parse_subdomains("tobi.ferrets.example.com", 3), vec!["tobi"]);
        assert!(parse_subdomains("example.com", 2).is_empty());
        assert!(parse_subdomains("127.0.0.1", 2).is_empty());
        assert!(parse_subdomains("[::1]", 0).is_empty());
    }

    #[test]
    fn test_cookies_last_wins() {
        let req = run(
            HttpRequest::get("/")
                .header("cookie", "a=1; b=2")
                .header("cookie", "a=3"),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(req.cookie("a"), Some("3"));
        assert_eq!(req.cookie("b"), Some("2"));
    }

    #[test]
    fn test_signed_cookies_are_verified() {
        let mut settings = Settings::default();
        settings.cookie_secret = Some("s3cret".into());
        let signed = sign_value("alice", "s3cret").unwrap();
        let forged = sign_value("mallory", "other").unwrap();

        let req = run(
            HttpRequest::get("/").header("cookie", format!("user={}; forged={}; plain=x", signed, forged)),
            &settings,
        )
        .unwrap();

        assert_eq!(req.signed_cookies().get("user").map(String::as_str), Some("alice"));
        assert!(req.cookie("user").is_none());
        assert!(req.signed_cookies().get("forged").is_none());
        assert_eq!(req.cookie("plain"), Some("x"));
    }

    #[test]
    fn test_encoded_cookies_round_trip() {
        let mut settings = Settings::default();
        settings.cookie_secret = Some("s3cret".into());
        let value = "abc; Domain=evil.example";

        let (mut res, _probe) = response();
        res.cookie(Cookie::new("plain", value));
        res.signed_cookie(Cookie::new("session", value), "s3cret").unwrap();
        let header: Vec<String> = res
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        let req = run(HttpRequest::get("/").header("cookie", header.join("; ")), &settings).unwrap();
        assert_eq!(req.cookie("plain"), Some(value));
        assert_eq!(req.signed_cookies().get("session").map(String::as_str), Some(value));
    }

    #[test]
    fn test_query_first_value_wins() {
        let req = run(
            HttpRequest::get("/search?q=first&q=second&page=2&name=a%20b"),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(req.query()["q"], "first");
        assert_eq!(req.query()["page"], "2");
        assert_eq!(req.query()["name"], "a b");
    }

    #[test]
    fn test_params_are_mapped() {
        let req = decorate(
            parts(HttpRequest::get("/users/7")),
            RequestBody::empty(),
            vec![("id".into(), "7".into())],
            "/users",
            &Settings::default(),
            &HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.base_url(), "/users");
    }

    #[test]
    fn test_freshness_only_for_get_and_head() {
        let mut response_headers = HeaderMap::new();
        response_headers.insert(header::ETAG, "\"v1\"".parse().unwrap());

        let get = decorate(
            parts(HttpRequest::get("/").header("if-none-match", "\"v1\"")),
            RequestBody::empty(),
            Vec::new(),
            "/",
            &Settings::default(),
            &response_headers,
        )
        .unwrap();
        assert!(get.fresh());
        assert!(!get.stale());

        let post = decorate(
            parts(HttpRequest::post("/").header("if-none-match", "\"v1\"")),
            RequestBody::empty(),
            Vec::new(),
            "/",
            &Settings::default(),
            &response_headers,
        )
        .unwrap();
        assert!(!post.fresh());
    }

    #[test]
    fn test_forwarded_ips_need_trust_proxy() {
        let builder = || {
            HttpRequest::get("/")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1 ,")
                .header("x-forwarded-proto", "https")
        };

        let untrusted = run(builder(), &Settings::default()).unwrap();
        assert!(untrusted.ips().is_empty());
        assert_eq!(untrusted.protocol(), "http");

        let mut settings = Settings::default();
        settings.trust_proxy = true;
        let trusted = run(builder(), &settings).unwrap();
        assert_eq!(trusted.ips(), &["203.0.113.9".to_string(), "10.0.0.1".to_string()]);
        assert_eq!(trusted.protocol(), "https");
        assert!(trusted.secure());
    }
}
