//! Conditional request freshness.
//!
//! A request is fresh when its validators (`If-None-Match`,
//! `If-Modified-Since`) still match the response's validators (`ETag`,
//! `Last-Modified`). During decoration the response carries no validators
//! yet, so the decorated value is best-effort; handlers that set validators
//! can call `is_fresh` again.

use axum::http::{header, HeaderMap};

/// Compare request validators with response validators.
pub fn is_fresh(request: &HeaderMap, response: &HeaderMap) -> bool {
    let modified_since = header_str(request, header::IF_MODIFIED_SINCE);
    let none_match = header_str(request, header::IF_NONE_MATCH);

    if modified_since.is_none() && none_match.is_none() {
        return false;
    }

    if let Some(cache_control) = header_str(request, header::CACHE_CONTROL) {
        if cache_control
            .split(',')
            .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
        {
            return false;
        }
    }

    if let Some(none_match) = none_match.filter(|v| v.trim() != "*") {
        let Some(etag) = header_str(response, header::ETAG) else {
            return false;
        };
        let etag = weak_stripped(etag);
        if !none_match
            .split(',')
            .any(|candidate| weak_stripped(candidate) == etag)
        {
            return false;
        }
    }

    if let Some(modified_since) = modified_since {
        let Some(last_modified) = header_str(response, header::LAST_MODIFIED) else {
            return false;
        };
        match (
            httpdate::parse_http_date(last_modified),
            httpdate::parse_http_date(modified_since),
        ) {
            (Ok(last), Ok(since)) if last <= since => {}
            _ => return false,
        }
    }

    true
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn weak_stripped(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix("W/").unwrap_or(tag)
}
