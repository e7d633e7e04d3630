//! Route path normalisation.
//!
//! # Responsibilities
//! - Reject malformed paths at registration time
//! - Clean paths (leading slash, no trailing slash, `.`/`..` resolved)
//! - Join a node base with a relative path
//! - Translate Express-style `:param` / `*rest` segments to matcher syntax

use crate::error::SetupError;

/// Check that a user-supplied path can be registered.
pub fn validate(path: &str) -> Result<(), SetupError> {
    if path.is_empty() {
        return Err(SetupError::EmptyPath);
    }

    let malformed = |reason: &str| SetupError::MalformedPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if let Some(c) = path.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(malformed(&format!("contains invalid character {:?}", c)));
    }
    if path.contains('?') || path.contains('#') {
        return Err(malformed("query strings and fragments are not part of a route"));
    }
    for segment in path.split('/') {
        if segment == ":" {
            return Err(malformed("parameter segment has no name"));
        }
    }
    Ok(())
}

/// Clean a path: enforce a leading slash, collapse repeated slashes,
/// resolve `.` and `..`, strip trailing slashes.
pub fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Join an already clean base with a relative path.
pub fn join(base: &str, relative: &str) -> String {
    let relative = clean(relative);
    if relative == "/" {
        base.to_string()
    } else if base == "/" {
        relative
    } else {
        format!("{}{}", base, relative)
    }
}

/// Translate an Express-style pattern to the matcher's syntax.
///
/// `/users/:id` becomes `/users/{id}` and `/files/*rest` becomes
/// `/files/{*rest}`. Literal braces are escaped.
pub fn to_pattern(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 8);
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        if let Some(name) = segment.strip_prefix(':') {
            out.push('{');
            out.push_str(name);
            out.push('}');
        } else if let Some(name) = segment.strip_prefix('*') {
            out.push_str("{*");
            out.push_str(if name.is_empty() { "path" } else { name });
            out.push('}');
        } else {
            out.push_str(&segment.replace('{', "{{").replace('}', "}}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), "/");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("api"), "/api");
        assert_eq!(clean("/api/"), "/api");
        assert_eq!(clean("//api///v1//"), "/api/v1");
        assert_eq!(clean("/api/./v1/../v2"), "/api/v2");
        assert_eq!(clean("/../.."), "/");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "/users"), "/users");
        assert_eq!(join("/api", "users/"), "/api/users");
        assert_eq!(join("/api", "/"), "/api");
        assert_eq!(join("/", "/"), "/");
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(""), Err(SetupError::EmptyPath));
        assert!(validate("/users/:id").is_ok());
        assert!(validate("/bad path").is_err());
        assert!(validate("/search?q=1").is_err());
        assert!(validate("/users/:").is_err());
    }

    #[test]
    fn test_to_pattern() {
        assert_eq!(to_pattern("/users/:id"), "/users/{id}");
        assert_eq!(to_pattern("/users/:id/posts/:post"), "/users/{id}/posts/{post}");
        assert_eq!(to_pattern("/files/*rest"), "/files/{*rest}");
        assert_eq!(to_pattern("/files/*"), "/files/{*path}");
        assert_eq!(to_pattern("/"), "/");
        assert_eq!(to_pattern("/raw/{x}"), "/raw/{{x}}");
    }
}
