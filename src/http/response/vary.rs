//! `Vary` header merging.

use crate::error::ResponseError;

/// RFC 7231 `tchar`.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Validate a comma-separated list of field names.
pub fn parse_fields(raw: &str) -> Result<Vec<String>, ResponseError> {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();

    if fields.is_empty() {
        return Err(ResponseError::InvalidVaryField(raw.to_string()));
    }
    for field in &fields {
        if !field.chars().all(is_tchar) {
            return Err(ResponseError::InvalidVaryField(field.clone()));
        }
    }
    Ok(fields)
}

/// Merge `fields` into an existing `Vary` value.
///
/// `*` on either side collapses the result to `*`. Fields already present
/// (case-insensitively) are not repeated.
pub fn merge(existing: &str, fields: &[String]) -> String {
    let mut current: Vec<String> = existing
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();

    if current.iter().any(|f| f == "*") || fields.iter().any(|f| f == "*") {
        return "*".to_string();
    }

    for field in fields {
        if !current.iter().any(|f| f.eq_ignore_ascii_case(field)) {
            current.push(field.clone());
        }
    }
    current.join(", ")
}
