//! Content negotiation for `Accept`, `Accept-Charset`, `Accept-Encoding`
//! and `Accept-Language`.
//!
//! # Design Decisions
//! - Each candidate is scored by the most specific clause it matches; the
//!   quality of that clause decides acceptability (`q=0` rejects)
//! - The winner has the highest quality, then the highest specificity,
//!   then comes first in the caller's list
//! - A missing or blank header accepts everything, so the first candidate
//!   wins

/// One parsed clause of an `Accept*` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub value: String,
    pub quality: f32,
}

/// Split a header into clauses, dropping unparsable quality values.
pub fn parse_clauses(header: &str) -> Vec<Clause> {
    header
        .split(',')
        .filter_map(|raw| {
            let mut parts = raw.split(';');
            let value = parts.next()?.trim().to_ascii_lowercase();
            if value.is_empty() {
                return None;
            }

            let mut quality = 1.0;
            for param in parts {
                if let Some((key, val)) = param.split_once('=') {
                    if key.trim().eq_ignore_ascii_case("q") {
                        quality = val.trim().parse::<f32>().ok()?.clamp(0.0, 1.0);
                    }
                }
            }
            Some(Clause { value, quality })
        })
        .collect()
}

/// Pick the best media type among `candidates`.
///
/// Candidates may be short names (`"json"`, `"html"`) or full media types;
/// the winner is returned in the caller's original form.
pub fn negotiate_media<'a>(header: Option<&str>, candidates: &[&'a str]) -> Option<&'a str> {
    negotiate(header, candidates, |clause, candidate| {
        let full = resolve_media_type(candidate)?;
        media_specificity(&clause.value, &full)
    })
}

/// Pick the best charset, encoding or plain token.
pub fn negotiate_token<'a>(header: Option<&str>, candidates: &[&'a str]) -> Option<&'a str> {
    negotiate(header, candidates, |clause, candidate| {
        if clause.value == "*" {
            Some(0)
        } else if clause.value.eq_ignore_ascii_case(candidate) {
            Some(1)
        } else {
            None
        }
    })
}

/// Pick the best language. `en` in the header matches the `en-US` candidate.
pub fn negotiate_language<'a>(header: Option<&str>, candidates: &[&'a str]) -> Option<&'a str> {
    negotiate(header, candidates, |clause, candidate| {
        let candidate = candidate.to_ascii_lowercase();
        if clause.value == "*" {
            Some(0)
        } else if clause.value == candidate {
            Some(2)
        } else if candidate
            .strip_prefix(clause.value.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
        {
            Some(1)
        } else {
            None
        }
    })
}

fn negotiate<'a, F>(header: Option<&str>, candidates: &[&'a str], specificity: F) -> Option<&'a str>
where
    F: Fn(&Clause, &str) -> Option<u8>,
{
    let clauses = match header.map(str::trim) {
        Some(h) if !h.is_empty() => parse_clauses(h),
        _ => return candidates.first().copied(),
    };

    let mut best: Option<(&'a str, f32, u8)> = None;
    for &candidate in candidates {
        let matched = clauses
            .iter()
            .filter_map(|clause| specificity(clause, candidate).map(|s| (clause.quality, s)))
            .max_by(|a, b| a.1.cmp(&b.1).then(a.0.total_cmp(&b.0)));

        let Some((quality, spec)) = matched else {
            continue;
        };
        if quality <= 0.0 {
            continue;
        }

        let better = match best {
            None => true,
            Some((_, q, s)) => quality > q || (quality == q && spec > s),
        };
        if better {
            best = Some((candidate, quality, spec));
        }
    }
    best.map(|(candidate, _, _)| candidate)
}

/// Resolve a short name to a media type; full media types pass through.
pub fn resolve_media_type(candidate: &str) -> Option<String> {
    if candidate.contains('/') {
        return Some(candidate.trim().to_ascii_lowercase());
    }
    mime_guess::from_ext(candidate.trim_start_matches('.'))
        .first()
        .map(|m| m.essence_str().to_string())
}

fn media_specificity(pattern: &str, media: &str) -> Option<u8> {
    if pattern == "*/*" || pattern == "*" {
        return Some(0);
    }
    let (pattern_type, pattern_sub) = pattern.split_once('/')?;
    let (media_type, media_sub) = media.split_once('/')?;
    if pattern_type != media_type {
        return None;
    }
    if pattern_sub == "*" {
        Some(1)
    } else if pattern_sub == media_sub {
        Some(2)
    } else {
        None
    }
}
