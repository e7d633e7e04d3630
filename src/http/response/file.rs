//! File transfer: `send_file` and `download`.
//!
//! # Responsibilities
//! - Apply the dotfile policy before the file system is touched
//! - Set Content-Type, Content-Disposition, Cache-Control, Last-Modified
//!   and Accept-Ranges from the options
//! - Answer conditional GETs (`If-Modified-Since`) with 304 and single byte
//!   ranges with 206
//! - Report the outcome through the caller's completion callback
//!
//! # Design Decisions
//! - Multiple ranges fall back to the full body; an unsatisfiable range
//!   answers 416 and still counts as a completed transfer
//! - Malformed `Range` headers are ignored

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{header, Method, StatusCode};
use serde::Deserialize;

use crate::error::{FileError, RangeError};
use crate::http::request::range::parse_range;
use crate::http::response::{content_disposition, Response};

/// What to do with paths whose final segment starts with `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dotfiles {
    /// Serve them like any other file.
    Allow,
    /// Fail with `FileError::DotfilesDenied`.
    Deny,
    /// Pretend they do not exist (`FileError::NotFound`).
    #[default]
    Ignore,
}

/// Options for `send_file` / `download`.
#[derive(Debug, Clone)]
pub struct FileOptions {
    pub max_age: Duration,
    pub immutable: bool,
    pub cache_control: bool,
    pub last_modified: bool,
    pub accept_ranges: bool,
    pub dotfiles: Dotfiles,
    /// Extra headers, applied after the computed ones.
    pub headers: Vec<(String, String)>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            max_age: Duration::ZERO,
            immutable: false,
            cache_control: true,
            last_modified: true,
            accept_ranges: true,
            dotfiles: Dotfiles::Ignore,
            headers: Vec::new(),
        }
    }
}

impl FileOptions {
    fn cache_control_value(&self) -> String {
        let mut directives = vec![
            "public".to_string(),
            format!("max-age={}", self.max_age.as_secs()),
        ];
        if self.immutable {
            directives.push("immutable".to_string());
        }
        directives.join(", ")
    }
}

/// Checked on the raw encoded bytes so non-UTF-8 names are covered too.
fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.as_encoded_bytes().starts_with(b"."))
}

impl Response {
    /// Transfer the file at `path`, named `filename` for the client.
    pub fn send_file<F>(&mut self, path: impl AsRef<Path>, filename: &str, options: &FileOptions, done: F)
    where
        F: FnOnce(Result<(), FileError>),
    {
        let path = path.as_ref();
        let result = self.transfer(path, filename, options);
        if let Err(error) = &result {
            tracing::debug!(path = %path.display(), error = %error, "File transfer failed");
        }
        done(result)
    }

    /// Transfer the file as a download. The dotfile policy also covers
    /// `filename`.
    pub fn download<F>(&mut self, path: impl AsRef<Path>, filename: &str, options: &FileOptions, done: F)
    where
        F: FnOnce(Result<(), FileError>),
    {
        if options.dotfiles == Dotfiles::Deny && is_dotfile(Path::new(filename)) {
            done(Err(FileError::DotfilesDenied));
            return;
        }
        self.send_file(path, filename, options, done)
    }

    fn transfer(&mut self, path: &Path, filename: &str, options: &FileOptions) -> Result<(), FileError> {
        let hidden = is_dotfile(path) || is_dotfile(Path::new(filename));
        if hidden {
            match options.dotfiles {
                Dotfiles::Deny => return Err(FileError::DotfilesDenied),
                Dotfiles::Ignore => return Err(FileError::NotFound),
                Dotfiles::Allow => {}
            }
        }

        let fs = self.file_system();
        let meta = fs.stat(path).map_err(map_io)?;
        if meta.is_dir {
            return Err(FileError::IsDirectory);
        }
        let contents = fs.read(path).map_err(map_io)?;
        let size = contents.len() as u64;

        let name = if filename.is_empty() {
            path.to_str().unwrap_or_default()
        } else {
            filename
        };
        self.content_type(name);
        if options.cache_control {
            let value = options.cache_control_value();
            self.set(header::CACHE_CONTROL.as_str(), &value);
        }
        let modified = meta.modified.map(whole_seconds);
        if options.last_modified {
            if let Some(modified) = modified {
                self.set(
                    header::LAST_MODIFIED.as_str(),
                    &httpdate::fmt_http_date(modified),
                );
            }
        }
        if options.accept_ranges {
            self.set(header::ACCEPT_RANGES.as_str(), "bytes");
        }
        for (key, value) in &options.headers {
            self.set(key, value);
        }
        if let Some(base) = Path::new(name).file_name().and_then(|n| n.to_str()) {
            let disposition = content_disposition(base);
            self.set(header::CONTENT_DISPOSITION.as_str(), &disposition);
        }

        if self.not_modified_since(modified) {
            self.status(StatusCode::NOT_MODIFIED);
            self.commit();
            return Ok(());
        }

        let range = if options.accept_ranges {
            self.request_head()
                .headers
                .get(header::RANGE)
                .and_then(|v| v.to_str().ok())
                .map(|v| parse_range(v, size))
        } else {
            None
        };

        match range {
            Some(Ok(ranges)) if ranges.len() == 1 => {
                let range = ranges[0];
                self.set(header::CONTENT_RANGE.as_str(), &range.content_range(size));
                self.status(StatusCode::PARTIAL_CONTENT);
                let body = &contents[range.start as usize..=range.end as usize];
                self.write(body)?;
            }
            Some(Err(RangeError::Unsatisfiable)) => {
                self.set(header::CONTENT_RANGE.as_str(), &format!("bytes */{}", size));
                self.status(StatusCode::RANGE_NOT_SATISFIABLE);
                self.commit();
            }
            _ => self.write(&contents)?,
        }
        Ok(())
    }

    fn not_modified_since(&self, modified: Option<SystemTime>) -> bool {
        let head = self.request_head();
        if head.method != Method::GET && head.method != Method::HEAD {
            return false;
        }
        if head.headers.contains_key(header::IF_NONE_MATCH) {
            return false;
        }
        let since = head
            .headers
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok());
        match (modified, since) {
            (Some(modified), Some(since)) => modified <= since,
            _ => false,
        }
    }
}

fn map_io(error: std::io::Error) -> FileError {
    if error.kind() == std::io::ErrorKind::NotFound {
        FileError::NotFound
    } else {
        FileError::Io(error)
    }
}

/// HTTP dates have second precision.
fn whole_seconds(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => UNIX_EPOCH + Duration::from_secs(elapsed.as_secs()),
        Err(_) => time,
    }
}
