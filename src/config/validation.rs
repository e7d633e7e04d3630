//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check static mounts and template settings are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("listener.body_limit_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("templates.ext {0:?} must start with '.'")]
    TemplateExtension(String),

    #[error("static prefix {0:?} must start with '/'")]
    StaticPrefix(String),

    #[error("static prefix {0:?} is mounted more than once")]
    DuplicateStaticPrefix(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.listener.body_limit_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if let Some(templates) = &config.templates {
        if !templates.ext.starts_with('.') {
            errors.push(ValidationError::TemplateExtension(templates.ext.clone()));
        }
    }

    let mut seen = HashSet::new();
    for mount in &config.statics {
        if !mount.prefix.starts_with('/') {
            errors.push(ValidationError::StaticPrefix(mount.prefix.clone()));
        }
        if !seen.insert(mount.prefix.trim_end_matches('/')) {
            errors.push(ValidationError::DuplicateStaticPrefix(mount.prefix.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
