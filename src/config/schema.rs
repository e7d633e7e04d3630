//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

use crate::config::settings::Settings;

/// Root configuration for an application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// The application settings surface (`trust proxy`, `subdomain offset`, ...).
    pub settings: Settings,

    /// Optional template directory.
    pub templates: Option<TemplatesConfig>,

    /// Static file mounts.
    pub statics: Vec<StaticConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum buffered request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Template loading configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory holding the templates.
    pub dir: String,

    /// File extension of the templates.
    pub ext: String,

    /// Directory (relative to `dir`) holding partials.
    pub includes_dir: String,

    /// Directory (relative to `dir`) holding layouts that wrap pages.
    pub layout: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: "templates".to_string(),
            ext: ".html".to_string(),
            includes_dir: "includes".to_string(),
            layout: "layouts".to_string(),
        }
    }
}

/// A static file mount.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StaticConfig {
    /// URL path prefix (e.g., "/assets").
    pub prefix: String,

    /// Directory served under the prefix.
    pub dir: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "trellis=debug,tower_http=debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
