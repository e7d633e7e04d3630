//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured `tracing` events)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request IDs are attached by tower-http and show up on every span
//! - Recording a metric without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
