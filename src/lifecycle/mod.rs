//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → server stops accepting → in-flight requests drain
//!               → every request's CancelSignal reports cancelled
//!
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger()
//! ```
//!
//! # Design Decisions
//! - One `Shutdown` per application; clones share the same state
//! - Handlers are never aborted, they poll their `CancelSignal`

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
