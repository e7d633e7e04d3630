//! Cancellation signal exposed to handlers.
//!
//! Handlers run synchronously and are never aborted; they poll this signal
//! when they do long work. It trips when the server starts shutting down or
//! when the request deadline passes.

use std::time::{Duration, Instant};

use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    shutdown: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that never trips.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn new(shutdown: Option<watch::Receiver<bool>>, deadline: Option<Instant>) -> Self {
        Self { shutdown, deadline }
    }

    /// Signal for a request that started now and may run for `timeout`.
    pub fn with_timeout(shutdown: Option<watch::Receiver<bool>>, timeout: Duration) -> Self {
        Self::new(shutdown, Instant::now().checked_add(timeout))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Copy of this signal with a tighter deadline. A later deadline than the
    /// current one is ignored.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            shutdown: self.shutdown.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        let shutting_down = self
            .shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false);
        let expired = self
            .deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false);
        shutting_down || expired
    }
}
