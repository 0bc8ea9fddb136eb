//! Cooperative cancellation for background loading
//!
//! Cancellation is checked at call boundaries only: before a load is
//! scheduled and between prefetch items. An in-flight mapped read is never
//! interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Irrevocable.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Resolves once [`cancel`](Self::cancel) has been observed.
    ///
    /// Polling granularity is coarse; cancellation is only honored at call
    /// boundaries anyway.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
