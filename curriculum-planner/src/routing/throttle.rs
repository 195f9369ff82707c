//! Request pacing for external services.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::{Instant, sleep_until};

use super::error::RoutingError;

/// Enforces a minimum spacing between calls and bounds how many run at once.
///
/// Callers queue on an internal lock, so with a non-zero interval requests
/// are released one at a time, `interval` apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    next: Mutex<Option<Instant>>,
    semaphore: Arc<Semaphore>,
}

impl Throttle {
    pub fn new(interval: Duration, max_concurrent: usize) -> Self {
        Self {
            interval,
            next: Mutex::new(None),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Wait for a free worker and for the spacing interval to elapse.
    ///
    /// The returned permit must be held for the duration of the call.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, RoutingError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RoutingError::Closed)?;

        if !self.interval.is_zero() {
            let mut next = self.next.lock().await;
            if let Some(at) = *next
                && at > Instant::now()
            {
                sleep_until(at).await;
            }
            *next = Some(Instant::now() + self.interval);
        }

        Ok(permit)
    }
}
