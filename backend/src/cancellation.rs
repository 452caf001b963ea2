//! Cooperative cancellation for request pipelines.
//!
//! A [`CancellationToken`] is cloned into every stage of a request. Stages
//! check it at their boundaries, and the unit of work races transactional
//! work against it so an open transaction can be rolled back promptly.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::domain::Fault;

/// Shared cancellation flag.
///
/// Clones observe the same flag. Cancellation is one-way.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`Fault::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), Fault> {
        if self.is_cancelled() {
            Err(Fault::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        loop {
            // Register interest before reading the flag so a concurrent
            // `cancel` cannot slip between the check and the wait.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Drive `future` to completion unless cancellation wins first.
    ///
    /// When cancellation wins, `future` is dropped before it completes.
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, Fault> {
        self.check()?;
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Fault::Cancelled),
            output = future => Ok(output),
        }
    }
}
