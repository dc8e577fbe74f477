//! Delay primitive used between attempts.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends the current task for at least `millis` milliseconds.
pub trait Delay {
    fn delay(&self, millis: u64) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    fn delay(&self, millis: u64) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(Duration::from_millis(millis))
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay(&self, _millis: u64) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

/// Records every requested delay without sleeping.
///
/// Clones share the same log, so a test can keep one handle and give another to the executor.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    calls: Arc<Mutex<Vec<u64>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays, in call order.
    pub fn calls(&self) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Delay for RecordingDelay {
    fn delay(&self, millis: u64) -> impl Future<Output = ()> + Send {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(millis);
        std::future::ready(())
    }
}
