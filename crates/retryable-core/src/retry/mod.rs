//! Retry policy and execution loop.
//!
//! A [`RetryPolicy`] holds the attempt budget, the backoff timing and the triggers
//! (error kinds, error values, return values) that qualify an outcome for a retry.
//! [`Retryable`] drives an operation under that policy and either returns the first
//! non-qualifying value, passes a non-qualifying error through untouched, or fails with
//! [`RanOutOfRetries`] carrying every recorded attempt.

mod classify;
mod delay;
mod error;
mod policy;
mod run;

pub use classify::{Classify, ErrorTrigger, Matcher, SameValue, ValueTrigger};
pub use delay::{Delay, NoDelay, RecordingDelay, TokioDelay};
pub use error::{Attempt, InvalidConfiguration, RanOutOfRetries, RetryError};
pub use policy::{JitterRange, PolicySnapshot, RetryPolicy};
pub use run::Retryable;
