pub mod config;
pub mod logging;
pub mod retry;

pub use retry::{
    Attempt, Classify, Delay, InvalidConfiguration, RanOutOfRetries, RetryError, RetryPolicy,
    Retryable,
};
