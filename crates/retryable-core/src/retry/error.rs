//! Error taxonomy of a retried run and the attempt records it carries.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::policy::PolicySnapshot;

/// Builder call rejected because it would break a policy invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfiguration {
    #[error("jitter min ({min}) must not exceed jitter max ({max})")]
    JitterRange { min: i64, max: i64 },
}

/// One attempt that qualified for a retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt<T, E> {
    /// The operation returned a value registered as a retry trigger.
    ReturnedValue(T),
    /// The operation failed with an error registered as a retry trigger.
    ExceptionThrown(E),
}

impl<T, E> Attempt<T, E> {
    pub fn returned_value(&self) -> Option<&T> {
        match self {
            Attempt::ReturnedValue(v) => Some(v),
            Attempt::ExceptionThrown(_) => None,
        }
    }

    pub fn exception_thrown(&self) -> Option<&E> {
        match self {
            Attempt::ExceptionThrown(e) => Some(e),
            Attempt::ReturnedValue(_) => None,
        }
    }
}

/// The attempt budget ran out before the operation produced a non-qualifying outcome.
///
/// Carries the policy snapshot, every recorded attempt in order (including the one that
/// exhausted the budget), and the executor id if one was set.
#[derive(Debug, Clone)]
pub struct RanOutOfRetries<T, E> {
    retry_config: PolicySnapshot,
    attempts: Vec<Attempt<T, E>>,
    id: Option<String>,
}

impl<T, E> RanOutOfRetries<T, E> {
    pub fn new(retry_config: PolicySnapshot, attempts: Vec<Attempt<T, E>>, id: Option<String>) -> Self {
        Self {
            retry_config,
            attempts,
            id,
        }
    }

    pub fn retry_config(&self) -> &PolicySnapshot {
        &self.retry_config
    }

    pub fn attempts(&self) -> &[Attempt<T, E>] {
        &self.attempts
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn into_attempts(self) -> Vec<Attempt<T, E>> {
        self.attempts
    }
}

impl<T: Serialize, E: Serialize> RanOutOfRetries<T, E> {
    /// Structured diagnostic payload: `{retry_config, attempts, id}`.
    pub fn info(&self) -> serde_json::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "retry_config": serde_json::to_value(self.retry_config)?,
            "attempts": serde_json::to_value(&self.attempts)?,
            "id": self.id,
        }))
    }
}

impl<T, E> fmt::Display for RanOutOfRetries<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ran out of retries after {} recorded attempts",
            self.attempts.len()
        )?;
        if let Some(id) = &self.id {
            write!(f, " (id {})", id)?;
        }
        Ok(())
    }
}

impl<T: fmt::Debug, E: fmt::Debug> std::error::Error for RanOutOfRetries<T, E> {}

/// Terminal failure of [`Retryable::run`](super::Retryable::run).
#[derive(Debug)]
pub enum RetryError<T, E> {
    /// The operation failed with an error no trigger matched. Passed through unchanged.
    Fatal(E),
    /// Every attempt qualified for a retry and the budget is spent.
    RanOutOfRetries(RanOutOfRetries<T, E>),
}

impl<T, E> RetryError<T, E> {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RetryError::Fatal(_))
    }

    /// The original operation error, if this is a pass-through failure.
    pub fn into_fatal(self) -> Option<E> {
        match self {
            RetryError::Fatal(e) => Some(e),
            RetryError::RanOutOfRetries(_) => None,
        }
    }

    pub fn into_ran_out(self) -> Option<RanOutOfRetries<T, E>> {
        match self {
            RetryError::RanOutOfRetries(r) => Some(r),
            RetryError::Fatal(_) => None,
        }
    }
}

impl<T, E> From<RanOutOfRetries<T, E>> for RetryError<T, E> {
    fn from(r: RanOutOfRetries<T, E>) -> Self {
        RetryError::RanOutOfRetries(r)
    }
}

impl<T, E: fmt::Display> fmt::Display for RetryError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Fatal(e) => write!(f, "{}", e),
            RetryError::RanOutOfRetries(r) => write!(f, "{}", r),
        }
    }
}

impl<T, E> std::error::Error for RetryError<T, E>
where
    T: fmt::Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Fatal(e) => e.source(),
            RetryError::RanOutOfRetries(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::policy::JitterRange;

    fn snapshot() -> PolicySnapshot {
        PolicySnapshot {
            max_attempts: 2,
            base_interval_millis: 10,
            backoff_factor: 1.0,
            jitter: JitterRange::default(),
        }
    }

    #[test]
    fn ran_out_display_includes_id() {
        let r: RanOutOfRetries<i32, String> = RanOutOfRetries::new(
            snapshot(),
            vec![Attempt::ReturnedValue(0), Attempt::ExceptionThrown("x".into())],
            Some("fetch-user".into()),
        );
        assert_eq!(
            r.to_string(),
            "ran out of retries after 2 recorded attempts (id fetch-user)"
        );
    }

    #[test]
    fn info_keeps_attempt_order() {
        let r: RanOutOfRetries<i32, String> = RanOutOfRetries::new(
            snapshot(),
            vec![
                Attempt::ExceptionThrown("a".into()),
                Attempt::ReturnedValue(0),
                Attempt::ExceptionThrown("a".into()),
            ],
            None,
        );
        let info = r.info().unwrap();
        assert_eq!(info["retry_config"]["max_attempts"], 2);
        assert_eq!(info["attempts"][0]["exception_thrown"], "a");
        assert_eq!(info["attempts"][1]["returned_value"], 0);
        assert_eq!(info["attempts"][2]["exception_thrown"], "a");
        assert!(info["id"].is_null());
    }

    #[test]
    fn fatal_displays_original_error() {
        let e: RetryError<i32, std::io::Error> =
            RetryError::Fatal(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        assert!(e.is_fatal());
        assert_eq!(e.to_string(), "disk on fire");
        assert_eq!(e.into_fatal().unwrap().kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn invalid_jitter_message() {
        let e = InvalidConfiguration::JitterRange { min: 5, max: 1 };
        assert_eq!(e.to_string(), "jitter min (5) must not exceed jitter max (1)");
    }
}
