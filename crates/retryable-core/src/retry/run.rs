//! Retry loop: run an operation until it produces a non-qualifying outcome or the budget is spent.

use std::future::{Future, Ready};
use std::marker::PhantomData;

use super::classify::Classify;
use super::delay::{Delay, TokioDelay};
use super::error::{Attempt, RanOutOfRetries, RetryError};
use super::policy::RetryPolicy;

/// An operation wrapped with its own retry policy.
///
/// `F` is called with a clone of the run's arguments on every attempt. One instance
/// runs one operation at a time: `run` takes `&mut self` and resets the attempt
/// history when it starts.
///
/// ```no_run
/// # use retryable_core::retry::{Classify, Retryable};
/// # #[derive(Debug, PartialEq)]
/// # struct Flaky;
/// # impl Classify for Flaky {
/// #     type Kind = ();
/// #     fn kind(&self) {}
/// # }
/// # async fn demo() {
/// let mut fetch = Retryable::new(|page: u32| async move {
///     if page == 0 { Err(Flaky) } else { Ok(Some(page)) }
/// });
/// fetch
///     .retry()
///     .times(5)
///     .with_intervals_of(200)
///     .with_backoff_factor(2.0)
///     .if_it_throws(())
///     .if_it_returns(None);
/// let page = fetch.run(1).await;
/// # }
/// ```
pub struct Retryable<F, A, T, E: Classify, D = TokioDelay> {
    operation: F,
    policy: RetryPolicy<T, E>,
    attempts: Vec<Attempt<T, E>>,
    delay: D,
    id: Option<String>,
    _args: PhantomData<fn(A)>,
}

impl<F, Fut, A, T, E> Retryable<F, A, T, E>
where
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    /// Wraps an async operation with a default policy and the tokio delay.
    pub fn new(operation: F) -> Self {
        Self {
            operation,
            policy: RetryPolicy::default(),
            attempts: Vec::new(),
            delay: TokioDelay,
            id: None,
            _args: PhantomData,
        }
    }

    /// Like [`Retryable::new`], tagged with an id that ends up in [`RanOutOfRetries`].
    pub fn with_id(operation: F, id: impl Into<String>) -> Self {
        let mut r = Self::new(operation);
        r.id = Some(id.into());
        r
    }
}

impl<A, T, E> Retryable<(), A, T, E>
where
    E: Classify,
{
    /// Wraps a synchronous operation; its result goes through the same loop as an async one.
    pub fn from_fn<G>(
        mut operation: G,
    ) -> Retryable<impl FnMut(A) -> Ready<Result<T, E>>, A, T, E>
    where
        G: FnMut(A) -> Result<T, E>,
    {
        Retryable::new(move |args: A| std::future::ready(operation(args)))
    }
}

impl<F, Fut, A, T, E, D> Retryable<F, A, T, E, D>
where
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
    D: Delay,
{
    /// Replaces the delay primitive, e.g. with a [`RecordingDelay`](super::RecordingDelay) in tests.
    pub fn with_delay<D2: Delay>(self, delay: D2) -> Retryable<F, A, T, E, D2> {
        Retryable {
            operation: self.operation,
            policy: self.policy,
            attempts: self.attempts,
            delay,
            id: self.id,
            _args: PhantomData,
        }
    }

    /// Replaces the whole policy, e.g. one built with [`RetryPolicy::from_config`].
    pub fn with_policy(mut self, policy: RetryPolicy<T, E>) -> Self {
        self.policy = policy;
        self
    }

    /// Mutable access to the policy for builder calls between runs.
    pub fn retry(&mut self) -> &mut RetryPolicy<T, E> {
        &mut self.policy
    }

    pub fn policy(&self) -> &RetryPolicy<T, E> {
        &self.policy
    }

    /// Attempts recorded by the last run that returned a value. Empty after an
    /// exhausted run: the history moved into the error.
    pub fn attempts(&self) -> &[Attempt<T, E>] {
        &self.attempts
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl<F, Fut, A, T, E, D> Retryable<F, A, T, E, D>
where
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    A: Clone,
    E: Classify,
    D: Delay,
{
    /// Invokes the operation until it returns a value no trigger matches, fails with an
    /// error no trigger matches, or the attempt budget is spent.
    ///
    /// Every qualifying attempt is recorded, the last one included. Delays happen only
    /// between attempts: `base * factor^k + jitter` before retry `k` (0-based).
    pub async fn run(&mut self, args: A) -> Result<T, RetryError<T, E>> {
        self.attempts.clear();

        let id = self.id.as_deref();
        let mut interval = self.policy.base_interval_millis() as f64;
        let mut remaining = self.policy.max_attempts();

        while remaining > 0 {
            remaining -= 1;

            let attempt = match (self.operation)(args.clone()).await {
                Ok(value) if self.policy.classify_value(&value) => Attempt::ReturnedValue(value),
                Ok(value) => return Ok(value),
                Err(e) if self.policy.classify_error(&e) => Attempt::ExceptionThrown(e),
                Err(e) => {
                    tracing::debug!(
                        id = ?id,
                        attempt = self.attempts.len() + 1,
                        "non-retryable error, giving up"
                    );
                    return Err(RetryError::Fatal(e));
                }
            };
            self.attempts.push(attempt);

            if remaining > 0 {
                let delay_ms = delay_for(interval, self.policy.jitter().sample());
                tracing::debug!(
                    id = ?id,
                    attempt = self.attempts.len(),
                    delay_ms,
                    "qualifying outcome, retrying"
                );
                self.delay.delay(delay_ms).await;
                interval *= self.policy.backoff_factor();
            }
        }

        tracing::warn!(
            id = ?id,
            attempts = self.attempts.len(),
            max_attempts = self.policy.max_attempts(),
            "ran out of retries"
        );
        Err(RetryError::RanOutOfRetries(RanOutOfRetries::new(
            self.policy.snapshot(),
            std::mem::take(&mut self.attempts),
            self.id.clone(),
        )))
    }
}

/// Computed interval plus jitter, rounded to whole milliseconds and floored at 0.
fn delay_for(interval: f64, jitter: i64) -> u64 {
    let base = interval.round() as i64;
    base.saturating_add(jitter).max(0) as u64
}
