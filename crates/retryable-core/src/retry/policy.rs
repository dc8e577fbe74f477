use rand::Rng;
use serde::{Deserialize, Serialize};

use super::classify::{Classify, ErrorTrigger, Matcher, SameValue, ValueTrigger};
use super::error::InvalidConfiguration;
use crate::config::RetryConfig;

/// Additive random noise window, in milliseconds, applied to each computed delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min: i64,
    pub max: i64,
}

impl JitterRange {
    pub fn new(min: i64, max: i64) -> Result<Self, InvalidConfiguration> {
        if min > max {
            return Err(InvalidConfiguration::JitterRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Draws one jitter value, uniform over `[min, max]`. A `{0, 0}` window is always 0.
    pub fn sample(&self) -> i64 {
        if self.min == 0 && self.max == 0 {
            return 0;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

/// Immutable copy of the numeric part of a [`RetryPolicy`], embedded in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub max_attempts: u32,
    pub base_interval_millis: u64,
    pub backoff_factor: f64,
    pub jitter: JitterRange,
}

/// Retry configuration: attempt budget, timing, and the triggers that qualify an outcome for retry.
///
/// No trigger is registered by default, so a fresh policy never retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy<T, E: Classify> {
    max_attempts: u32,
    base_interval_millis: u64,
    backoff_factor: f64,
    jitter: JitterRange,
    error_triggers: Vec<ErrorTrigger<E>>,
    value_triggers: Vec<ValueTrigger<T>>,
}

impl<T, E: Classify> Default for RetryPolicy<T, E> {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_interval_millis: 1000,
            backoff_factor: 1.0,
            jitter: JitterRange::default(),
            error_triggers: Vec::new(),
            value_triggers: Vec::new(),
        }
    }
}

impl<T, E: Classify> RetryPolicy<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with the numeric settings of `cfg` and no triggers.
    pub fn from_config(cfg: &RetryConfig) -> Result<Self, InvalidConfiguration> {
        let mut policy = Self::new();
        policy
            .times(cfg.max_attempts)
            .with_intervals_of(cfg.interval_millis)
            .with_backoff_factor(cfg.backoff_factor)
            .with_jitter(cfg.jitter_min_millis, cfg.jitter_max_millis)?;
        Ok(policy)
    }

    /// Total number of invocations per run, including the first. `0` means the
    /// operation is never invoked and the run is exhausted immediately.
    pub fn times(&mut self, n: u32) -> &mut Self {
        self.max_attempts = n;
        self
    }

    /// Delay before the first retry.
    pub fn with_intervals_of(&mut self, millis: u64) -> &mut Self {
        self.base_interval_millis = millis;
        self
    }

    /// Multiplier applied to the interval after every retry; `1.0` keeps it constant.
    pub fn with_backoff_factor(&mut self, factor: f64) -> &mut Self {
        self.backoff_factor = factor;
        self
    }

    /// Sets the jitter window. On `min > max` the current window is kept and an error returned.
    pub fn with_jitter(&mut self, min: i64, max: i64) -> Result<&mut Self, InvalidConfiguration> {
        self.jitter = JitterRange::new(min, max)?;
        Ok(self)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_interval_millis(&self) -> u64 {
        self.base_interval_millis
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn jitter(&self) -> JitterRange {
        self.jitter
    }

    pub fn error_triggers(&self) -> &[ErrorTrigger<E>] {
        &self.error_triggers
    }

    pub fn value_triggers(&self) -> &[ValueTrigger<T>] {
        &self.value_triggers
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            max_attempts: self.max_attempts,
            base_interval_millis: self.base_interval_millis,
            backoff_factor: self.backoff_factor,
            jitter: self.jitter,
        }
    }

    /// Registers an error trigger; an already registered trigger is ignored.
    pub fn add_error_trigger(&mut self, trigger: ErrorTrigger<E>) -> &mut Self {
        if !self.error_triggers.iter().any(|t| t.same(&trigger)) {
            self.error_triggers.push(trigger);
        }
        self
    }

    /// Retry on errors of `kind` or any kind descending from it.
    pub fn if_it_throws(&mut self, kind: E::Kind) -> &mut Self {
        self.add_error_trigger(ErrorTrigger::Kind(kind))
    }

    /// Retry on errors equal to `error`.
    pub fn if_it_throws_value(&mut self, error: E) -> &mut Self
    where
        E: PartialEq,
    {
        self.add_error_trigger(ErrorTrigger::value(error))
    }

    /// Retry on errors accepted by `predicate`.
    pub fn if_it_throws_matching<P>(&mut self, predicate: P) -> &mut Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.add_error_trigger(ErrorTrigger::Matching(Matcher::new(predicate)))
    }

    pub fn classify_error(&self, observed: &E) -> bool {
        self.error_triggers.iter().any(|t| t.matches(observed))
    }

    /// Registers a value trigger; an already registered trigger is ignored.
    pub fn add_value_trigger(&mut self, trigger: ValueTrigger<T>) -> &mut Self {
        if !self.value_triggers.iter().any(|t| t.same(&trigger)) {
            self.value_triggers.push(trigger);
        }
        self
    }

    /// Retry when the operation returns exactly `value`.
    pub fn if_it_returns(&mut self, value: T) -> &mut Self
    where
        T: SameValue,
    {
        self.add_value_trigger(ValueTrigger::exactly(value))
    }

    /// Retry when the operation returns a value accepted by `predicate`.
    pub fn if_it_returns_matching<P>(&mut self, predicate: P) -> &mut Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.add_value_trigger(ValueTrigger::Matching(Matcher::new(predicate)))
    }

    pub fn classify_value(&self, observed: &T) -> bool {
        self.value_triggers.iter().any(|t| t.matches(observed))
    }
}
