//! Scripted operation and error type shared by the integration tests.

use retryable_core::Classify;
use std::collections::VecDeque;
use std::fmt;
use std::future::Ready;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    A,
    B,
    Io,
    Timeout,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    A,
    B,
    Io(&'static str),
    /// Descends from `Io`.
    Timeout(u32),
    Fatal(&'static str),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpError::A => write!(f, "error A"),
            OpError::B => write!(f, "error B"),
            OpError::Io(what) => write!(f, "io: {}", what),
            OpError::Timeout(ms) => write!(f, "timed out after {}ms", ms),
            OpError::Fatal(what) => write!(f, "fatal: {}", what),
        }
    }
}

impl std::error::Error for OpError {}

impl Classify for OpError {
    type Kind = OpKind;

    fn kind(&self) -> OpKind {
        match self {
            OpError::A => OpKind::A,
            OpError::B => OpKind::B,
            OpError::Io(_) => OpKind::Io,
            OpError::Timeout(_) => OpKind::Timeout,
            OpError::Fatal(_) => OpKind::Fatal,
        }
    }

    fn parent(kind: OpKind) -> Option<OpKind> {
        match kind {
            OpKind::Timeout => Some(OpKind::Io),
            _ => None,
        }
    }
}

/// Error wrapping `std::io::Error`, classified by its `io::ErrorKind`. No `PartialEq`.
#[derive(Debug)]
pub struct IoFailure(pub std::io::Error);

impl IoFailure {
    pub fn new(kind: std::io::ErrorKind, msg: &'static str) -> Self {
        Self(std::io::Error::new(kind, msg))
    }
}

impl fmt::Display for IoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io failure: {}", self.0)
    }
}

impl std::error::Error for IoFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl Classify for IoFailure {
    type Kind = std::io::ErrorKind;

    fn kind(&self) -> std::io::ErrorKind {
        self.0.kind()
    }
}

/// Plays back a fixed sequence of outcomes, one per call, and counts calls.
pub struct Script<T, E> {
    steps: Arc<Mutex<VecDeque<Result<T, E>>>>,
    calls: Arc<AtomicUsize>,
    args: Arc<Mutex<Vec<String>>>,
}

impl<T, E> Clone for Script<T, E> {
    fn clone(&self) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
            calls: Arc::clone(&self.calls),
            args: Arc::clone(&self.args),
        }
    }
}

impl<T, E> Script<T, E> {
    pub fn new(steps: impl IntoIterator<Item = Result<T, E>>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            calls: Arc::new(AtomicUsize::new(0)),
            args: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Debug renderings of the arguments passed on each call.
    pub fn args(&self) -> Vec<String> {
        self.args.lock().unwrap().clone()
    }

    pub fn next(&self) -> Result<T, E> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("operation called more often than scripted")
    }

    /// Operation that resolves immediately.
    pub fn op<A: fmt::Debug>(&self) -> impl FnMut(A) -> Ready<Result<T, E>> {
        let script = self.clone();
        move |args: A| {
            script.args.lock().unwrap().push(format!("{:?}", args));
            std::future::ready(script.next())
        }
    }
}
