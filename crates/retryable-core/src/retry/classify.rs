//! Trigger matching: decide whether an observed error or return value qualifies for a retry.

use std::fmt;
use std::sync::Arc;

/// Upper bound on the ancestor walk in [`ErrorTrigger::matches`]; stops a cyclic `parent` map.
const MAX_KIND_DEPTH: usize = 32;

/// Tagged view of an error for retry purposes.
///
/// Callers map their error type onto a small set of kinds. Kinds may form a
/// hierarchy through [`Classify::parent`]: a trigger registered for a parent kind
/// also matches errors whose kind descends from it, never the reverse.
pub trait Classify {
    type Kind: Copy + Eq + fmt::Debug;

    /// Kind tag of this error.
    fn kind(&self) -> Self::Kind;

    /// Parent of `kind` in the kind hierarchy, `None` for a root kind.
    fn parent(_kind: Self::Kind) -> Option<Self::Kind> {
        None
    }
}

/// Shared predicate used by [`ErrorTrigger::Matching`] and [`ValueTrigger::Matching`].
///
/// Two matchers are the same trigger only if they share the same allocation.
pub struct Matcher<X: ?Sized>(Arc<dyn Fn(&X) -> bool + Send + Sync>);

impl<X: ?Sized> Matcher<X> {
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&X) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn matches(&self, observed: &X) -> bool {
        (self.0)(observed)
    }

    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<X: ?Sized> Clone for Matcher<X> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<X: ?Sized> fmt::Debug for Matcher<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matcher(..)")
    }
}

/// Equality captured when a value trigger is registered.
pub type SameFn<X> = fn(&X, &X) -> bool;

/// A registered error condition that causes a retry.
#[derive(Clone)]
pub enum ErrorTrigger<E: Classify> {
    /// Matches errors of this kind or of any kind descending from it.
    Kind(E::Kind),
    /// Matches errors equal to this value under the captured comparison.
    Value(E, SameFn<E>),
    /// Matches errors accepted by the predicate.
    Matching(Matcher<E>),
}

impl<E: Classify> ErrorTrigger<E> {
    /// Value trigger compared with `PartialEq`.
    pub fn value(error: E) -> Self
    where
        E: PartialEq,
    {
        ErrorTrigger::Value(error, <E as PartialEq>::eq)
    }

    pub fn matches(&self, observed: &E) -> bool {
        match self {
            ErrorTrigger::Kind(kind) => {
                std::iter::successors(Some(observed.kind()), |k| E::parent(*k))
                    .take(MAX_KIND_DEPTH)
                    .any(|k| k == *kind)
            }
            ErrorTrigger::Value(value, same) => same(value, observed),
            ErrorTrigger::Matching(m) => m.matches(observed),
        }
    }

    /// Whether two triggers denote the same condition (used to drop duplicates).
    pub(crate) fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (ErrorTrigger::Kind(a), ErrorTrigger::Kind(b)) => a == b,
            (ErrorTrigger::Value(a, same), ErrorTrigger::Value(b, _)) => same(a, b),
            (ErrorTrigger::Matching(a), ErrorTrigger::Matching(b)) => a.same(b),
            _ => false,
        }
    }
}

impl<E: Classify + fmt::Debug> fmt::Debug for ErrorTrigger<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorTrigger::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            ErrorTrigger::Value(value, _) => f.debug_tuple("Value").field(value).finish(),
            ErrorTrigger::Matching(m) => f.debug_tuple("Matching").field(m).finish(),
        }
    }
}

/// Exact value equality for return-value triggers.
///
/// Implemented for primitives, strings, `()`, `Option` and `Arc` (pointer identity).
/// Composite values are deliberately left out; register them with [`ValueTrigger::Matching`].
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

macro_rules! same_value_via_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_value_via_eq!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, (), String,
    &str,
);

// Same-value-zero: NaN is equal to itself, and 0.0 to -0.0.
macro_rules! same_value_float {
    ($($t:ty),*) => {
        $(
            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other || (self.is_nan() && other.is_nan())
                }
            }
        )*
    };
}

same_value_float!(f32, f64);

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_value(b),
            _ => false,
        }
    }
}

impl<T: ?Sized> SameValue for Arc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// A registered return value that causes a retry.
#[derive(Clone)]
pub enum ValueTrigger<T> {
    /// Matches returns that are the same value under the captured comparison.
    Exactly(T, SameFn<T>),
    /// Matches returns accepted by the predicate.
    Matching(Matcher<T>),
}

impl<T> ValueTrigger<T> {
    /// Exact trigger compared with [`SameValue`].
    pub fn exactly(value: T) -> Self
    where
        T: SameValue,
    {
        ValueTrigger::Exactly(value, T::same_value)
    }

    pub fn matches(&self, observed: &T) -> bool {
        match self {
            ValueTrigger::Exactly(value, same) => same(value, observed),
            ValueTrigger::Matching(m) => m.matches(observed),
        }
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueTrigger::Exactly(a, same), ValueTrigger::Exactly(b, _)) => same(a, b),
            (ValueTrigger::Matching(a), ValueTrigger::Matching(b)) => a.same(b),
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueTrigger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueTrigger::Exactly(value, _) => f.debug_tuple("Exactly").field(value).finish(),
            ValueTrigger::Matching(m) => f.debug_tuple("Matching").field(m).finish(),
        }
    }
}
