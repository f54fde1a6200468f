//! Results of operations the user can dismiss.

/// Result of an interactive operation.
///
/// A dismissed prompt is not a failure: it ends the operation with
/// `Cancelled` instead of an error so callers cannot mistake it for one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Done(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(v) => Outcome::Done(f(v)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }

    /// `Some` for completed operations.
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(v) => Some(v),
            Outcome::Cancelled => None,
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Done(v),
            None => Outcome::Cancelled,
        }
    }
}
