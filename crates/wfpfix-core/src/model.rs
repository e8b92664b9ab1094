use std::ops::Index;

use serde::Serialize;

use crate::error::{CorrectionError, Severity};

/// Anything carrying a position on the shared time axis.
pub trait Timestamped {
    fn timestamp(&self) -> f64;
}

/// One target-stream record.
///
/// `value` is the raw physical quantity as recorded by the target instrument; it
/// is converted into the reference unit by the injected conversion function.
/// `timestamp` is the only field the engine ever rewrites.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<P> {
    timestamp: f64,
    value: f64,
    payload: P,
}

impl<P> Sample<P> {
    pub fn new(timestamp: f64, value: f64, payload: P) -> Self {
        Self {
            timestamp,
            value,
            payload,
        }
    }

    pub fn set_timestamp(&mut self, timestamp: f64) {
        self.timestamp = timestamp;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

impl<P> Timestamped for Sample<P> {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// A trusted `(timestamp, value)` pair from the reference stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceTuple {
    pub timestamp: f64,
    pub value: f64,
}

impl ReferenceTuple {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl Timestamped for ReferenceTuple {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// An ordered, non-empty run of elements from one physical deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile<T> {
    items: Vec<T>,
}

impl<T> Profile<T> {
    /// Returns `None` for an empty vector; profiles are never empty.
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    // Always false.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> &T {
        &self.items[0]
    }

    pub fn last(&self) -> &T {
        &self.items[self.items.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }
}

impl<T: Timestamped> Profile<T> {
    pub fn start_time(&self) -> f64 {
        self.first().timestamp()
    }

    pub fn end_time(&self) -> f64 {
        self.last().timestamp()
    }

    /// Timestamp of the element at index `len / 2`.
    pub fn midpoint_time(&self) -> f64 {
        self.items[self.items.len() / 2].timestamp()
    }

    pub fn time_range(&self) -> (f64, f64) {
        (self.start_time(), self.end_time())
    }

    /// Inclusive on both ends.
    pub fn contains_time(&self, time: f64) -> bool {
        self.start_time() <= time && time <= self.end_time()
    }
}

impl<T> Index<usize> for Profile<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a Profile<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Whether the profiler is moving toward higher or lower values over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Ascending when `first < last`, descending otherwise.
    pub fn from_endpoints(first: f64, last: f64) -> Self {
        if first < last {
            Direction::Ascending
        } else {
            Direction::Descending
        }
    }

    /// True when `value` lies strictly before `boundary` in travel order.
    pub fn is_before(self, value: f64, boundary: f64) -> bool {
        match self {
            Direction::Ascending => value < boundary,
            Direction::Descending => value > boundary,
        }
    }

    /// True when `value` lies strictly after `boundary` in travel order.
    pub fn is_after(self, value: f64, boundary: f64) -> bool {
        match self {
            Direction::Ascending => value > boundary,
            Direction::Descending => value < boundary,
        }
    }
}

/// Result of correcting one target profile. Never silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionOutcome {
    pub corrected: bool,
    pub warning: Option<String>,
    pub cause: Option<CorrectionError>,
}

impl CorrectionOutcome {
    pub fn corrected() -> Self {
        Self {
            corrected: true,
            warning: None,
            cause: None,
        }
    }

    /// Profile left with its original timestamps.
    pub fn uncorrected(cause: CorrectionError) -> Self {
        Self {
            corrected: false,
            warning: Some(cause.to_string()),
            cause: Some(cause),
        }
    }

    /// Profile corrected, but with a caveat worth surfacing.
    pub fn corrected_with_warning(cause: CorrectionError) -> Self {
        Self {
            corrected: true,
            warning: Some(cause.to_string()),
            cause: Some(cause),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        self.cause.as_ref().map(CorrectionError::severity)
    }
}

impl From<Result<(), CorrectionError>> for CorrectionOutcome {
    fn from(result: Result<(), CorrectionError>) -> Self {
        match result {
            Ok(()) => CorrectionOutcome::corrected(),
            Err(cause) => CorrectionOutcome::uncorrected(cause),
        }
    }
}
