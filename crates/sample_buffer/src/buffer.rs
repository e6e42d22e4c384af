//! Thread-safe, timestamp-ordered sample buffer.
//!
//! Samples live in a `BTreeMap` keyed by nanosecond timestamps behind a
//! single mutex. Every method on [`TimeIndexedBuffer`] takes the lock once
//! and releases it before returning; batch work goes through
//! [`TimeIndexedBuffer::lock`].

use std::collections::BTreeMap;
use std::fmt;

use contracts::{BufferStats, Timestamp};
use nalgebra::{RealField, Scalar};
use parking_lot::Mutex;

use crate::guard::{BufferCounters, BufferGuard};
use crate::interpolate::{InterpolatedRange, Sample};

const DEFAULT_LABEL: &str = "buffer";

/// Ordered store of `D`-dimensional samples keyed by nanosecond timestamps
///
/// Inserting at an existing timestamp overwrites the stored sample. The
/// buffer never evicts on its own; call the `remove_*` methods (or a
/// [`RetentionPolicy`](crate::RetentionPolicy)) to bound memory.
pub struct TimeIndexedBuffer<T: Scalar, const D: usize> {
    samples: Mutex<BTreeMap<Timestamp, Sample<T, D>>>,
    /// Tag for logs and metrics
    label: String,
    counters: BufferCounters,
}

impl<T: Scalar, const D: usize> fmt::Debug for TimeIndexedBuffer<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TimeIndexedBuffer");
        s.field("label", &self.label).field("dim", &D);
        // Never block inside Debug: the caller may already hold the lock.
        match self.samples.try_lock() {
            Some(samples) => s.field("len", &samples.len()),
            None => s.field("len", &"<locked>"),
        };
        s.finish()
    }
}

impl<T: RealField + Copy, const D: usize> Default for TimeIndexedBuffer<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Copy, const D: usize> TimeIndexedBuffer<T, D> {
    /// Sample dimension
    pub const DIM: usize = D;

    /// Create an empty buffer
    pub fn new() -> Self {
        Self::with_label(DEFAULT_LABEL)
    }

    /// Create an empty buffer tagged with `label` in logs and metrics
    ///
    /// Metric handles are registered here against the global recorder
    /// installed at this point. Install the exporter first.
    ///
    /// # Panics
    /// If `D == 0`.
    pub fn with_label(label: impl Into<String>) -> Self {
        assert!(D > 0, "sample dimension must be non-zero");
        let label = label.into();
        Self {
            samples: Mutex::new(BTreeMap::new()),
            counters: BufferCounters::register(&label),
            label,
        }
    }

    /// Label used in logs and metrics
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Acquire exclusive access for a batch of operations
    ///
    /// Blocks until the lock is free. The lock is released when the guard
    /// is dropped. Calling any other method of this buffer on the same
    /// thread while the guard is alive deadlocks.
    pub fn lock(&self) -> BufferGuard<'_, T, D> {
        BufferGuard::new(self.samples.lock(), &self.label, &self.counters)
    }

    /// Acquire exclusive access if nobody else holds it
    pub fn try_lock(&self) -> Option<BufferGuard<'_, T, D>> {
        self.samples
            .try_lock()
            .map(|samples| BufferGuard::new(samples, &self.label, &self.counters))
    }

    /// Insert or overwrite the sample at `timestamp`
    pub fn insert(&self, timestamp: Timestamp, sample: Sample<T, D>) {
        self.lock().insert(timestamp, sample);
    }

    /// Insert a sample given as a slice of components
    ///
    /// # Panics
    /// If `values.len() != D`. A mismatched dimension is a caller bug.
    pub fn insert_slice(&self, timestamp: Timestamp, values: &[T]) {
        assert_eq!(
            values.len(),
            D,
            "buffer '{}' expects {}-dimensional samples, got {} components",
            self.label,
            D,
            values.len()
        );
        self.insert(timestamp, Sample::<T, D>::from_column_slice(values));
    }

    /// Sample with the smallest timestamp, `None` when empty
    pub fn oldest_value(&self) -> Option<(Timestamp, Sample<T, D>)> {
        self.lock().oldest_value()
    }

    /// Sample with the largest timestamp, `None` when empty
    pub fn newest_value(&self) -> Option<(Timestamp, Sample<T, D>)> {
        self.lock().newest_value()
    }

    /// Sample closest to `timestamp` (ties go to the later timestamp)
    pub fn nearest_value(&self, timestamp: Timestamp) -> Option<(Timestamp, Sample<T, D>)> {
        self.lock().nearest_value(timestamp)
    }

    /// Sample stored exactly at `timestamp`
    pub fn value_at(&self, timestamp: Timestamp) -> Option<Sample<T, D>> {
        self.lock().value_at(timestamp)
    }

    /// Exact or interpolated sample at `timestamp`, `None` outside the stored span
    pub fn interpolated_value(&self, timestamp: Timestamp) -> Option<Sample<T, D>> {
        self.lock().interpolated_value(timestamp)
    }

    /// Samples covering `[from, to]` with interpolated boundaries
    ///
    /// See [`BufferGuard::between_values_interpolated`].
    pub fn between_values_interpolated(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> InterpolatedRange<T, D> {
        self.lock().between_values_interpolated(from, to)
    }

    /// Erase entries strictly older than `timestamp`, returning how many went
    pub fn remove_data_before_timestamp(&self, timestamp: Timestamp) -> usize {
        self.lock().remove_data_before_timestamp(timestamp)
    }

    /// Erase entries more than `seconds` older than the newest entry
    pub fn remove_data_older_than(&self, seconds: f64) -> usize {
        self.lock().remove_data_older_than(seconds)
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of size and time extent
    pub fn stats(&self) -> BufferStats {
        self.lock().stats()
    }
}
