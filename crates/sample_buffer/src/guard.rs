//! Scoped exclusive access to a buffer's ordered store.
//!
//! A [`BufferGuard`] is the only way to reach the underlying map or to walk
//! it with positional cursors. The lock is released when the guard is
//! dropped, on every exit path.

use std::collections::btree_map::Range;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound::Excluded;

use contracts::{sec_to_nanosec, BufferStats, Timestamp};
use nalgebra::{RealField, Scalar};
use parking_lot::MutexGuard;

use crate::interpolate::{sample_at, InterpolatedRange, Sample};

/// Why a range query produced no data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeMiss {
    Empty,
    Inverted,
    NoOverlap,
}

impl RangeMiss {
    const ALL: [RangeMiss; 3] = [RangeMiss::Empty, RangeMiss::Inverted, RangeMiss::NoOverlap];

    fn as_str(self) -> &'static str {
        match self {
            RangeMiss::Empty => "empty",
            RangeMiss::Inverted => "inverted",
            RangeMiss::NoOverlap => "no_overlap",
        }
    }
}

/// Counter handles registered once per buffer
///
/// A handle binds to the global recorder installed when it is registered, so
/// install the recorder before creating buffers whose counters should be
/// exported. Buffers created earlier keep counting into a no-op.
pub(crate) struct BufferCounters {
    inserts: metrics::Counter,
    pruned: metrics::Counter,
    misses: [metrics::Counter; 3],
}

impl BufferCounters {
    pub(crate) fn register(label: &str) -> Self {
        let label = metrics::SharedString::from(label.to_string());
        Self {
            inserts: metrics::counter!("sample_buffer_inserts_total", "buffer" => label.clone()),
            pruned: metrics::counter!("sample_buffer_pruned_total", "buffer" => label.clone()),
            misses: RangeMiss::ALL.map(|miss| {
                metrics::counter!(
                    "sample_buffer_range_query_misses_total",
                    "buffer" => label.clone(),
                    "reason" => miss.as_str()
                )
            }),
        }
    }

    fn miss(&self, miss: RangeMiss) -> &metrics::Counter {
        &self.misses[miss as usize]
    }
}

/// Exclusive view of a [`TimeIndexedBuffer`](crate::TimeIndexedBuffer)
///
/// Holds the buffer's mutex for its whole lifetime. Keep the critical
/// section short: other producers and consumers block until it is dropped.
pub struct BufferGuard<'a, T: Scalar, const D: usize> {
    samples: MutexGuard<'a, BTreeMap<Timestamp, Sample<T, D>>>,
    label: &'a str,
    counters: &'a BufferCounters,
}

impl<T: Scalar, const D: usize> fmt::Debug for BufferGuard<'_, T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferGuard")
            .field("label", &self.label)
            .field("len", &self.samples.len())
            .finish()
    }
}

impl<'a, T: RealField + Copy, const D: usize> BufferGuard<'a, T, D> {
    pub(crate) fn new(
        samples: MutexGuard<'a, BTreeMap<Timestamp, Sample<T, D>>>,
        label: &'a str,
        counters: &'a BufferCounters,
    ) -> Self {
        Self {
            samples,
            label,
            counters,
        }
    }

    /// Underlying ordered store
    #[inline]
    pub fn data(&self) -> &BTreeMap<Timestamp, Sample<T, D>> {
        &self.samples
    }

    /// Insert or overwrite the sample at `timestamp`
    #[inline]
    pub fn insert(&mut self, timestamp: Timestamp, sample: Sample<T, D>) {
        let replaced = self.samples.insert(timestamp, sample).is_some();
        tracing::trace!(buffer = self.label, timestamp, replaced, "sample inserted");
        self.counters.inserts.increment(1);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Snapshot of size and time extent
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            len: self.samples.len(),
            oldest_timestamp: self.samples.first_key_value().map(|(&t, _)| t),
            newest_timestamp: self.samples.last_key_value().map(|(&t, _)| t),
        }
    }

    /// Sample with the smallest timestamp
    pub fn oldest_value(&self) -> Option<(Timestamp, Sample<T, D>)> {
        self.samples.first_key_value().map(|(&t, v)| (t, *v))
    }

    /// Sample with the largest timestamp
    pub fn newest_value(&self) -> Option<(Timestamp, Sample<T, D>)> {
        self.samples.last_key_value().map(|(&t, v)| (t, *v))
    }

    /// Sample stored exactly at `timestamp`
    pub fn value_at(&self, timestamp: Timestamp) -> Option<Sample<T, D>> {
        self.samples.get(&timestamp).copied()
    }

    /// Sample whose timestamp is closest to `timestamp`
    ///
    /// When two stored timestamps are equally far away the later one wins.
    pub fn nearest_value(&self, timestamp: Timestamp) -> Option<(Timestamp, Sample<T, D>)> {
        let before = self.samples.range(..timestamp).next_back();
        let after = self.samples.range(timestamp..).next();

        let (&t, v) = match (before, after) {
            (Some(before), Some(after)) => {
                if after.0.abs_diff(timestamp) <= timestamp.abs_diff(*before.0) {
                    after
                } else {
                    before
                }
            }
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => return None,
        };
        Some((t, *v))
    }

    /// Entry at `timestamp`, or the closest one before it
    pub fn entry_equal_or_before(
        &self,
        timestamp: Timestamp,
    ) -> Option<(Timestamp, &Sample<T, D>)> {
        self.samples
            .range(..=timestamp)
            .next_back()
            .map(|(&t, v)| (t, v))
    }

    /// Entry at `timestamp`, or the closest one after it
    pub fn entry_equal_or_after(
        &self,
        timestamp: Timestamp,
    ) -> Option<(Timestamp, &Sample<T, D>)> {
        self.samples.range(timestamp..).next().map(|(&t, v)| (t, v))
    }

    /// Cursor positioned at the equal-or-before entry, walking forward
    ///
    /// `None` when every stored timestamp is later than `timestamp`.
    pub fn iter_equal_or_before(
        &self,
        timestamp: Timestamp,
    ) -> Option<Range<'_, Timestamp, Sample<T, D>>> {
        let (start, _) = self.entry_equal_or_before(timestamp)?;
        Some(self.samples.range(start..))
    }

    /// Cursor positioned at the equal-or-after entry, walking forward
    ///
    /// `None` when every stored timestamp is earlier than `timestamp`.
    pub fn iter_equal_or_after(
        &self,
        timestamp: Timestamp,
    ) -> Option<Range<'_, Timestamp, Sample<T, D>>> {
        let (start, _) = self.entry_equal_or_after(timestamp)?;
        Some(self.samples.range(start..))
    }

    /// Exact or linearly interpolated sample at `timestamp`
    ///
    /// `None` outside the stored time span.
    pub fn interpolated_value(&self, timestamp: Timestamp) -> Option<Sample<T, D>> {
        sample_at(&self.samples, timestamp)
    }

    /// Samples covering `[from, to]`, interpolated at the boundaries
    ///
    /// The result starts with the sample at `from`, contains every stored
    /// sample strictly inside the interval and ends with the sample at `to`.
    /// A boundary outside the stored span is clamped to the oldest or newest
    /// stored timestamp. Returns an empty range when the store is empty,
    /// `from > to`, or the interval does not overlap the stored span.
    pub fn between_values_interpolated(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> InterpolatedRange<T, D> {
        let oldest_entry = self.samples.first_key_value();
        let newest_entry = self.samples.last_key_value();
        let (oldest, newest) = match (oldest_entry, newest_entry) {
            (Some((&oldest, _)), Some((&newest, _))) => (oldest, newest),
            _ => return self.range_miss(from, to, RangeMiss::Empty),
        };
        if from > to {
            return self.range_miss(from, to, RangeMiss::Inverted);
        }
        if from > newest || to < oldest {
            return self.range_miss(from, to, RangeMiss::NoOverlap);
        }

        let start = from.max(oldest);
        let end = to.min(newest);

        // Both boundaries lie inside [oldest, newest], so they always resolve.
        let (Some(first), Some(last)) = (
            sample_at(&self.samples, start),
            sample_at(&self.samples, end),
        ) else {
            return self.range_miss(from, to, RangeMiss::NoOverlap);
        };

        let mut timestamps = vec![start];
        let mut columns = vec![first];
        if end > start {
            for (&t, v) in self.samples.range((Excluded(start), Excluded(end))) {
                timestamps.push(t);
                columns.push(*v);
            }
            timestamps.push(end);
            columns.push(last);
        }

        InterpolatedRange::from_columns(timestamps, &columns)
    }

    /// Erase every entry with a timestamp strictly before `timestamp`
    ///
    /// Returns the number of removed entries.
    pub fn remove_data_before_timestamp(&mut self, timestamp: Timestamp) -> usize {
        let kept = self.samples.split_off(&timestamp);
        let removed = std::mem::replace(&mut *self.samples, kept).len();
        if removed > 0 {
            tracing::debug!(buffer = self.label, cutoff = timestamp, removed, "pruned samples");
            self.counters.pruned.increment(removed as u64);
        }
        removed
    }

    /// Erase every entry older than `seconds` before the newest entry
    ///
    /// No-op on an empty store.
    pub fn remove_data_older_than(&mut self, seconds: f64) -> usize {
        let Some((&newest, _)) = self.samples.last_key_value() else {
            return 0;
        };
        let cutoff = newest.saturating_sub(sec_to_nanosec(seconds));
        self.remove_data_before_timestamp(cutoff)
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn range_miss(
        &self,
        from: Timestamp,
        to: Timestamp,
        miss: RangeMiss,
    ) -> InterpolatedRange<T, D> {
        tracing::debug!(
            buffer = self.label,
            from,
            to,
            reason = miss.as_str(),
            "range query not satisfiable"
        );
        self.counters.miss(miss).increment(1);
        InterpolatedRange::empty()
    }
}
