//! Linear interpolation between bracketing samples.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use contracts::Timestamp;
use nalgebra::{Const, Dyn, OMatrix, RealField, SVector, Scalar};

/// One fixed-dimension measurement.
pub type Sample<T, const D: usize> = SVector<T, D>;

/// Samples laid out as columns, one column per timestamp.
pub type SampleMatrix<T, const D: usize> = OMatrix<T, Const<D>, Dyn>;

/// Linearly interpolate between `(t0, v0)` and `(t1, v1)` at `t`.
///
/// Evaluates `v0 + (v1 - v0) * (t - t0) / (t1 - t0)` per component.
/// Requires `t0 < t1`.
#[inline]
pub fn lerp<T, const D: usize>(
    t0: Timestamp,
    v0: &Sample<T, D>,
    t1: Timestamp,
    v1: &Sample<T, D>,
    t: Timestamp,
) -> Sample<T, D>
where
    T: RealField + Copy,
{
    debug_assert!(t0 < t1, "bracketing timestamps must be strictly ordered");
    // abs_diff: keys may span more than i64::MAX
    let weight: T = nalgebra::convert(t.abs_diff(t0) as f64 / t1.abs_diff(t0) as f64);
    v0 + (v1 - v0) * weight
}

/// Exact or interpolated sample at `t`.
///
/// `None` unless a stored key equals `t` or stored keys bracket it on both
/// sides. Never extrapolates.
pub(crate) fn sample_at<T, const D: usize>(
    samples: &BTreeMap<Timestamp, Sample<T, D>>,
    t: Timestamp,
) -> Option<Sample<T, D>>
where
    T: RealField + Copy,
{
    let (&t0, v0) = samples.range(..=t).next_back()?;
    if t0 == t {
        return Some(*v0);
    }
    let (&t1, v1) = samples.range((Excluded(t), Unbounded)).next()?;
    Some(lerp(t0, v0, t1, v1, t))
}

/// Result of an interpolated range query
///
/// `timestamps[i]` belongs to column `i` of `values`. An empty range means
/// the query could not be answered.
///
/// A query that only partially overlaps the stored span is clamped, not
/// extrapolated: the first column then sits at the oldest stored timestamp
/// rather than at `from` (likewise the last one at the newest). Compare
/// `timestamps.first()` / `timestamps.last()` with the requested bounds to
/// tell full coverage from a clamped result.
#[derive(Debug, Clone)]
pub struct InterpolatedRange<T: Scalar, const D: usize> {
    /// Ascending timestamps (nanoseconds)
    pub timestamps: Vec<Timestamp>,
    /// `D x N` matrix, one column per timestamp
    pub values: SampleMatrix<T, D>,
}

impl<T: RealField + Copy, const D: usize> InterpolatedRange<T, D> {
    /// Range with no columns
    pub fn empty() -> Self {
        Self {
            timestamps: Vec::new(),
            values: SampleMatrix::<T, D>::zeros(0),
        }
    }

    pub(crate) fn from_columns(timestamps: Vec<Timestamp>, columns: &[Sample<T, D>]) -> Self {
        debug_assert_eq!(timestamps.len(), columns.len());
        let mut values = SampleMatrix::<T, D>::zeros(columns.len());
        for (j, column) in columns.iter().enumerate() {
            values.set_column(j, column);
        }
        Self { timestamps, values }
    }

    /// Number of columns
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sample in column `index`
    pub fn column(&self, index: usize) -> Option<Sample<T, D>> {
        (index < self.len()).then(|| self.values.column(index).into_owned())
    }

    /// `(timestamp, sample)` pairs in ascending time order
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Sample<T, D>)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.column_iter().map(|c| c.into_owned()))
    }
}

impl<T: RealField + Copy, const D: usize> Default for InterpolatedRange<T, D> {
    fn default() -> Self {
        Self::empty()
    }
}
