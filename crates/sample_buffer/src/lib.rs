//! # Sample Buffer
//!
//! Thread-safe, timestamp-ordered storage for fixed-dimension sensor samples
//! (IMU, pose, ...), with nearest-neighbour lookups and linearly interpolated
//! range extraction.
//!
//! Responsibilities:
//! - Ordered, last-write-wins storage keyed by nanosecond timestamps
//! - Oldest / newest / nearest / exact lookups
//! - Interpolated range queries (`[from, to]`, never extrapolated)
//! - Caller-driven pruning and scoped batch access via [`BufferGuard`]
//!
//! ## Example
//!
//! ```
//! use nalgebra::Vector3;
//! use sample_buffer::TimeIndexedBuffer;
//!
//! let buffer = TimeIndexedBuffer::<f64, 3>::with_label("imu");
//! buffer.insert(10, Vector3::new(1.0, 0.0, 0.0));
//! buffer.insert(20, Vector3::new(2.0, 0.0, 0.0));
//! buffer.insert(30, Vector3::new(3.0, 0.0, 0.0));
//!
//! let range = buffer.between_values_interpolated(15, 25);
//! assert_eq!(range.timestamps, vec![15, 20, 25]);
//! assert!((range.values[(0, 0)] - 1.5).abs() < 1e-12);
//!
//! // Scan then erase while holding the lock once
//! {
//!     let mut guard = buffer.lock();
//!     let stale: Vec<i64> = guard.data().keys().copied().filter(|t| *t < 20).collect();
//!     assert_eq!(stale, vec![10]);
//!     guard.remove_data_before_timestamp(20);
//! }
//! assert_eq!(buffer.len(), 2);
//! ```

mod buffer;
mod guard;
mod interpolate;
mod retention;

pub use buffer::TimeIndexedBuffer;
pub use guard::BufferGuard;
pub use interpolate::{lerp, InterpolatedRange, Sample, SampleMatrix};
pub use retention::RetentionPolicy;

// Re-export contracts types
pub use contracts::{BufferConfig, BufferStats, Timestamp};
