//! Nanosecond time model helpers.

/// Sample timestamp in nanoseconds.
pub type Timestamp = i64;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: f64 = 1e9;

/// Convert seconds to nanoseconds, truncating toward zero.
#[inline]
pub fn sec_to_nanosec(seconds: f64) -> Timestamp {
    (seconds * NANOS_PER_SEC) as Timestamp
}

/// Convert nanoseconds to seconds.
#[inline]
pub fn nanosec_to_sec(nanoseconds: Timestamp) -> f64 {
    nanoseconds as f64 / NANOS_PER_SEC
}
