//! Buffer statistics snapshot shared between the buffer and observability.

use serde::{Deserialize, Serialize};

use crate::{nanosec_to_sec, Timestamp};

/// Point-in-time view of a buffer's contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStats {
    /// Number of stored samples
    pub len: usize,

    /// Oldest timestamp (nanoseconds)
    pub oldest_timestamp: Option<Timestamp>,

    /// Newest timestamp (nanoseconds)
    pub newest_timestamp: Option<Timestamp>,
}

impl BufferStats {
    /// Time covered by the stored samples, in seconds
    ///
    /// Zero for an empty or single-sample buffer.
    pub fn span_s(&self) -> f64 {
        match (self.oldest_timestamp, self.newest_timestamp) {
            (Some(oldest), Some(newest)) => nanosec_to_sec(newest - oldest),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_empty() {
        assert_eq!(BufferStats::default().span_s(), 0.0);
    }

    #[test]
    fn test_span() {
        let stats = BufferStats {
            len: 3,
            oldest_timestamp: Some(1_000_000_000),
            newest_timestamp: Some(3_500_000_000),
        };
        assert!((stats.span_s() - 2.5).abs() < 1e-12);
    }
}
