//! Caller-driven retention.
//!
//! The buffer never prunes itself. A maintenance caller (a timer thread, or
//! the producer after each insert) applies a [`RetentionPolicy`] whenever it
//! sees fit.

use contracts::BufferConfig;
use nalgebra::RealField;

use crate::{BufferGuard, TimeIndexedBuffer};

/// How much history a buffer keeps, measured back from its newest sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RetentionPolicy {
    /// Maximum age in seconds; `None` keeps everything
    pub max_age_s: Option<f64>,
}

impl RetentionPolicy {
    /// Keep every sample
    pub const fn keep_all() -> Self {
        Self { max_age_s: None }
    }

    /// Keep samples at most `seconds` older than the newest one
    pub fn max_age(seconds: f64) -> Self {
        Self {
            max_age_s: Some(seconds),
        }
    }

    /// Policy declared by a buffer configuration
    pub fn from_config(config: &BufferConfig) -> Self {
        Self {
            max_age_s: config.retention_s,
        }
    }

    /// Prune `buffer`, returning the number of removed samples
    pub fn apply<T: RealField + Copy, const D: usize>(
        &self,
        buffer: &TimeIndexedBuffer<T, D>,
    ) -> usize {
        match self.max_age_s {
            Some(seconds) => buffer.remove_data_older_than(seconds),
            None => 0,
        }
    }

    /// Prune through a guard the caller already holds
    pub fn apply_locked<T: RealField + Copy, const D: usize>(
        &self,
        guard: &mut BufferGuard<'_, T, D>,
    ) -> usize {
        match self.max_age_s {
            Some(seconds) => guard.remove_data_older_than(seconds),
            None => 0,
        }
    }
}
