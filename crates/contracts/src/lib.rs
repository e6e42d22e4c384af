//! # Contracts
//!
//! Shared types for the sample buffer workspace: errors, buffer and logging
//! configuration, statistics snapshots and the nanosecond time model.
//! Business crates depend on this crate, never the other way round.
//!
//! ## Time Model
//! - Timestamps are signed 64-bit nanoseconds (`Timestamp`)
//! - Durations given by callers are in seconds (`f64`) and converted with
//!   [`sec_to_nanosec`]

mod buffer_config;
mod error;
mod logging_config;
mod stats;
mod time;

pub use buffer_config::*;
pub use error::*;
pub use logging_config::*;
pub use stats::*;
pub use time::*;
