//! Buffer configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::{ContractError, LoggingConfig};

/// Configuration for a set of sample buffers (one per sensor stream)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferSetConfig {
    /// Log output and metrics export
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Buffer declarations
    #[serde(default)]
    pub buffers: Vec<BufferConfig>,
}

impl BufferSetConfig {
    /// Look up a buffer declaration by label
    pub fn get(&self, label: &str) -> Option<&BufferConfig> {
        self.buffers.iter().find(|b| b.label == label)
    }
}

/// Single buffer declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Label used in logs and metrics (e.g. "imu", "pose")
    pub label: String,

    /// Sample dimension
    pub dimension: usize,

    /// Retention window in seconds, measured back from the newest sample.
    /// `None` keeps everything until the caller clears the buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_s: Option<f64>,
}

impl BufferConfig {
    /// Create a declaration without retention
    pub fn new(label: impl Into<String>, dimension: usize) -> Self {
        Self {
            label: label.into(),
            dimension,
            retention_s: None,
        }
    }

    /// Set the retention window
    pub fn with_retention(mut self, retention_s: f64) -> Self {
        self.retention_s = Some(retention_s);
        self
    }

    /// Check the configured dimension against a buffer's compile-time dimension
    pub fn check_dimension<const D: usize>(&self) -> Result<(), ContractError> {
        if self.dimension != D {
            return Err(ContractError::DimensionMismatch {
                label: self.label.clone(),
                configured: self.dimension,
                expected: D,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimension() {
        let config = BufferConfig::new("imu", 6);
        assert!(config.check_dimension::<6>().is_ok());

        let err = config.check_dimension::<3>().unwrap_err();
        assert!(matches!(
            err,
            ContractError::DimensionMismatch {
                configured: 6,
                expected: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_retention_defaults_to_none() {
        let config: BufferConfig =
            serde_json::from_str(r#"{ "label": "pose", "dimension": 7 }"#).unwrap();
        assert_eq!(config.retention_s, None);
    }

    #[test]
    fn test_lookup_by_label() {
        let set = BufferSetConfig {
            buffers: vec![
                BufferConfig::new("imu", 6).with_retention(2.0),
                BufferConfig::new("pose", 7),
            ],
            ..Default::default()
        };
        assert_eq!(set.get("imu").unwrap().retention_s, Some(2.0));
        assert!(set.get("gnss").is_none());
    }
}
