//! # Config Loader
//!
//! Reads a [`BufferSetConfig`] from TOML or JSON and validates it before
//! any buffer is built from it.
//!
//! ```no_run
//! let config = config_loader::load_file("buffers.toml").unwrap();
//! for buffer in &config.buffers {
//!     println!("{}: dim={}", buffer.label, buffer.dimension);
//! }
//! ```

mod validator;

use std::path::Path;

pub use contracts::{BufferConfig, BufferSetConfig, LogFormat, LoggingConfig};
pub use validator::validate;

use contracts::ContractError;

/// On-disk configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format implied by the file extension, case-insensitive
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(ContractError::config_parse(format!(
                "unsupported config format: .{other}"
            ))),
            None => Err(ContractError::config_parse(
                "cannot determine file format from extension",
            )),
        }
    }

    /// Deserialize without validating
    pub fn parse(self, content: &str) -> Result<BufferSetConfig, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| parse_error(self, e)),
            Self::Json => serde_json::from_str(content).map_err(|e| parse_error(self, e)),
        }
    }

    /// Serialize, e.g. to write out a normalized config
    pub fn render(self, config: &BufferSetConfig) -> Result<String, ContractError> {
        let rendered = match self {
            Self::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        rendered.map_err(|e| ContractError::config_parse(format!("{self:?} serialize error: {e}")))
    }
}

fn parse_error<E>(format: ConfigFormat, err: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("{format:?} parse error: {err}"),
        source: Some(Box::new(err)),
    }
}

/// Parse and validate configuration text
pub fn load_str(content: &str, format: ConfigFormat) -> Result<BufferSetConfig, ContractError> {
    let config = format.parse(content)?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse and validate a configuration file
///
/// The format is picked from the extension (`.toml` / `.json`).
pub fn load_file(path: impl AsRef<Path>) -> Result<BufferSetConfig, ContractError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    load_str(&content, format)
}
