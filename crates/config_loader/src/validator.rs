//! 配置校验模块
//!
//! 校验规则：
//! - label 非空且唯一
//! - dimension > 0
//! - retention_s 若给出，必须有限且 > 0
//! - logging.level 非空，metrics_port 不为 0

use std::collections::HashSet;

use contracts::{BufferConfig, BufferSetConfig, ContractError, LoggingConfig};

/// 校验 BufferSetConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &BufferSetConfig) -> Result<(), ContractError> {
    validate_logging(&config.logging)?;
    validate_labels(config)?;
    for (idx, buffer) in config.buffers.iter().enumerate() {
        validate_dimension(idx, buffer)?;
        validate_retention(idx, buffer)?;
    }
    Ok(())
}

/// 校验日志配置
fn validate_logging(logging: &LoggingConfig) -> Result<(), ContractError> {
    if logging.level.trim().is_empty() {
        return Err(ContractError::config_validation(
            "logging.level",
            "log level cannot be empty",
        ));
    }
    if logging.metrics_port == Some(0) {
        return Err(ContractError::config_validation(
            "logging.metrics_port",
            "metrics_port must be > 0",
        ));
    }
    Ok(())
}

/// 校验 label 非空且唯一
fn validate_labels(config: &BufferSetConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, buffer) in config.buffers.iter().enumerate() {
        if buffer.label.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("buffers[{idx}].label"),
                "buffer label cannot be empty",
            ));
        }
        if !seen.insert(buffer.label.as_str()) {
            return Err(ContractError::config_validation(
                format!("buffers[label={}]", buffer.label),
                "duplicate buffer label",
            ));
        }
    }
    Ok(())
}

/// 校验采样维度
fn validate_dimension(idx: usize, buffer: &BufferConfig) -> Result<(), ContractError> {
    if buffer.dimension == 0 {
        return Err(ContractError::config_validation(
            format!("buffers[{idx}].dimension"),
            "dimension must be > 0",
        ));
    }
    Ok(())
}

/// 校验保留窗口 (秒)
fn validate_retention(idx: usize, buffer: &BufferConfig) -> Result<(), ContractError> {
    match buffer.retention_s {
        Some(seconds) if !seconds.is_finite() || seconds <= 0.0 => {
            Err(ContractError::config_validation(
                format!("buffers[{idx}].retention_s"),
                format!("retention_s must be finite and > 0, got {seconds}"),
            ))
        }
        _ => Ok(()),
    }
}
