//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - 按 `[logging]` 配置初始化 Tracing (JSON/Pretty/Compact)
//! - Prometheus 指标导出 (HTTP 端点，或进程内 `PrometheusHandle`)
//! - 缓冲区快照指标与统计汇总
//!
//! 缓冲区在构造时注册计数器句柄，因此必须先安装 recorder，再创建缓冲区。
//!
//! ## 使用示例
//!
//! ```ignore
//! let config = config_loader::load_file("buffers.toml")?;
//! observability::init(&config.logging)?;
//!
//! let imu = TimeIndexedBuffer::<f64, 6>::with_label("imu");
//! // 维护线程中定期记录
//! observability::record_buffer_stats(imu.label(), &imu.stats());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use contracts::{LogFormat, LoggingConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use metrics_exporter_prometheus::PrometheusHandle;

// Re-exports
pub use crate::metrics::{
    record_buffer_stats, record_range_query, BufferMetricsAggregator, BufferSummary,
    MetricsSummary, RunningStats, StatsSummary,
};

/// 初始化可观测性（Tracing + 可选 Prometheus 端点）
///
/// 每个进程只能调用一次。
pub fn init(config: &LoggingConfig) -> Result<()> {
    init_tracing(config)?;

    if let Some(port) = config.metrics_port {
        serve_metrics(port)?;
    }

    tracing::info!(
        log_format = ?config.format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// 仅初始化 Tracing
///
/// `RUST_LOG` 优先于 `config.level`。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level: {}", config.level))?,
    };

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_thread_names(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_thread_names(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

/// 安装 Prometheus recorder 并监听 0.0.0.0:port
pub fn serve_metrics(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

/// 安装 Prometheus recorder，不启动 HTTP 端点
///
/// 通过返回的句柄 `render()` 导出文本格式，适合嵌入宿主进程或测试。
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}
