//! Buffer metrics collection.
//!
//! Records `BufferStats` snapshots and range query outcomes as `metrics`
//! gauges/histograms, and aggregates them in memory for run summaries.

use std::collections::BTreeMap;
use std::fmt;

use contracts::BufferStats;
use metrics::{counter, gauge, histogram};

/// Record a buffer snapshot
///
/// Call from whoever owns the buffer, e.g. a maintenance thread that also
/// applies retention.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_buffer_stats;
///
/// record_buffer_stats(buffer.label(), &buffer.stats());
/// ```
pub fn record_buffer_stats(label: &str, stats: &BufferStats) {
    gauge!("sample_buffer_depth", "buffer" => label.to_string()).set(stats.len as f64);
    gauge!("sample_buffer_span_seconds", "buffer" => label.to_string()).set(stats.span_s());
    histogram!("sample_buffer_depth_hist", "buffer" => label.to_string()).record(stats.len as f64);
}

/// Record the size of an interpolated range query result
///
/// Zero columns means the query could not be answered.
pub fn record_range_query(label: &str, columns: usize) {
    let status = if columns > 0 { "hit" } else { "miss" };
    counter!(
        "sample_buffer_range_queries_total",
        "buffer" => label.to_string(),
        "status" => status
    )
    .increment(1);
    if columns > 0 {
        histogram!("sample_buffer_range_columns", "buffer" => label.to_string())
            .record(columns as f64);
    }
}

/// Per-buffer aggregate
#[derive(Debug, Clone, Default)]
struct BufferAggregate {
    depth: RunningStats,
    span_s: RunningStats,
    queries: u64,
    query_misses: u64,
}

/// Buffer metrics aggregator
///
/// Aggregates in memory so a run can print a summary without a metrics
/// backend.
#[derive(Debug, Clone, Default)]
pub struct BufferMetricsAggregator {
    buffers: BTreeMap<String, BufferAggregate>,
}

impl BufferMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a buffer snapshot
    pub fn update(&mut self, label: &str, stats: &BufferStats) {
        let entry = self.buffers.entry(label.to_string()).or_default();
        entry.depth.push(stats.len as f64);
        entry.span_s.push(stats.span_s());
    }

    /// Fold in a range query outcome
    pub fn record_query(&mut self, label: &str, columns: usize) {
        let entry = self.buffers.entry(label.to_string()).or_default();
        entry.queries += 1;
        if columns == 0 {
            entry.query_misses += 1;
        }
    }

    /// Build a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            buffers: self
                .buffers
                .iter()
                .map(|(label, agg)| BufferSummary {
                    label: label.clone(),
                    depth: StatsSummary::from(&agg.depth),
                    span_s: StatsSummary::from(&agg.span_s),
                    queries: agg.queries,
                    miss_rate: if agg.queries > 0 {
                        agg.query_misses as f64 / agg.queries as f64 * 100.0
                    } else {
                        0.0
                    },
                })
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of every tracked buffer, ordered by label
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub buffers: Vec<BufferSummary>,
}

/// Summary of one buffer
#[derive(Debug, Clone, Default)]
pub struct BufferSummary {
    pub label: String,
    pub depth: StatsSummary,
    pub span_s: StatsSummary,
    pub queries: u64,
    /// Percentage of range queries that returned no data
    pub miss_rate: f64,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Buffer Metrics Summary ===")?;
        if self.buffers.is_empty() {
            return writeln!(f, "(no buffers tracked)");
        }
        for buffer in &self.buffers {
            writeln!(f, "[{}]", buffer.label)?;
            writeln!(f, "  Depth: {}", buffer.depth)?;
            writeln!(f, "  Span (s): {}", buffer.span_s)?;
            writeln!(
                f,
                "  Range queries: {} ({:.2}% miss)",
                buffer.queries, buffer.miss_rate
            )?;
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
