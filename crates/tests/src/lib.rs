//! # Integration Tests
//!
//! Cross-crate and multi-threaded tests.
//!
//! Covers:
//! - Concurrent producers without lost updates
//! - Producers and consumers sharing one buffer
//! - Config -> buffer -> retention -> metrics flow
//! - Buffer counters exported through the Prometheus recorder

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::BufferStats::default();
        assert_eq!(contracts::sec_to_nanosec(1.0), 1_000_000_000);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use nalgebra::Vector3;
    use sample_buffer::{Sample, TimeIndexedBuffer};

    fn sample_for(t: i64) -> Sample<f64, 3> {
        let x = t as f64;
        Vector3::new(x, 2.0 * x, -x)
    }

    /// N producers each inserting M distinct timestamps end with N*M entries
    #[test]
    fn test_concurrent_producers_no_lost_updates() {
        const PRODUCERS: i64 = 6;
        const PER_PRODUCER: i64 = 1_000;

        let buffer = Arc::new(TimeIndexedBuffer::<f64, 3>::with_label("imu"));
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|id| {
                let buffer = Arc::clone(&buffer);
                thread::Builder::new()
                    .name(format!("producer-{id}"))
                    .spawn(move || {
                        for i in 0..PER_PRODUCER {
                            let t = id * PER_PRODUCER + i;
                            buffer.insert(t, sample_for(t));
                        }
                    })
                    .unwrap()
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.len(), (PRODUCERS * PER_PRODUCER) as usize);
        let guard = buffer.lock();
        for t in 0..PRODUCERS * PER_PRODUCER {
            assert_eq!(guard.value_at(t), Some(sample_for(t)), "key {t}");
        }
    }

    /// Consumers always observe a consistent, sorted store while producers write
    #[test]
    fn test_consumers_see_consistent_snapshots() {
        const STEP: i64 = 10;
        const SAMPLES: i64 = 2_000;

        let buffer = Arc::new(TimeIndexedBuffer::<f64, 3>::with_label("pose"));
        let done = Arc::new(AtomicBool::new(false));

        let producer = {
            let buffer = Arc::clone(&buffer);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..SAMPLES {
                    let t = i * STEP;
                    buffer.insert(t, sample_for(t));
                }
                done.store(true, Ordering::Release);
            })
        };

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        let Some((newest, _)) = buffer.newest_value() else {
                            continue;
                        };
                        // Midpoint between stored keys interpolates to a linear value.
                        let from = newest / 2 + STEP / 2;
                        let range = buffer.between_values_interpolated(from, newest);
                        if range.is_empty() {
                            continue;
                        }
                        assert!(range.timestamps.windows(2).all(|w| w[0] < w[1]));
                        for (t, v) in range.iter() {
                            assert!((v - sample_for(t)).norm() < 1e-6, "t={t}");
                        }
                    }
                })
            })
            .collect();

        producer.join().unwrap();
        for consumer in consumers {
            consumer.join().unwrap();
        }
        assert_eq!(buffer.len(), SAMPLES as usize);
    }

    /// A scan-then-erase under the guard is atomic with respect to producers
    #[test]
    fn test_guard_batch_prune_with_live_producer() {
        let buffer = Arc::new(TimeIndexedBuffer::<f64, 3>::with_label("gyro"));
        for t in 0..100 {
            buffer.insert(t, sample_for(t));
        }

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for t in 100..1_100 {
                    buffer.insert(t, sample_for(t));
                }
            })
        };

        for _ in 0..50 {
            let mut guard = buffer.lock();
            let len_before = guard.len();
            let Some((newest, _)) = guard.newest_value() else {
                continue;
            };
            let cutoff = newest - 50;
            let expected = guard.data().range(..cutoff).count();
            let removed = guard.remove_data_before_timestamp(cutoff);
            assert_eq!(removed, expected);
            assert_eq!(guard.len(), len_before - removed);
            assert!(guard.oldest_value().map_or(true, |(t, _)| t >= cutoff));
        }

        producer.join().unwrap();
        assert_eq!(buffer.newest_value().unwrap().0, 1_099);
    }
}

#[cfg(test)]
mod pipeline_tests {
    use config_loader::ConfigFormat;
    use contracts::{sec_to_nanosec, ContractError};
    use nalgebra::SVector;
    use observability::BufferMetricsAggregator;
    use sample_buffer::{RetentionPolicy, TimeIndexedBuffer};

    const CONFIG: &str = r#"
[[buffers]]
label = "imu"
dimension = 6
retention_s = 0.5

[[buffers]]
label = "pose"
dimension = 7
"#;

    /// Config -> buffer -> retention -> aggregated metrics
    #[test]
    fn test_config_driven_retention() {
        let config = config_loader::load_str(CONFIG, ConfigFormat::Toml).unwrap();
        let imu_config = config.get("imu").unwrap();
        imu_config.check_dimension::<6>().unwrap();

        let imu = TimeIndexedBuffer::<f64, 6>::with_label(imu_config.label.clone());
        let retention = RetentionPolicy::from_config(imu_config);
        let mut aggregator = BufferMetricsAggregator::new();

        // 200 Hz for 2 seconds
        for i in 0..400 {
            let t = i * sec_to_nanosec(0.005);
            imu.insert(t, SVector::<f64, 6>::repeat(i as f64));
            if i % 50 == 49 {
                retention.apply(&imu);
                aggregator.update(imu.label(), &imu.stats());
            }
        }

        let stats = imu.stats();
        let newest = stats.newest_timestamp.unwrap();
        let oldest = stats.oldest_timestamp.unwrap();
        assert_eq!(newest, 399 * sec_to_nanosec(0.005));
        assert_eq!(oldest, newest - sec_to_nanosec(0.5));
        assert_eq!(stats.len, 101);

        let range = imu.between_values_interpolated(0, newest);
        aggregator.record_query(imu.label(), range.len());
        assert_eq!(range.timestamps.first(), Some(&oldest));
        assert_eq!(range.len(), 101);

        let summary = aggregator.summary();
        assert_eq!(summary.buffers[0].label, "imu");
        assert_eq!(summary.buffers[0].depth.count, 8);
        assert!(summary.buffers[0].depth.max <= 101.0);
    }

    #[test]
    fn test_config_dimension_mismatch() {
        let config = config_loader::load_str(CONFIG, ConfigFormat::Toml).unwrap();
        let err = config.get("pose").unwrap().check_dimension::<3>().unwrap_err();
        assert!(matches!(err, ContractError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_keep_all_without_retention() {
        let config = config_loader::load_str(CONFIG, ConfigFormat::Toml).unwrap();
        let pose = TimeIndexedBuffer::<f32, 7>::with_label("pose");
        for i in 0..10 {
            pose.insert(sec_to_nanosec(i as f64), SVector::<f32, 7>::zeros());
        }
        let retention = RetentionPolicy::from_config(config.get("pose").unwrap());
        assert_eq!(retention.apply(&pose), 0);
        assert_eq!(pose.len(), 10);
    }
}

#[cfg(test)]
mod observability_tests {
    use config_loader::ConfigFormat;
    use contracts::LogFormat;
    use nalgebra::Vector2;
    use sample_buffer::TimeIndexedBuffer;

    /// Value of the first series of `name` whose labels contain every fragment
    fn series_value(rendered: &str, name: &str, labels: &[&str]) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| line.starts_with(&format!("{name}{{")))
            .find(|line| labels.iter().all(|label| line.contains(label)))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    /// The only test in this binary that installs a global recorder
    #[test]
    fn test_buffer_counters_reach_prometheus() {
        let handle = observability::install_recorder().unwrap();
        // Created after the recorder so its handles bind to it
        let buffer = TimeIndexedBuffer::<f64, 2>::with_label("exported");

        for t in 0..5 {
            buffer.insert(t, Vector2::new(t as f64, 0.0));
        }
        buffer.insert(4, Vector2::new(40.0, 0.0));
        assert_eq!(buffer.remove_data_before_timestamp(2), 2);
        assert!(buffer.between_values_interpolated(10, 20).is_empty());
        assert!(buffer.between_values_interpolated(3, 1).is_empty());
        observability::record_buffer_stats(buffer.label(), &buffer.stats());

        let rendered = handle.render();
        let buffer_label = r#"buffer="exported""#;
        assert_eq!(
            series_value(&rendered, "sample_buffer_inserts_total", &[buffer_label]),
            Some(6.0),
            "{rendered}"
        );
        assert_eq!(
            series_value(&rendered, "sample_buffer_pruned_total", &[buffer_label]),
            Some(2.0)
        );
        for reason in ["no_overlap", "inverted"] {
            let reason_label = format!(r#"reason="{reason}""#);
            assert_eq!(
                series_value(
                    &rendered,
                    "sample_buffer_range_query_misses_total",
                    &[buffer_label, &reason_label]
                ),
                Some(1.0),
                "{reason}"
            );
        }
        assert_eq!(
            series_value(&rendered, "sample_buffer_depth", &[buffer_label]),
            Some(3.0)
        );
    }

    /// The `[logging]` section drives subscriber setup
    #[test]
    fn test_init_from_loaded_config() {
        let config = config_loader::load_str(
            r#"
[logging]
format = "compact"
level = "warn,sample_buffer=debug"

[[buffers]]
label = "imu"
dimension = 6
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Compact);

        observability::init(&config.logging).unwrap();
        let imu = TimeIndexedBuffer::<f64, 6>::with_label("imu");
        assert!(imu.between_values_interpolated(0, 1).is_empty());
    }
}
