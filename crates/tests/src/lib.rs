//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots (config and status shapes)
//! - Config file -> registry -> pipeline flows on a manual clock
//! - Concurrent writers and pollers

#[cfg(test)]
mod contract_tests {
    use contracts::{ManualClock, Measurement, SensorStatus, Timestamp};
    use liveness::{build_registry, transforms_from_blueprint};
    use std::sync::Arc;

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_status_json_shape() {
        let bp = config_loader::ConfigLoader::load_from_str(
            r#"
[[sensors]]
name = "depth"
driver = { kind = "depth" }
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let clock = ManualClock::new(Timestamp::from_secs(1.0));
        let registry =
            build_registry(&bp, Arc::new(clock), transforms_from_blueprint(&bp)).unwrap();
        registry.apply(&Measurement::depth("depth", 1.0, 7.5)).unwrap();

        let json = serde_json::to_value(registry.status("depth").unwrap()).unwrap();
        assert_eq!(json["name"], "depth");
        assert_eq!(json["kind"], "depth");
        assert_eq!(json["active"], true);
        assert_eq!(json["depth"], 7.5);
        assert_eq!(json["last_unique_update"], 1.0);
        assert!(json["last_diagnostic"].is_null());

        let back: SensorStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back.depth, 7.5);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        DeadReckonReport, ManualClock, Measurement, MeasurementPayload, MonitorBlueprint,
        RefreshOutcome, Timestamp,
    };
    use liveness::{build_registry, transforms_from_blueprint, DeliveryPipeline, SensorRegistry};
    use observability::LivenessMetricsAggregator;

    const MONITOR_TOML: &str = r#"
[monitor]
default_inactivity_timeout_sec = 2.0
diagnostic_interval_sec = 1.0

[[sensors]]
name = "depth"
driver = { kind = "depth", min_depth = -1.0, max_depth = 100.0 }

[[sensors]]
name = "dvl"
inactivity_timeout_sec = 1.0
driver = { kind = "dvl", frame = "dvl", reference_frame = "auv" }

[[transforms]]
parent = "auv"
child = "dvl"
[transforms.transform.location]
x = 0.0
y = 0.0
z = 0.0
[transforms.transform.rotation]
pitch = 0.0
yaw = -135.0
roll = 180.0
"#;

    fn blueprint() -> MonitorBlueprint {
        ConfigLoader::load_from_str(MONITOR_TOML, ConfigFormat::Toml).unwrap()
    }

    fn setup() -> (ManualClock, SensorRegistry) {
        let bp = blueprint();
        let clock = ManualClock::new(Timestamp::ZERO);
        let registry = build_registry(
            &bp,
            Arc::new(clock.clone()),
            transforms_from_blueprint(&bp),
        )
        .unwrap();
        (clock, registry)
    }

    fn at(clock: &ManualClock, secs: f64) {
        clock.set(Timestamp::from_secs(secs));
    }

    fn dvl(z: f64, status: bool) -> MeasurementPayload {
        MeasurementPayload::DeadReckon(DeadReckonReport {
            x: 1.0,
            y: 0.5,
            z,
            std: 0.05,
            status,
        })
    }

    /// Valid reading, then invalid data, then silence
    #[test]
    fn test_invalid_data_then_staleness() {
        let (clock, registry) = setup();
        assert!(!registry.is_active("depth"));
        assert_eq!(registry.status("depth").unwrap().depth, 0.0);

        at(&clock, 0.0);
        registry.apply(&Measurement::depth("depth", 0.0, 5.0)).unwrap();
        assert!(registry.is_active("depth"));
        assert_eq!(registry.status("depth").unwrap().depth, 5.0);

        at(&clock, 1.0);
        let outcome = registry
            .apply(&Measurement::depth("depth", 1.0, f64::NAN))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Invalid { reported: true });
        assert_eq!(registry.status("depth").unwrap().depth, 5.0);
        assert!(registry.is_active("depth"));

        at(&clock, 3.0);
        assert!(!registry.is_active("depth"));
        assert_eq!(registry.status("depth").unwrap().depth, 5.0);
    }

    /// Repeated identical readings do not keep a sensor alive
    #[test]
    fn test_repeated_reading_goes_stale() {
        let (clock, registry) = setup();

        at(&clock, 0.0);
        registry.apply(&Measurement::depth("depth", 0.0, 5.0)).unwrap();
        at(&clock, 1.9);
        let outcome = registry.apply(&Measurement::depth("depth", 1.9, 5.0)).unwrap();
        assert_eq!(outcome, RefreshOutcome::Repeated);
        assert!(registry.is_active("depth"));

        at(&clock, 2.1);
        assert!(!registry.is_active("depth"));
    }

    /// Out-of-range depth is invalid, diagnostics at most once per second
    #[test]
    fn test_diagnostics_rate_limited_end_to_end() {
        let (clock, registry) = setup();
        let mut aggregator = LivenessMetricsAggregator::new();

        for t in [0.0, 0.3, 0.6, 0.99, 1.0, 1.5, 2.2] {
            at(&clock, t);
            let outcome = registry
                .apply(&Measurement::depth("depth", t, 250.0))
                .unwrap();
            aggregator.update("depth", &outcome, t);
        }

        let summary = aggregator.summary();
        let depth = &summary.sensors["depth"];
        assert_eq!(depth.counts.invalid, 7);
        // Reported at 0.0, 1.0 and 2.2
        assert_eq!(depth.counts.reported, 3);
        assert_eq!(depth.invalid_rate, 100.0);

        let status = registry.status("depth").unwrap();
        assert!(!status.has_reading);
        assert_eq!(status.last_diagnostic, Some(Timestamp::from_secs(2.2)));
        assert!(!status.active);
    }

    /// DVL report resolved through the flipped mount
    #[test]
    fn test_dvl_through_mount() {
        let (clock, registry) = setup();

        at(&clock, 0.0);
        let outcome = registry
            .apply(&Measurement::new("dvl", 0.0, dvl(2.0, true)))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Unique);
        let status = registry.status("dvl").unwrap();
        // Roll of 180 degrees flips the z axis
        assert!((status.depth + 2.0).abs() < 1e-9, "got {}", status.depth);

        // A failed fix is invalid and keeps the last depth
        at(&clock, 0.5);
        let outcome = registry
            .apply(&Measurement::new("dvl", 0.5, dvl(3.0, false)))
            .unwrap();
        assert!(!outcome.is_accepted());
        assert!((registry.status("dvl").unwrap().depth + 2.0).abs() < 1e-9);

        // The dvl uses its own 1s timeout
        at(&clock, 1.0);
        assert!(!registry.is_active("dvl"));
    }

    /// Wrong payload kind is rejected without touching state
    #[test]
    fn test_payload_mismatch() {
        let (_clock, registry) = setup();
        let err = registry
            .apply(&Measurement::new("depth", 0.0, dvl(1.0, true)))
            .unwrap_err();
        assert!(err.to_string().contains("cannot ingest"), "got: {err}");
        assert!(!registry.status("depth").unwrap().has_reading);
    }

    /// Several transport callbacks feeding one pipeline
    #[tokio::test]
    async fn test_pipeline_with_concurrent_senders() {
        let (clock, registry) = setup();
        let registry = Arc::new(registry);

        let pipeline = DeliveryPipeline::new(1024);
        let depth_sender = pipeline.sender();
        let dvl_sender = pipeline.sender();
        let delivery = pipeline.spawn(registry.clone());

        let depth_task = tokio::spawn(async move {
            for i in 0..50 {
                depth_sender.deliver(Measurement::depth("depth", i as f64 * 0.01, 10.0 + i as f64));
                tokio::task::yield_now().await;
            }
        });
        let dvl_task = tokio::spawn(async move {
            for i in 0..50 {
                // Every other report repeats the previous position
                let z = (i / 2) as f64;
                dvl_sender.deliver(Measurement::new("dvl", i as f64 * 0.01, dvl(z, true)));
                tokio::task::yield_now().await;
            }
        });

        depth_task.await.unwrap();
        dvl_task.await.unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(5), delivery)
            .await
            .expect("delivery timed out")
            .unwrap();

        assert_eq!(stats.delivered, 100);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.unique, 50 + 25);
        assert_eq!(stats.repeated, 25);

        assert_eq!(registry.status("depth").unwrap().depth, 59.0);
        assert_eq!(registry.active_ids().len(), 2);

        at(&clock, 5.0);
        assert!(registry.active_ids().is_empty());
    }

    /// A poller on another thread only ever sees consistent readings
    #[test]
    fn test_poller_sees_consistent_state() {
        let (clock, registry) = setup();
        let registry = Arc::new(registry);
        let done = Arc::new(AtomicBool::new(false));

        let poller = {
            let registry = registry.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut polls = 0u64;
                while !done.load(Ordering::Acquire) {
                    let status = registry.status("depth").unwrap();
                    assert!(status.depth == 0.0 || (1.0..=2.0).contains(&status.depth));
                    assert_eq!(status.has_reading, status.last_unique_update.is_some());
                    polls += 1;
                }
                polls
            })
        };

        for i in 0..=100 {
            let t = i as f64 * 0.01;
            at(&clock, t);
            registry
                .apply(&Measurement::depth("depth", t, 1.0 + t))
                .unwrap();
        }
        done.store(true, Ordering::Release);
        poller.join().unwrap();

        assert!(registry.is_active("depth"));
        assert!((registry.status("depth").unwrap().depth - 2.0).abs() < 1e-9);
    }
}
