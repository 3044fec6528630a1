//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Configuration document snapshots
//! - Configuration -> transform graph -> persisted definitions
//! - Tracker / video frames -> temporal calibration through the graph resolver

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, NavConfig, TemporalCalibrationConfig};

    #[test]
    fn test_default_document_shape() {
        let json = serde_json_snapshot(&NavConfig::default());
        assert!(json.contains("\"version\":\"V1\""));
        assert!(json.contains("\"probe_to_reference_transform\":\"ProbeToReference\""));
        assert!(json.contains("\"peak_position\":\"centroid\""));
        assert_eq!(NavConfig::default().version, ConfigVersion::V1);
    }

    #[test]
    fn test_calibration_defaults_survive_toml() {
        let toml = config_loader::ConfigLoader::to_toml(&NavConfig::default()).unwrap();
        let parsed =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        let defaults = TemporalCalibrationConfig::default();
        assert_eq!(
            parsed.temporal_calibration.sampling_resolution_sec,
            defaults.sampling_resolution_sec
        );
        assert_eq!(
            parsed.temporal_calibration.line_fit.seed,
            defaults.line_fit.seed
        );
    }

    fn serde_json_snapshot(config: &NavConfig) -> String {
        config_loader::ConfigLoader::to_json(config)
            .unwrap()
            .split_whitespace()
            .collect()
    }
}

#[cfg(test)]
mod graph_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::TransformStatus;
    use transform_graph::TransformGraph;

    const CONFIG: &str = r#"
[temporal_calibration]
max_tracker_lag_sec = 0.5

[[coordinate_definitions.transforms]]
from = "Image"
to = "Probe"
matrix = [[0.1,0,0,5],[0,0.1,0,0],[0,0,0.1,0],[0,0,0,1]]
date = "2011.12.01 17:57:00"
error = 0.5

[[coordinate_definitions.transforms]]
from = "Probe"
to = "Reference"
matrix = [[1,0,0,0],[0,1,0,0],[0,0,1,30],[0,0,0,1]]

[[coordinate_definitions.transforms]]
from = "Stylus"
to = "Reference"
matrix = [[1,0,0,0],[0,1,0,7],[0,0,1,0],[0,0,0,1]]
status = "invalid"
persistent = false
"#;

    fn load_graph() -> TransformGraph {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let mut graph = TransformGraph::new();
        graph
            .load_coordinate_definitions(&config.coordinate_definitions)
            .unwrap();
        graph
    }

    #[test]
    fn test_chained_transform_from_config() {
        let graph = load_graph();

        // ImageToReference = ProbeToReference * ImageToProbe
        let (m, status) = graph.get_transform("Image", "Reference").unwrap();
        assert!(status.is_valid());
        assert!((m[(0, 0)] - 0.1).abs() < 1e-12);
        assert!((m[(0, 3)] - 5.0).abs() < 1e-12);
        assert!((m[(2, 3)] - 30.0).abs() < 1e-12);

        // Through the invalid stylus edge the status is invalid
        assert_eq!(
            graph.get_transform_status("Image", "Stylus").unwrap(),
            TransformStatus::Invalid
        );
        let (m, _) = graph.get_transform("Image", "Stylus").unwrap();
        assert!((m[(1, 3)] + 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_persistent_definitions_round_trip() {
        let graph = load_graph();
        let mut config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        config.coordinate_definitions = graph.coordinate_definitions();
        assert_eq!(config.coordinate_definitions.transforms.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usnav.toml");
        ConfigLoader::save_to_path(&config, &path).unwrap();

        let reloaded = ConfigLoader::load_from_path(&path).unwrap();
        let image_to_probe = &reloaded.coordinate_definitions.transforms[0];
        assert_eq!(image_to_probe.from, "Image");
        assert_eq!(image_to_probe.date.as_deref(), Some("2011.12.01 17:57:00"));
        assert_eq!(image_to_probe.error, Some(0.5));

        let mut rebuilt = TransformGraph::new();
        rebuilt
            .load_coordinate_definitions(&reloaded.coordinate_definitions)
            .unwrap();
        let (a, _) = graph.get_transform("Reference", "Image").unwrap();
        let (b, _) = rebuilt.get_transform("Reference", "Image").unwrap();
        assert!((a - b).abs().max() < 1e-9);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::f64::consts::PI;

    use contracts::{
        translation_matrix, FrameList, FrameTransform, ImageData, NavError, TimestampedFrame,
        TransformName, TransformStatus,
    };
    use observability::CalibrationMetricsAggregator;
    use temporal_calibration::{TemporalCalibration, TemporalCalibrationConfig};
    use transform_graph::{GraphTransformResolver, TransformGraph};

    const WIDTH: u32 = 48;
    const HEIGHT: u32 = 96;

    /// Tracker frame with the probe and reference tools seen by the tracker
    fn tracker_frame(t: f64, probe_depth: f64) -> TimestampedFrame {
        TimestampedFrame::tracking(
            t,
            vec![
                FrameTransform::new(
                    TransformName::parse("ProbeToTracker").unwrap(),
                    translation_matrix(0.0, 0.0, probe_depth),
                    TransformStatus::Valid,
                ),
                FrameTransform::new(
                    TransformName::parse("ReferenceToTracker").unwrap(),
                    translation_matrix(10.0, 0.0, 0.0),
                    TransformStatus::Valid,
                ),
            ],
        )
    }

    /// Video frame with a horizontal bright band centred on `row`
    fn band_frame(t: f64, row: f64) -> TimestampedFrame {
        let mut data = vec![0u8; (WIDTH * HEIGHT) as usize];
        for y in 0..HEIGHT as usize {
            let value = (200.0 * (1.0 - (y as f64 - row).abs() / 2.0).max(0.0)).round() as u8;
            data[y * WIDTH as usize..(y + 1) * WIDTH as usize].fill(value);
        }
        TimestampedFrame::image(t, ImageData::gray8(WIDTH, HEIGHT, data))
    }

    fn tracker_frames() -> FrameList {
        (0..=500)
            .map(|i| {
                let t = i as f64 / 50.0;
                tracker_frame(t, 100.0 + 5.0 * (PI * t).sin())
            })
            .collect()
    }

    fn video_frames(lag: f64) -> FrameList {
        (0..=300)
            .map(|i| {
                let t = i as f64 / 30.0;
                band_frame(t, 48.0 + 20.0 * (PI * (t + lag)).sin())
            })
            .collect()
    }

    #[test]
    fn test_calibration_through_graph_resolver() {
        let tracker = tracker_frames();
        let video = video_frames(0.2);

        let mut base = TransformGraph::new();
        base.set_transform("Image", "Probe", Some(translation_matrix(1.0, 0.0, 0.0)), None)
            .unwrap();

        let mut engine = TemporalCalibration::new(TemporalCalibrationConfig {
            max_tracker_lag_sec: 0.5,
            ..Default::default()
        })
        .with_resolver(GraphTransformResolver::with_base(base));
        engine.set_tracker_frames(&tracker);
        engine.set_video_frames(&video);
        engine.update().unwrap();

        let lag = engine.tracker_lag_sec().unwrap();
        assert!((lag - 0.2).abs() < 0.01, "lag {lag}");

        let report = engine.report().unwrap();
        assert_eq!(report.tracker.skipped_frames, 0);
        assert_eq!(report.video.skipped_frames, 0);
    }

    #[test]
    fn test_frame_transforms_alone_cannot_chain() {
        // Without the graph resolver only ProbeToReference itself (or its
        // inverse) would be found in the frames
        let tracker = tracker_frames();
        let video = video_frames(0.0);

        let mut engine = TemporalCalibration::default();
        engine.set_tracker_frames(&tracker);
        engine.set_video_frames(&video);
        assert!(matches!(
            engine.update(),
            Err(NavError::InsufficientSignal { .. })
        ));
    }

    #[test]
    fn test_aggregate_repeated_runs() {
        let tracker = tracker_frames();
        let mut aggregator = CalibrationMetricsAggregator::new();

        for lag in [0.1, 0.2] {
            let video = video_frames(lag);
            let mut engine = TemporalCalibration::new(TemporalCalibrationConfig {
                max_tracker_lag_sec: 0.5,
                ..Default::default()
            })
            .with_resolver(GraphTransformResolver::new());
            engine.set_tracker_frames(&tracker);
            engine.set_video_frames(&video);

            let outcome = engine.update().and_then(|_| engine.report().cloned());
            aggregator.update(outcome.as_ref());
        }

        let summary = aggregator.summary();
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.failures, 0);
        assert!((summary.lag_ms.mean - 150.0).abs() < 10.0, "{summary}");
    }
}
