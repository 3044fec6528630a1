//! # Observability
//!
//! Tracing and Prometheus metrics for the usnav crates.
//!
//! ## Features
//!
//! - Tracing initialisation (JSON / Pretty / Compact), usnav crates at the
//!   requested level and everything else at `warn`
//! - In-process Prometheus recorder rendered on demand, for one-shot runs
//! - Calibration metrics recording and aggregation
//!
//! ## Example
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! let observability = init_with_config(&ObservabilityConfig {
//!     record_metrics: true,
//!     ..Default::default()
//! })?;
//!
//! engine.update()?;
//! metrics::record_calibration_report(engine.report()?);
//!
//! if let Some(text) = observability.render_metrics() {
//!     eprintln!("{text}");
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_calibration_failure, record_calibration_report, record_transform_lookup,
    CalibrationMetricsAggregator, MetricsSummary, RunningStats, StatsSummary,
};

/// Value of the `service` label on every metric
pub const SERVICE_LABEL: &str = "usnav";

/// Tracing targets that log at the configured level
pub const LOG_TARGETS: &[&str] = &[
    "usnav",
    "contracts",
    "config_loader",
    "transform_graph",
    "temporal_calibration",
    "observability",
];

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub log_format: LogFormat,
    /// Level of the usnav crates when `RUST_LOG` is not set
    pub log_level: String,
    /// Keep metrics in memory for [`Observability::render_metrics`]
    pub record_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            log_level: "info".to_string(),
            record_metrics: false,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// Structured JSON
    #[default]
    Json,
    /// Human readable, multi-line
    Pretty,
    /// Single line
    Compact,
}

/// Handle kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct Observability {
    metrics: Option<PrometheusHandle>,
}

impl Observability {
    /// Prometheus text exposition of everything recorded so far, if
    /// recording was enabled
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(PrometheusHandle::render)
    }
}

/// `EnvFilter` directives: `warn` globally, `level` for [`LOG_TARGETS`]
pub fn default_filter(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .fold(String::from("warn"), |mut directives, target| {
            directives.push_str(&format!(",{target}={level}"));
            directives
        })
}

/// Install the tracing subscriber and, when requested, the metrics recorder
pub fn init_with_config(config: &ObservabilityConfig) -> Result<Observability> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(&config.log_level))
            .with_context(|| format!("Invalid log level '{}'", config.log_level))?,
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    let metrics = if config.record_metrics {
        let handle = prometheus_builder()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    tracing::debug!(
        log_format = ?config.log_format,
        log_level = %config.log_level,
        record_metrics = config.record_metrics,
        "Observability initialized"
    );

    Ok(Observability { metrics })
}

fn prometheus_builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .add_global_label("service", SERVICE_LABEL)
        .add_global_label("version", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CalibrationReport, StreamSummary};

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(!config.record_metrics);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_default_filter_targets_usnav_crates() {
        let directives = default_filter("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("temporal_calibration=debug"));
        assert!(directives.contains("usnav=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn test_rendered_metrics_carry_global_labels() {
        let recorder = prometheus_builder().build_recorder();
        let handle = recorder.handle();

        let report = CalibrationReport {
            tracker_lag_sec: 0.2,
            best_correlation: 10.0,
            correlation: vec![10.0],
            sampling_resolution_sec: 0.001,
            max_tracker_lag_sec: 0.5,
            overlap_sec: (0.0, 10.0),
            tracker: StreamSummary::default(),
            video: StreamSummary::default(),
            discarded_scanlines: 0,
        };
        ::metrics::with_local_recorder(&recorder, || record_calibration_report(&report));

        let text = handle.render();
        assert!(text.contains("usnav_calibration_lag_ms"), "{text}");
        assert!(text.contains("service=\"usnav\""), "{text}");
    }

    #[test]
    fn test_render_disabled_without_recorder() {
        assert!(Observability::default().render_metrics().is_none());
    }
}
