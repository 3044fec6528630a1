//! Position metric: one scalar per frame, used to register the two streams in time.

use contracts::{NavError, SignalStage, MIN_SIGNAL_PEAK_TO_PEAK};

/// Time series with strictly increasing timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionMetric {
    timestamps: Vec<f64>,
    values: Vec<f64>,
    out_of_order: usize,
}

impl PositionMetric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            out_of_order: 0,
        }
    }

    /// Append a sample.
    ///
    /// Returns `false` (and counts the sample) when `timestamp` does not
    /// increase past the previous one or either value is not finite.
    pub fn push(&mut self, timestamp: f64, value: f64) -> bool {
        let increasing = self.timestamps.last().map_or(true, |&last| timestamp > last);
        if !increasing || !timestamp.is_finite() || !value.is_finite() {
            self.out_of_order += 1;
            return false;
        }
        self.timestamps.push(timestamp);
        self.values.push(value);
        true
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Samples rejected by [`push`](Self::push)
    pub fn out_of_order(&self) -> usize {
        self.out_of_order
    }

    /// First and last timestamp
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }

    /// Piecewise-linear value at `t`, clamped to the end samples.
    ///
    /// Straddling samples closer than `epsilon` are not interpolated; the
    /// later sample's value is used.
    pub fn interpolate(&self, t: f64, epsilon: f64) -> Option<f64> {
        let upper = self.timestamps.partition_point(|&ts| ts < t);
        if upper == 0 {
            return self.values.first().copied();
        }
        if upper == self.len() {
            return self.values.last().copied();
        }

        let lower = upper - 1;
        let (t0, t1) = (self.timestamps[lower], self.timestamps[upper]);
        let (v0, v1) = (self.values[lower], self.values[upper]);
        if t1 - t0 < epsilon {
            return Some(v1);
        }
        Some(v0 + (v1 - v0) * (t - t0) / (t1 - t0))
    }
}

impl FromIterator<(f64, f64)> for PositionMetric {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let mut metric = PositionMetric::new();
        for (t, v) in iter {
            metric.push(t, v);
        }
        metric
    }
}

/// Shift to zero mean and scale to unit peak-to-peak.
///
/// # Errors
/// `InsufficientSignal` for an empty metric or one whose peak-to-peak swing
/// is below [`MIN_SIGNAL_PEAK_TO_PEAK`].
pub fn normalize_metric(metric: &mut PositionMetric, stage: SignalStage) -> Result<(), NavError> {
    if metric.is_empty() {
        return Err(NavError::insufficient_signal(stage, "no position samples"));
    }

    let mean = metric.values.iter().sum::<f64>() / metric.len() as f64;
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in &mut metric.values {
        *v -= mean;
        min = min.min(*v);
        max = max.max(*v);
    }

    let peak_to_peak = max.abs() + min.abs();
    if peak_to_peak < MIN_SIGNAL_PEAK_TO_PEAK {
        return Err(NavError::insufficient_signal(
            stage,
            format!(
                "peak-to-peak {peak_to_peak:.6} is below {MIN_SIGNAL_PEAK_TO_PEAK}, the position does not vary enough"
            ),
        ));
    }

    for v in &mut metric.values {
        *v /= peak_to_peak;
    }
    Ok(())
}
