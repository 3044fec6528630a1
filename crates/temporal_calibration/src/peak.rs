//! Intensity peak detection along a scanline.

use contracts::PeakPositionMetric;

/// Maximal run of strictly positive samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// First sample of the run
    pub start: usize,
    /// One past the last sample of the run
    pub end: usize,
    /// Sum of the samples
    pub area: f64,
    /// Largest sample
    pub max: f64,
}

/// Run of strictly positive samples with the largest area.
///
/// Ties keep the earlier run. A run reaching the end of the profile counts.
pub fn find_largest_peak(profile: &[f64]) -> Option<Peak> {
    let mut best: Option<Peak> = None;
    let mut current: Option<Peak> = None;

    // A trailing zero closes a run that reaches the end of the profile
    for (i, v) in profile.iter().copied().chain(std::iter::once(0.0)).enumerate() {
        if v > 0.0 {
            let run = current.get_or_insert(Peak {
                start: i,
                end: i,
                area: 0.0,
                max: f64::NEG_INFINITY,
            });
            run.end = i + 1;
            run.area += v;
            run.max = run.max.max(v);
        } else if let Some(run) = current.take() {
            if best.map_or(true, |b| run.area > b.area) {
                best = Some(run);
            }
        }
    }

    best
}

/// Sub-pixel position of `peak` within `profile`
pub fn peak_position(profile: &[f64], peak: &Peak, metric: PeakPositionMetric) -> Option<f64> {
    let run = profile.get(peak.start..peak.end)?;
    if run.is_empty() {
        return None;
    }

    match metric {
        PeakPositionMetric::Centroid => {
            let (weighted, total) = run
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(weighted, total), (offset, &v)| {
                    (weighted + (peak.start + offset) as f64 * v, total + v)
                });
            (total > 0.0).then(|| weighted / total)
        }
        PeakPositionMetric::HalfMaxRisingEdge => {
            let half = 0.5 * peak.max;
            let offset = run.iter().position(|&v| v > half)?;
            let i = peak.start + offset;
            if i == 0 {
                return Some(0.0);
            }
            let (v0, v1) = (profile[i - 1], profile[i]);
            Some((i - 1) as f64 + (half - v0) / (v1 - v0))
        }
    }
}
