//! Model-agnostic RANSAC.
//!
//! Implement [`Estimator`] for a model and call [`ransac`]. The loop draws
//! minimal samples from a seeded RNG, so a given input and seed always give
//! the same consensus set.

use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, SeedableRng};

/// RANSAC loop parameters
#[derive(Debug, Clone)]
pub struct RansacOptions {
    /// Iteration cap
    pub max_iters: usize,
    /// Largest residual counted as inlier
    pub thresh: f64,
    /// Consensus sets smaller than this are rejected
    pub min_inliers: usize,
    /// Probability in `[0, 1]` of drawing one outlier-free sample; shortens the loop
    pub confidence: f64,
    pub seed: u64,
    /// Refit each accepted model on its inliers and rescore it
    pub refit_on_inliers: bool,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            thresh: 0.5,
            min_inliers: 2,
            confidence: 0.999,
            seed: 1_234_567,
            refit_on_inliers: true,
        }
    }
}

/// Best consensus found
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// `None` when no sample reached `min_inliers`
    pub model: Option<M>,
    pub inliers: Vec<usize>,
    /// Root-mean-square residual over the inliers
    pub inlier_rms: f64,
    /// Iterations run
    pub iters: usize,
}

impl<M> Default for RansacResult<M> {
    fn default() -> Self {
        Self {
            model: None,
            inliers: Vec::new(),
            inlier_rms: f64::INFINITY,
            iters: 0,
        }
    }
}

/// A model RANSAC can fit
pub trait Estimator {
    type Datum;
    type Model;

    /// Samples needed to fit one model
    const MIN_SAMPLES: usize;

    /// Fit from the samples at `sample_indices`; `None` if degenerate
    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Non-negative error of one datum, same unit as `RansacOptions::thresh`
    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64;

    fn is_degenerate(_data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }

    /// Fit on a whole inlier set; `None` keeps the sampled model
    fn refit(_data: &[Self::Datum], _inliers: &[usize]) -> Option<Self::Model> {
        None
    }
}

fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::INFINITY;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Iterations needed to reach `confidence` at the observed inlier ratio
fn required_iterations(
    confidence: f64,
    inlier_ratio: f64,
    min_samples: usize,
    iters_so_far: usize,
    max_iters: usize,
) -> usize {
    if confidence <= 0.0 || inlier_ratio <= 0.0 {
        return max_iters;
    }
    let outlier_sample = (1.0 - inlier_ratio.powi(min_samples as i32)).max(1e-12).ln();
    if outlier_sample >= 0.0 {
        return max_iters;
    }
    let needed = ((1.0 - confidence).max(1e-12).ln() / outlier_sample).ceil() as usize;
    needed.clamp(iters_so_far, max_iters)
}

fn score<E: Estimator>(
    data: &[E::Datum],
    model: &E::Model,
    thresh: f64,
    inliers: &mut Vec<usize>,
    residuals: &mut Vec<f64>,
) {
    inliers.clear();
    residuals.clear();
    for (i, datum) in data.iter().enumerate() {
        let r = E::residual(model, datum);
        if r <= thresh {
            inliers.push(i);
            residuals.push(r);
        }
    }
}

/// Run RANSAC over `data`.
///
/// Models are ranked by inlier count, then by inlier RMS.
pub fn ransac<E: Estimator>(data: &[E::Datum], opts: &RansacOptions) -> RansacResult<E::Model> {
    let mut best = RansacResult::default();
    if data.len() < E::MIN_SAMPLES {
        return best;
    }

    let all_indices: Vec<usize> = (0..data.len()).collect();
    let mut sample = Vec::with_capacity(E::MIN_SAMPLES);
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut inliers = Vec::with_capacity(data.len());
    let mut residuals = Vec::with_capacity(data.len());

    let mut budget = opts.max_iters;
    let mut iters = 0;
    while iters < budget {
        iters += 1;

        sample.clear();
        sample.extend(all_indices.choose_multiple(&mut rng, E::MIN_SAMPLES).copied());
        if E::is_degenerate(data, &sample) {
            continue;
        }
        let Some(mut model) = E::fit(data, &sample) else {
            continue;
        };

        score::<E>(data, &model, opts.thresh, &mut inliers, &mut residuals);
        if inliers.len() < opts.min_inliers {
            continue;
        }

        if opts.refit_on_inliers {
            if let Some(refit) = E::refit(data, &inliers) {
                model = refit;
                score::<E>(data, &model, opts.thresh, &mut inliers, &mut residuals);
                if inliers.len() < opts.min_inliers {
                    continue;
                }
            }
        }

        let inlier_rms = rms(&residuals);
        let better = best.model.is_none()
            || inliers.len() > best.inliers.len()
            || (inliers.len() == best.inliers.len() && inlier_rms < best.inlier_rms);
        if better {
            best.model = Some(model);
            best.inliers.clone_from(&inliers);
            best.inlier_rms = inlier_rms;
        }

        let ratio = best.inliers.len() as f64 / data.len() as f64;
        budget = required_iterations(opts.confidence, ratio, E::MIN_SAMPLES, iters, opts.max_iters);
    }

    best.iters = iters;
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `y = slope * x + intercept`
    struct SlopeEstimator;

    impl Estimator for SlopeEstimator {
        type Datum = (f64, f64);
        type Model = (f64, f64);

        const MIN_SAMPLES: usize = 2;

        fn fit(data: &[Self::Datum], idx: &[usize]) -> Option<Self::Model> {
            let (p0, p1) = (data[idx[0]], data[idx[1]]);
            let dx = p1.0 - p0.0;
            if dx.abs() < 1e-9 {
                return None;
            }
            let slope = (p1.1 - p0.1) / dx;
            Some((slope, p0.1 - slope * p0.0))
        }

        fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
            (model.0 * datum.0 + model.1 - datum.1).abs()
        }
    }

    #[test]
    fn test_too_few_samples() {
        let result = ransac::<SlopeEstimator>(&[(0.0, 0.0)], &RansacOptions::default());
        assert!(result.model.is_none());
        assert_eq!(result.iters, 0);
    }

    #[test]
    fn test_rejects_outliers() {
        let mut data: Vec<(f64, f64)> = (0..12).map(|i| (i as f64, 0.5 * i as f64 + 2.0)).collect();
        data.push((3.0, 40.0));
        data.push((7.0, -25.0));

        let result = ransac::<SlopeEstimator>(&data, &RansacOptions::default());
        let (slope, intercept) = result.model.unwrap();
        assert!((slope - 0.5).abs() < 1e-9);
        assert!((intercept - 2.0).abs() < 1e-9);
        assert_eq!(result.inliers.len(), 12);
    }

    #[test]
    fn test_seeded_runs_agree() {
        let data: Vec<(f64, f64)> = (0..30)
            .map(|i| (i as f64, if i % 5 == 0 { 100.0 } else { i as f64 }))
            .collect();
        let opts = RansacOptions::default();
        let a = ransac::<SlopeEstimator>(&data, &opts);
        let b = ransac::<SlopeEstimator>(&data, &opts);
        assert_eq!(a.inliers, b.inliers);
        assert_eq!(a.iters, b.iters);
    }
}
