//! Robust 2D line fitting through the per-scanline peak positions.

use contracts::LineFitConfig;
use nalgebra::{Matrix2, Point2, SymmetricEigen, Vector2};

use crate::ransac::{ransac, Estimator, RansacOptions};

/// `|direction.x|` below which a line counts as vertical
pub const NEAR_VERTICAL_DIRECTION_X: f64 = 0.01;

/// Line through `point` with unit `normal`
///
/// The direction `(-normal.y, normal.x)` always points towards +x (or +y for a
/// vertical line).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineModel {
    pub normal: Vector2<f64>,
    pub point: Point2<f64>,
}

impl LineModel {
    /// Build from a (not necessarily unit) normal
    pub fn from_normal(normal: Vector2<f64>, point: Point2<f64>) -> Option<Self> {
        let norm = normal.norm();
        if !norm.is_finite() || norm < 1e-12 {
            return None;
        }
        let mut normal = normal / norm;
        let direction = Vector2::new(-normal.y, normal.x);
        if direction.x < 0.0 || (direction.x == 0.0 && direction.y < 0.0) {
            normal = -normal;
        }
        Some(Self { normal, point })
    }

    /// Line through two distinct points
    pub fn through(a: Point2<f64>, b: Point2<f64>) -> Option<Self> {
        let d = b - a;
        Self::from_normal(Vector2::new(d.y, -d.x), a)
    }

    /// Unit direction
    pub fn direction(&self) -> Vector2<f64> {
        Vector2::new(-self.normal.y, self.normal.x)
    }

    /// Perpendicular distance of `p` to the line
    pub fn distance(&self, p: &Point2<f64>) -> f64 {
        self.normal.dot(&(p.coords - self.point.coords)).abs()
    }

    /// y where the line crosses column `x`; `None` for near-vertical lines
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let r = self.direction();
        if r.x.abs() < NEAR_VERTICAL_DIRECTION_X {
            return None;
        }
        let t = (x - self.point.x) / r.x;
        Some(self.point.y + t * r.y)
    }
}

/// Accepted line fit
#[derive(Debug, Clone)]
pub struct LineFit {
    pub model: LineModel,
    /// Indices of the points within the inlier distance
    pub inliers: Vec<usize>,
    pub inlier_rms: f64,
}

/// Total least squares fit: the normal is the eigenvector of the smallest
/// eigenvalue of the point scatter matrix.
pub fn fit_line(points: &[Point2<f64>]) -> Option<LineModel> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let centroid = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords)
        / n;

    let scatter = points.iter().fold(Matrix2::zeros(), |acc, p| {
        let d = p.coords - centroid;
        acc + d * d.transpose()
    });

    let eigen = SymmetricEigen::new(scatter);
    if eigen.eigenvalues.max() < 1e-12 {
        // All points coincide
        return None;
    }
    let smallest = eigen.eigenvalues.imin();
    let normal: Vector2<f64> = eigen.eigenvectors.column(smallest).into_owned();
    LineModel::from_normal(normal, Point2::from(centroid))
}

struct LineEstimator;

impl Estimator for LineEstimator {
    type Datum = Point2<f64>;
    type Model = LineModel;

    const MIN_SAMPLES: usize = 2;

    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
        LineModel::through(data[sample_indices[0]], data[sample_indices[1]])
    }

    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
        model.distance(datum)
    }

    fn is_degenerate(data: &[Self::Datum], sample_indices: &[usize]) -> bool {
        (data[sample_indices[0]] - data[sample_indices[1]]).norm() < 1e-9
    }

    fn refit(data: &[Self::Datum], inliers: &[usize]) -> Option<Self::Model> {
        let points: Vec<Point2<f64>> = inliers.iter().map(|&i| data[i]).collect();
        fit_line(&points)
    }
}

/// RANSAC line fit, each consensus set refit by total least squares.
///
/// Falls back to a plain total least squares fit over every point when no
/// sample gathers a consensus.
pub fn fit_line_ransac(points: &[Point2<f64>], config: &LineFitConfig) -> Option<LineFit> {
    let opts = RansacOptions {
        max_iters: config.max_iterations,
        thresh: config.inlier_distance_px,
        min_inliers: LineEstimator::MIN_SAMPLES,
        confidence: config.confidence,
        seed: config.seed,
        refit_on_inliers: true,
    };

    let result = ransac::<LineEstimator>(points, &opts);
    if let Some(model) = result.model {
        return Some(LineFit {
            model,
            inliers: result.inliers,
            inlier_rms: result.inlier_rms,
        });
    }

    let model = fit_line(points)?;
    let residuals: Vec<f64> = points.iter().map(|p| model.distance(p)).collect();
    let inlier_rms =
        (residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64).sqrt();
    Some(LineFit {
        model,
        inliers: (0..points.len()).collect(),
        inlier_rms,
    })
}
