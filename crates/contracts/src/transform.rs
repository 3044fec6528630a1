//! Transform naming and rigid matrix helpers.
//!
//! A transform is named `<From>To<To>`, e.g. `ProbeToReference` maps points
//! expressed in the `Probe` frame into the `Reference` frame.

use std::fmt;
use std::str::FromStr;

use nalgebra::Matrix4;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{FrameName, NavError};

/// Row-major 4x4 matrix as it appears in configuration and sequence files
pub type MatrixRows = [[f64; 4]; 4];

/// Validity of a transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStatus {
    #[default]
    Valid,
    Invalid,
}

impl TransformStatus {
    #[inline]
    pub fn is_valid(self) -> bool {
        self == TransformStatus::Valid
    }

    /// Logical AND of two statuses
    #[inline]
    pub fn and(self, other: TransformStatus) -> TransformStatus {
        if self.is_valid() && other.is_valid() {
            TransformStatus::Valid
        } else {
            TransformStatus::Invalid
        }
    }
}

impl From<bool> for TransformStatus {
    fn from(valid: bool) -> Self {
        if valid {
            TransformStatus::Valid
        } else {
            TransformStatus::Invalid
        }
    }
}

/// Directed `(from, to)` pair of coordinate frames
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformName {
    from: FrameName,
    to: FrameName,
}

impl TransformName {
    /// Build a name from two frame names
    ///
    /// # Errors
    /// `InvalidArgument` if either name is empty.
    pub fn new(from: impl Into<FrameName>, to: impl Into<FrameName>) -> Result<Self, NavError> {
        let from = from.into();
        let to = to.into();
        if from.is_empty() {
            return Err(NavError::invalid_argument("'from' coordinate frame name is empty"));
        }
        if to.is_empty() {
            return Err(NavError::invalid_argument("'to' coordinate frame name is empty"));
        }
        Ok(Self { from, to })
    }

    /// Build from names known to be non-empty
    pub(crate) fn from_static(from: &'static str, to: &'static str) -> Self {
        Self {
            from: FrameName::from(from),
            to: FrameName::from(to),
        }
    }

    /// Parse a `<From>To<To>` string.
    ///
    /// The split point is the only `To` that has a non-empty prefix and is
    /// followed by an upper-case letter.
    pub fn parse(name: &str) -> Result<Self, NavError> {
        let candidates: Vec<usize> = name
            .match_indices("To")
            .map(|(idx, _)| idx)
            .filter(|&idx| {
                idx > 0
                    && name[idx + 2..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_uppercase())
            })
            .collect();

        match candidates.as_slice() {
            [idx] => Self::new(&name[..*idx], &name[idx + 2..]),
            [] => Err(NavError::invalid_argument(format!(
                "transform name '{name}' has no <From>To<To> separator"
            ))),
            _ => Err(NavError::invalid_argument(format!(
                "transform name '{name}' is ambiguous, it has {} <From>To<To> separators",
                candidates.len()
            ))),
        }
    }

    pub fn from(&self) -> &FrameName {
        &self.from
    }

    pub fn to(&self) -> &FrameName {
        &self.to
    }

    /// The reverse direction (`ToToFrom`)
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for TransformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}To{}", self.from, self.to)
    }
}

impl FromStr for TransformName {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TransformName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransformName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A named transform carried by a tracking frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransform {
    pub name: TransformName,
    pub matrix: Matrix4<f64>,
    pub status: TransformStatus,
}

impl FrameTransform {
    pub fn new(name: TransformName, matrix: Matrix4<f64>, status: TransformStatus) -> Self {
        Self {
            name,
            matrix,
            status,
        }
    }
}

/// Euclidean length of the translation column
pub fn translation_distance(matrix: &Matrix4<f64>) -> f64 {
    let t = matrix.fixed_view::<3, 1>(0, 3);
    (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt()
}

/// Build a matrix from row-major rows
pub fn matrix_from_rows(rows: &MatrixRows) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| rows[r][c])
}

/// Export a matrix as row-major rows
pub fn matrix_to_rows(matrix: &Matrix4<f64>) -> MatrixRows {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = matrix[(r, c)];
        }
    }
    rows
}

/// Pure translation matrix
pub fn translation_matrix(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m[(0, 3)] = x;
    m[(1, 3)] = y;
    m[(2, 3)] = z;
    m
}
