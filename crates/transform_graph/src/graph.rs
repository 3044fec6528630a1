//! Transform graph storage and path resolution.
//!
//! Edges live in a slab arena; each frame node keeps the keys of its outgoing
//! edges in insertion order, which fixes the order the path search visits them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use contracts::{
    matrix_from_rows, matrix_to_rows, CoordinateDefinitions, FrameName, NavError,
    TimestampedFrame, TransformDefinition, TransformName, TransformStatus,
};
use nalgebra::Matrix4;
use slab::Slab;
use tracing::{debug, instrument, trace, warn};

use crate::TransformEdge;

#[derive(Debug, Clone)]
struct EdgeEntry {
    name: TransformName,
    edge: TransformEdge,
}

#[derive(Debug, Clone, Default)]
struct FrameNode {
    /// Slab keys of outgoing edges, in insertion order
    outgoing: Vec<usize>,
}

/// Graph of rigid transforms between named coordinate frames
///
/// Not internally synchronised; wrap it in a mutex to share it between threads.
#[derive(Debug, Clone, Default)]
pub struct TransformGraph {
    edges: Slab<EdgeEntry>,
    nodes: HashMap<FrameName, FrameNode>,
    /// Frames in the order they first appeared
    frame_order: Vec<FrameName>,
    lookup: HashMap<(FrameName, FrameName), usize>,
}

impl TransformGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `from -> to` transform.
    ///
    /// `None` keeps the current matrix or status (identity and `Valid` for a
    /// new edge). The inverse `to -> from` edge is kept in sync.
    ///
    /// # Errors
    /// - `InvalidArgument`: empty frame name, `from == to`, or a matrix that
    ///   cannot be inverted
    /// - `ComputedEdgeConflict`: `to -> from` was set by the user
    pub fn set_transform(
        &mut self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
        matrix: Option<Matrix4<f64>>,
        status: Option<TransformStatus>,
    ) -> Result<(), NavError> {
        let name = edge_name(from, to)?;
        self.set_named(&name, matrix, status)
    }

    /// Change only the status of the `from -> to` transform
    pub fn set_transform_status(
        &mut self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
        status: TransformStatus,
    ) -> Result<(), NavError> {
        self.set_transform(from, to, None, Some(status))
    }

    fn set_named(
        &mut self,
        name: &TransformName,
        matrix: Option<Matrix4<f64>>,
        status: Option<TransformStatus>,
    ) -> Result<(), NavError> {
        check_distinct(name)?;
        let inverse = matrix.map(|m| invert(&m, name)).transpose()?;

        match self.key_of(name) {
            Some(key) => {
                let forward = &mut self.edges[key].edge;
                if forward.computed {
                    return Err(conflict(name));
                }
                if let Some(m) = matrix {
                    forward.matrix = m;
                }
                if let Some(s) = status {
                    forward.status = s;
                }
                let status = forward.status;

                match self.key_of(&name.inverse()) {
                    Some(inverse_key) => {
                        let backward = &mut self.edges[inverse_key].edge;
                        if let Some(inv) = inverse {
                            backward.matrix = inv;
                        }
                        backward.status = status;
                    }
                    None => {
                        warn!(transform = %name, "computed inverse missing, rebuilding it");
                        let m = self.edges[key].edge.matrix;
                        let inv = invert(&m, name)?;
                        self.insert_edge(name.inverse(), TransformEdge::computed(inv, status));
                    }
                }
                trace!(transform = %name, ?status, "updated transform");
            }
            None => {
                let status = status.unwrap_or_default();
                let matrix = matrix.unwrap_or_else(Matrix4::identity);
                let inverse = inverse.unwrap_or_else(Matrix4::identity);
                self.insert_edge(name.clone(), TransformEdge::original(matrix, status));
                self.insert_edge(name.inverse(), TransformEdge::computed(inverse, status));
                debug!(transform = %name, ?status, "added transform");
            }
        }
        Ok(())
    }

    fn insert_edge(&mut self, name: TransformName, edge: TransformEdge) {
        let from = name.from().clone();
        let to = name.to().clone();
        let key = self.edges.insert(EdgeEntry { name, edge });
        self.node_mut(&from).outgoing.push(key);
        self.node_mut(&to);
        self.lookup.insert((from, to), key);
    }

    fn node_mut(&mut self, frame: &FrameName) -> &mut FrameNode {
        if !self.nodes.contains_key(frame) {
            self.frame_order.push(frame.clone());
        }
        self.nodes.entry(frame.clone()).or_default()
    }

    fn key_of(&self, name: &TransformName) -> Option<usize> {
        self.lookup
            .get(&(name.from().clone(), name.to().clone()))
            .copied()
    }

    /// Matrix and status of `from -> to`, direct or chained along a path.
    ///
    /// # Errors
    /// - `InvalidArgument`: empty frame name or `from == to`
    /// - `NotFound`: unknown frame or no path
    pub fn get_transform(
        &self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
    ) -> Result<(Matrix4<f64>, TransformStatus), NavError> {
        let name = edge_name(from, to)?;
        self.resolve(&name)
    }

    /// Status of `from -> to`; AND of every edge status along the path
    pub fn get_transform_status(
        &self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
    ) -> Result<TransformStatus, NavError> {
        self.get_transform(from, to).map(|(_, status)| status)
    }

    /// Whether `from -> to` can be resolved, directly or through a path
    pub fn is_existing_transform(
        &self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
    ) -> bool {
        edge_name(from, to)
            .and_then(|name| self.path_keys(&name))
            .is_ok()
    }

    #[instrument(level = "trace", skip(self, name), fields(transform = %name))]
    pub(crate) fn resolve(
        &self,
        name: &TransformName,
    ) -> Result<(Matrix4<f64>, TransformStatus), NavError> {
        check_distinct(name)?;
        let path = self.path_keys(name)?;

        let mut matrix = Matrix4::identity();
        let mut status = TransformStatus::Valid;
        for key in &path {
            let edge = &self.edges[*key].edge;
            matrix = edge.matrix * matrix;
            status = status.and(edge.status);
        }
        trace!(hops = path.len(), ?status, "resolved transform");
        Ok((matrix, status))
    }

    /// Edges chained to resolve `from -> to`, in application order.
    ///
    /// A direct edge is a one-element path. Otherwise the depth-first search
    /// follows outgoing edges in insertion order, taking a direct edge to the
    /// target at every frame before descending further, and returns the first
    /// complete path.
    pub fn find_path(
        &self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
    ) -> Result<Vec<TransformName>, NavError> {
        let name = edge_name(from, to)?;
        Ok(self
            .path_keys(&name)?
            .into_iter()
            .map(|key| self.edges[key].name.clone())
            .collect())
    }

    fn path_keys(&self, name: &TransformName) -> Result<Vec<usize>, NavError> {
        let not_found = || NavError::not_found(name.from().as_str(), name.to().as_str());
        if !self.nodes.contains_key(name.from()) || !self.nodes.contains_key(name.to()) {
            return Err(not_found());
        }

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.search(name.from(), name.to(), &mut visited, &mut path) {
            Ok(path)
        } else {
            Err(not_found())
        }
    }

    fn search<'a>(
        &'a self,
        current: &'a FrameName,
        target: &FrameName,
        visited: &mut HashSet<&'a FrameName>,
        path: &mut Vec<usize>,
    ) -> bool {
        visited.insert(current);
        if let Some(&key) = self.lookup.get(&(current.clone(), target.clone())) {
            path.push(key);
            return true;
        }
        let Some(node) = self.nodes.get(current) else {
            return false;
        };

        for &key in &node.outgoing {
            let next = self.edges[key].name.to();
            if visited.contains(next) {
                continue;
            }
            path.push(key);
            if self.search(next, target, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Direct edge `from -> to`, user-set or computed
    pub fn edge(&self, from: impl Into<FrameName>, to: impl Into<FrameName>) -> Option<&TransformEdge> {
        let name = TransformName::new(from, to).ok()?;
        self.key_of(&name).map(|key| &self.edges[key].edge)
    }

    /// Mark a user-set transform for saving to the coordinate definitions
    pub fn set_transform_persistent(
        &mut self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
        persistent: bool,
    ) -> Result<(), NavError> {
        let name = edge_name(from, to)?;
        self.user_edge_mut(&name)?.persistent = persistent;
        Ok(())
    }

    /// Record the calibration date of a user-set transform
    pub fn set_transform_date(
        &mut self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
        date: impl Into<String>,
    ) -> Result<(), NavError> {
        let name = edge_name(from, to)?;
        self.user_edge_mut(&name)?.date = Some(date.into());
        Ok(())
    }

    /// Record the calibration error of a user-set transform
    pub fn set_transform_error(
        &mut self,
        from: impl Into<FrameName>,
        to: impl Into<FrameName>,
        error: f64,
    ) -> Result<(), NavError> {
        let name = edge_name(from, to)?;
        self.user_edge_mut(&name)?.error = Some(error);
        Ok(())
    }

    fn user_edge_mut(&mut self, name: &TransformName) -> Result<&mut TransformEdge, NavError> {
        let key = self
            .key_of(name)
            .ok_or_else(|| NavError::not_found(name.from().as_str(), name.to().as_str()))?;
        let edge = &mut self.edges[key].edge;
        if edge.computed {
            return Err(conflict(name));
        }
        Ok(edge)
    }

    /// Load every transform carried by a tracking frame.
    ///
    /// Invalid entries are stored with `Invalid` status; their matrix is only
    /// taken when it can be inverted. All entries are attempted, the first
    /// failure is returned.
    pub fn set_transforms_from_frame(&mut self, frame: &TimestampedFrame) -> Result<(), NavError> {
        let mut first_error = None;

        for t in frame.transforms() {
            let usable = t.status.is_valid() || invert(&t.matrix, &t.name).is_ok();
            let matrix = usable.then_some(t.matrix);
            if let Err(e) = self.set_named(&t.name, matrix, Some(t.status)) {
                warn!(transform = %t.name, error = %e, "failed to set transform from frame");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Add the transforms of a configuration tree as user-set edges
    pub fn load_coordinate_definitions(
        &mut self,
        definitions: &CoordinateDefinitions,
    ) -> Result<(), NavError> {
        for def in &definitions.transforms {
            let name = edge_name(def.from.clone(), def.to.clone())?;
            self.set_named(&name, Some(matrix_from_rows(&def.matrix)), Some(def.status))?;

            let edge = self.user_edge_mut(&name)?;
            edge.persistent = def.persistent;
            edge.date = def.date.clone();
            edge.error = def.error;
        }
        debug!(
            count = definitions.transforms.len(),
            "loaded coordinate definitions"
        );
        Ok(())
    }

    /// Persistent user-set transforms, in insertion order
    pub fn coordinate_definitions(&self) -> CoordinateDefinitions {
        let transforms = self
            .edges
            .iter()
            .filter(|(_, entry)| !entry.edge.computed && entry.edge.persistent)
            .map(|(_, entry)| TransformDefinition {
                from: entry.name.from().clone(),
                to: entry.name.to().clone(),
                matrix: matrix_to_rows(&entry.edge.matrix),
                status: entry.edge.status,
                persistent: true,
                date: entry.edge.date.clone(),
                error: entry.edge.error,
            })
            .collect();
        CoordinateDefinitions { transforms }
    }

    /// Known frames, in the order they first appeared
    pub fn frames(&self) -> impl Iterator<Item = &FrameName> {
        self.frame_order.iter()
    }

    /// Number of edges, computed inverses included
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Remove every frame and edge
    pub fn clear(&mut self) {
        self.edges.clear();
        self.nodes.clear();
        self.frame_order.clear();
        self.lookup.clear();
    }
}

impl fmt::Display for TransformGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frame_order {
            let Some(node) = self.nodes.get(frame) else {
                continue;
            };
            writeln!(f, "{frame} coordinate frame transforms:")?;
            for &key in &node.outgoing {
                let entry = &self.edges[key];
                let edge = &entry.edge;
                write!(
                    f,
                    "  To {}: {} ({})",
                    entry.name.to(),
                    if edge.status.is_valid() { "valid" } else { "invalid" },
                    if edge.computed { "computed" } else { "original" },
                )?;
                if edge.persistent {
                    write!(f, " persistent")?;
                }
                writeln!(f)?;
                for r in 0..4 {
                    writeln!(
                        f,
                        "    {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
                        edge.matrix[(r, 0)],
                        edge.matrix[(r, 1)],
                        edge.matrix[(r, 2)],
                        edge.matrix[(r, 3)]
                    )?;
                }
            }
        }
        Ok(())
    }
}

fn edge_name(from: impl Into<FrameName>, to: impl Into<FrameName>) -> Result<TransformName, NavError> {
    let name = TransformName::new(from, to)?;
    check_distinct(&name)?;
    Ok(name)
}

fn check_distinct(name: &TransformName) -> Result<(), NavError> {
    if name.from() == name.to() {
        return Err(NavError::invalid_argument(format!(
            "transform from '{}' to itself",
            name.from()
        )));
    }
    Ok(())
}

fn invert(matrix: &Matrix4<f64>, name: &TransformName) -> Result<Matrix4<f64>, NavError> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(NavError::invalid_argument(format!(
            "{name} matrix has non-finite elements"
        )));
    }
    matrix
        .try_inverse()
        .ok_or_else(|| NavError::invalid_argument(format!("{name} matrix is not invertible")))
}

fn conflict(name: &TransformName) -> NavError {
    NavError::computed_edge_conflict(name.from().as_str(), name.to().as_str())
}
