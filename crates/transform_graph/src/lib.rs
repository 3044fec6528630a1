//! # Transform Graph
//!
//! Directed graph of rigid transforms between named coordinate frames.
//!
//! Every user-set edge `A -> B` is paired with a computed inverse `B -> A`.
//! Transforms without a direct edge are resolved by chaining edges along the
//! first path found by a depth-first search.
//!
//! # Example
//!
//! ```
//! use contracts::translation_matrix;
//! use transform_graph::TransformGraph;
//!
//! let mut graph = TransformGraph::new();
//! graph
//!     .set_transform("Image", "Probe", Some(translation_matrix(1.0, 0.0, 0.0)), None)
//!     .unwrap();
//! graph
//!     .set_transform("Probe", "Reference", Some(translation_matrix(0.0, 1.0, 0.0)), None)
//!     .unwrap();
//!
//! let (m, status) = graph.get_transform("Image", "Reference").unwrap();
//! assert!(status.is_valid());
//! assert_eq!((m[(0, 3)], m[(1, 3)]), (1.0, 1.0));
//! ```

mod edge;
mod graph;
mod resolver;

pub use edge::TransformEdge;
pub use graph::TransformGraph;
pub use resolver::GraphTransformResolver;
