// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Edge-based routing core: shortest paths and weight matrices between locations
//! snapped onto the edges of a road graph.
//!
//! Locations are [resolved](ResolveAlgorithm) onto the closest suitable edge of a [Graph],
//! becoming [RouterPoints](RouterPoint) - an edge and an offset along it. Searches
//! ([Dijkstra], [OneToMany]) start and end in the middle of edges and produce [EdgePaths](EdgePath),
//! with weights computed by a pluggable [WeightHandler]. [WeightMatrixAlgorithm] combines
//! all of that into a matrix between many locations, leaving out those which can't be routed.
//!
//! All algorithms are single-use: construct, [run](Algorithm::run) once, then query the results.
//!
//! # Example
//!
//! ```
//! use edgeroute::{
//!     Algorithm, Coordinate, DefaultWeightHandler, Direction, EdgeIndex, Factor, Graph,
//!     GraphRouter, MassResolvingAlgorithm, ResolveOptions, WeightMatrixAlgorithm,
//! };
//!
//! let mut g = Graph::new();
//! let a = g.add_vertex(52.2297, 21.0122);
//! let b = g.add_vertex(52.2310, 21.0140);
//! let c = g.add_vertex(52.2322, 21.0105);
//! g.add_edge(a, b, 0, vec![]);
//! g.add_edge(b, c, 0, vec![]);
//!
//! let index = EdgeIndex::build(&g);
//! let handler = DefaultWeightHandler::new(|_| Factor::new(1.0, Direction::Both));
//! let locations = [
//!     Coordinate { lat: 52.2298, lon: 21.0124 },
//!     Coordinate { lat: 52.2320, lon: 21.0108 },
//! ];
//!
//! let resolver = MassResolvingAlgorithm::new(&g, &index, &handler, &locations, ResolveOptions::default());
//! let router = GraphRouter::new(&g);
//! let mut matrix = WeightMatrixAlgorithm::new(&router, &handler, resolver);
//! matrix.run()?;
//!
//! println!("Weights: {:?}", matrix.weights()?);
//! # Ok::<(), edgeroute::Error>(())
//! ```

/// Asserts that two floats are close: within `eps`, or within 0.1% of `b`
/// (but at least 0.001) when no `eps` is given.
#[cfg(test)]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr) => {
        assert_almost_eq!($a, $b, 1e-3 * (($b) as f64).abs().max(1.0))
    };
    ($a:expr, $b:expr, $eps:expr) => {
        assert!(
            ((($a) as f64 - ($b) as f64).abs() <= ($eps) as f64),
            "assertion failed: {} ≈ {}",
            $a,
            $b
        )
    };
}

mod algorithm;
mod distance;
mod error;
mod graph;
mod kd;
mod matrix;
mod path;
mod resolve;
mod router_point;
mod search;
mod weights;

pub use algorithm::{Algorithm, RunState};
pub use distance::{earth_distance, is_valid_coordinate, BoundingBox};
pub use error::Error;
pub use graph::{EdgeRef, Graph};
pub use kd::{EdgeIndex, SpatialIndex, DEFAULT_SAMPLE_SPACING};
pub use matrix::{shrink_list, shrink_matrix, GraphRouter, WeightMatrixAlgorithm, WeightRouter};
pub use path::{DirectedEdgeId, EdgePath, Iter as EdgePathIter};
pub use resolve::{
    MassResolver, MassResolvingAlgorithm, ResolveAlgorithm, ResolveOptions,
    DEFAULT_MAX_EDGE_DISTANCE, DEFAULT_SEARCH_OFFSET,
};
pub use router_point::{RouterPoint, RouterPointError, RouterPointErrorCode, MAX_OFFSET};
pub use search::{Dijkstra, OneToMany};
pub use weights::{
    AugmentedWeightHandler, DefaultWeightHandler, Direction, Factor, ProfileMetric, Weight,
    WeightHandler, DEFAULT_SPEED_FACTOR,
};

/// Identifier of a vertex of a [Graph].
pub type VertexId = u32;

/// Identifier of an edge of a [Graph].
pub type EdgeId = u32;

/// Marks the absence of a vertex, e.g. the end of an [EdgePath] in the middle of an edge.
pub const NO_VERTEX: VertexId = u32::MAX;

/// Marks the absence of an edge.
pub const NO_EDGE: EdgeId = u32::MAX;

/// A position on Earth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f32,
    pub lon: f32,
}
