// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{EdgeId, VertexId};

/// Error conditions caused by misusing the algorithms or the paths they produce.
///
/// Unreachable targets and unroutable points are not errors - they are reported
/// as absent results or as [RouterPointError](crate::RouterPointError) entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Results were queried before the algorithm was run.
    #[error("algorithm has not been run")]
    NotRun,

    /// [Algorithm::run](crate::Algorithm::run) was called a second time.
    #[error("algorithm has already been run")]
    AlreadyRun,

    /// Results were queried from an algorithm which has run, but failed.
    #[error("algorithm did not succeed: {0}")]
    NotSucceeded(String),

    /// No path was found to the target with the given index.
    #[error("no path could be found to target {0}")]
    NoPath(usize),

    /// An index was outside of the valid range.
    #[error("index out of range: {index} >= {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attempted to append a path which does not start where the other path ends.
    #[error("cannot append a path ending at vertex {got} to a path ending at vertex {expected}")]
    EndpointMismatch { expected: VertexId, got: VertexId },

    /// A direct path was requested between points on different edges.
    #[error("points are on different edges: {0} and {1}")]
    DifferentEdges(EdgeId, EdgeId),

    /// An edge id does not exist in the graph.
    #[error("invalid edge: {0}")]
    InvalidEdge(EdgeId),
}
