// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::{EdgeId, Error, VertexId, WeightHandler, NO_EDGE, NO_VERTEX};

/// Identifies an edge together with the direction it was traversed in.
///
/// The edge id is stored offset by one, so that the sign can encode the direction
/// (positive - along the stored direction of the edge, negative - against it)
/// and zero can represent [DirectedEdgeId::NONE].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectedEdgeId(i64);

impl DirectedEdgeId {
    /// Marks the origin of a path, which wasn't reached over any edge.
    pub const NONE: Self = Self(0);

    pub fn new(edge: EdgeId, forward: bool) -> Self {
        debug_assert_ne!(edge, NO_EDGE);
        let raw = edge as i64 + 1;
        Self(if forward { raw } else { -raw })
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns the undirected edge id, or [NO_EDGE] for [DirectedEdgeId::NONE].
    pub fn edge_id(self) -> EdgeId {
        if self.0 == 0 {
            NO_EDGE
        } else {
            (self.0.abs() - 1) as EdgeId
        }
    }

    /// Checks if the edge was traversed along its stored direction.
    pub fn is_forward(self) -> bool {
        self.0 > 0
    }

    /// Returns the same edge, traversed in the other direction.
    pub fn reverse(self) -> Self {
        Self(-self.0)
    }

    /// Returns the signed representation of this id.
    pub fn raw(self) -> i64 {
        self.0
    }
}

/// A shortest-path record: the vertex reached, the accumulated weight,
/// the edge used to reach that vertex and the path up to the previous vertex.
///
/// Paths form a backward-linked list, terminating in an origin with `from == None`.
/// Predecessors are reference-counted, so that all paths produced by a single search
/// can share their common prefixes.
#[derive(Debug, Clone)]
pub struct EdgePath<W> {
    pub vertex: VertexId,
    pub weight: W,
    pub edge: DirectedEdgeId,
    pub from: Option<Arc<EdgePath<W>>>,
}

impl<W> EdgePath<W> {
    /// Creates the origin of a path.
    pub fn new(vertex: VertexId, weight: W) -> Self {
        Self {
            vertex,
            weight,
            edge: DirectedEdgeId::NONE,
            from: None,
        }
    }

    /// Extends `from` by reaching `vertex` over `edge`.
    pub fn with_from(
        vertex: VertexId,
        weight: W,
        edge: DirectedEdgeId,
        from: Arc<EdgePath<W>>,
    ) -> Self {
        Self {
            vertex,
            weight,
            edge,
            from: Some(from),
        }
    }

    /// Iterates over the path nodes, from this (last) one back to the origin.
    pub fn iter(&self) -> Iter<'_, W> {
        Iter { next: Some(self) }
    }

    /// Returns the first node of the path.
    pub fn origin(&self) -> &EdgePath<W> {
        let mut path = self;
        while let Some(ref from) = path.from {
            path = from.as_ref();
        }
        path
    }

    /// Returns the number of nodes in the path.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Checks if the path passes through the given vertex.
    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.iter().any(|p| p.vertex == vertex)
    }

    /// Returns all nodes of the path, from the origin to this node.
    pub fn to_vec(&self) -> Vec<&EdgePath<W>> {
        let mut nodes: Vec<&EdgePath<W>> = self.iter().collect();
        nodes.reverse();
        nodes
    }

    /// Returns all vertices of the path, from the origin to this node.
    pub fn vertices(&self) -> Vec<VertexId> {
        let mut vertices: Vec<VertexId> = self.iter().map(|p| p.vertex).collect();
        vertices.reverse();
        vertices
    }
}

impl<W: Copy> EdgePath<W> {
    /// Extends this path with `reverse_path` walked backwards, that is from its last
    /// vertex to its origin. Used to splice a backward search onto a forward search.
    ///
    /// `reverse_path` must end at the same vertex as this path.
    pub fn append<H>(&self, reverse_path: &EdgePath<W>, handler: &H) -> Result<EdgePath<W>, Error>
    where
        H: WeightHandler<Weight = W>,
    {
        if self.vertex != reverse_path.vertex {
            return Err(Error::EndpointMismatch {
                expected: self.vertex,
                got: reverse_path.vertex,
            });
        }

        let mut path = self.clone();
        let mut reverse = reverse_path;
        while let Some(ref previous) = reverse.from {
            let local = handler.subtract(reverse.weight, previous.weight);
            path = EdgePath::with_from(
                previous.vertex,
                handler.add(path.weight, local),
                reverse.edge.reverse(),
                Arc::new(path),
            );
            reverse = previous.as_ref();
        }
        Ok(path)
    }

    /// Returns a copy of this path with all edge ids removed.
    pub fn strip_edges(&self) -> EdgePath<W> {
        self.rebuild(|_, node| (node.vertex, DirectedEdgeId::NONE))
    }

    /// Returns a copy of this path with the origin vertex replaced by [NO_VERTEX].
    pub fn strip_source(&self) -> EdgePath<W> {
        self.rebuild(|idx, node| {
            if idx == 0 {
                (NO_VERTEX, node.edge)
            } else {
                (node.vertex, node.edge)
            }
        })
    }

    /// Returns a copy of this path with the last vertex replaced by [NO_VERTEX].
    pub fn strip_target(&self) -> EdgePath<W> {
        EdgePath {
            vertex: NO_VERTEX,
            weight: self.weight,
            edge: self.edge,
            from: self.from.clone(),
        }
    }

    /// Copies the path node-by-node (origin first), replacing vertices and edges.
    fn rebuild<F>(&self, mut f: F) -> EdgePath<W>
    where
        F: FnMut(usize, &EdgePath<W>) -> (VertexId, DirectedEdgeId),
    {
        let nodes = self.to_vec();
        let (vertex, edge) = f(0, nodes[0]);
        let mut path = EdgePath {
            vertex,
            weight: nodes[0].weight,
            edge,
            from: None,
        };

        for (idx, node) in nodes.iter().enumerate().skip(1) {
            let (vertex, edge) = f(idx, node);
            path = EdgePath::with_from(vertex, node.weight, edge, Arc::new(path));
        }
        path
    }
}

impl<W> Drop for EdgePath<W> {
    fn drop(&mut self) {
        // Unlink the chain iteratively, as the default recursive drop
        // would overflow the stack on very long paths.
        let mut next = self.from.take();
        while let Some(from) = next {
            match Arc::try_unwrap(from) {
                Ok(mut path) => next = path.from.take(),
                Err(_) => break,
            }
        }
    }
}

/// Iterator over an [EdgePath], from the last node to the origin.
#[derive(Debug, Clone)]
pub struct Iter<'a, W> {
    next: Option<&'a EdgePath<W>>,
}

impl<'a, W> Iterator for Iter<'a, W> {
    type Item = &'a EdgePath<W>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.from.as_deref();
        Some(current)
    }
}
