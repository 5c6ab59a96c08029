// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::BoundingBox;
use crate::{earth_distance, Coordinate, EdgeId, SpatialIndex, VertexId};

/// Represents a road network as a set of vertices (with fixed positions)
/// and edges between them.
///
/// Every edge is stored once, in the direction it was added, and is
/// reachable from both of its endpoints. Whether an edge may actually be traversed
/// in a given direction is decided by the [Factor](crate::Factor) of its profile,
/// not by the graph.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    vertices: Vec<Coordinate>,
    edges: Vec<EdgeRecord>,
    adjacency: Vec<Vec<EdgeId>>,
}

#[derive(Debug, Clone, PartialEq)]
struct EdgeRecord {
    from: VertexId,
    to: VertexId,
    profile: u16,
    distance: f32,
    shape: Vec<Coordinate>,
    bbox: BoundingBox,
}

/// An edge as seen when walking it from one of its endpoints.
///
/// `from` and `to` are given in the walking direction; `forward` tells if
/// that matches the direction in which the edge is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRef {
    pub id: EdgeId,
    pub from: VertexId,
    pub to: VertexId,
    pub forward: bool,

    /// Attribute payload, translated into a [Factor](crate::Factor) by a
    /// [WeightHandler](crate::WeightHandler).
    pub profile: u16,

    /// Length of the edge (including its shape), in meters.
    pub distance: f32,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of vertices in the graph.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Adds a new vertex at the given position and returns its id.
    pub fn add_vertex(&mut self, lat: f32, lon: f32) -> VertexId {
        let id = self.vertices.len() as VertexId;
        assert_ne!(id, crate::NO_VERTEX);
        self.vertices.push(Coordinate { lat, lon });
        self.adjacency.push(Vec::default());
        id
    }

    /// Retrieves the position of a vertex.
    pub fn vertex(&self, id: VertexId) -> Option<Coordinate> {
        self.vertices.get(id as usize).copied()
    }

    /// Adds a new edge between two existing vertices, with the given intermediate
    /// shape points, and returns its id. The length of the edge is computed from its geometry.
    ///
    /// # Panics
    ///
    /// Panics if `from` or `to` don't refer to existing vertices.
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        profile: u16,
        shape: Vec<Coordinate>,
    ) -> EdgeId {
        let from_pos = self.vertex(from).expect("edge must start at an existing vertex");
        let to_pos = self.vertex(to).expect("edge must end at an existing vertex");

        let id = self.edges.len() as EdgeId;
        assert_ne!(id, crate::NO_EDGE);

        let points: Vec<Coordinate> = std::iter::once(from_pos)
            .chain(shape.iter().copied())
            .chain(std::iter::once(to_pos))
            .collect();

        let distance = points
            .windows(2)
            .map(|pair| earth_distance(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
            .sum();

        let bbox = BoundingBox::covering(points.iter().map(|c| (c.lat, c.lon)))
            .expect("edge geometry has at least two points");

        self.edges.push(EdgeRecord {
            from,
            to,
            profile,
            distance,
            shape,
            bbox,
        });

        self.adjacency[from as usize].push(id);
        if from != to {
            self.adjacency[to as usize].push(id);
        }

        id
    }

    /// Retrieves an edge, walked in its stored direction.
    pub fn edge(&self, id: EdgeId) -> Option<EdgeRef> {
        self.edges.get(id as usize).map(|e| EdgeRef {
            id,
            from: e.from,
            to: e.to,
            forward: true,
            profile: e.profile,
            distance: e.distance,
        })
    }

    /// Gets all edges incident to a vertex, walked away from that vertex.
    pub fn edges(&self, vertex: VertexId) -> impl Iterator<Item = EdgeRef> + '_ {
        self.adjacency
            .get(vertex as usize)
            .map(|ids| ids.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&id| {
                let e = &self.edges[id as usize];
                let forward = e.from == vertex;
                EdgeRef {
                    id,
                    from: vertex,
                    to: if forward { e.to } else { e.from },
                    forward,
                    profile: e.profile,
                    distance: e.distance,
                }
            })
    }

    /// Returns all points of an edge, in its stored direction:
    /// the start vertex, the intermediate shape points and the end vertex.
    pub fn edge_geometry(&self, id: EdgeId) -> Option<Vec<Coordinate>> {
        let e = self.edges.get(id as usize)?;
        let mut points = Vec::with_capacity(e.shape.len() + 2);
        points.push(self.vertices[e.from as usize]);
        points.extend_from_slice(&e.shape);
        points.push(self.vertices[e.to as usize]);
        Some(points)
    }
}

/// Exhaustive search over all edges.
///
/// This requires checking the bounding box of every edge in the graph and
/// is not suitable for large graphs - use an [EdgeIndex](crate::EdgeIndex) instead.
impl SpatialIndex for Graph {
    fn search_edges(&self, bbox: &BoundingBox) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.bbox.intersects(bbox))
            .map(|(id, _)| id as EdgeId)
            .collect()
    }
}
