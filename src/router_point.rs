// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::graph::EdgeRef;
use crate::{
    earth_distance, Coordinate, DirectedEdgeId, EdgeId, EdgePath, Error, Graph, VertexId,
    WeightHandler, NO_VERTEX,
};

/// Offset of a [RouterPoint] lying at the end vertex of its edge.
pub const MAX_OFFSET: u16 = u16::MAX;

/// A location expressed relative to the [Graph]: an edge and a position along it.
///
/// `offset` goes from 0 (the start vertex of the edge) to [MAX_OFFSET] (the end vertex),
/// measured along the edge geometry. `latitude` and `longitude` keep the original
/// position that was snapped onto the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterPoint {
    pub latitude: f32,
    pub longitude: f32,
    pub edge_id: EdgeId,
    pub offset: u16,
}

impl RouterPoint {
    pub fn new(latitude: f32, longitude: f32, edge_id: EdgeId, offset: u16) -> Self {
        Self {
            latitude,
            longitude,
            edge_id,
            offset,
        }
    }

    /// Returns the offset as a fraction of the edge length, from 0 to 1.
    pub fn offset_fraction(&self) -> f32 {
        self.offset as f32 / MAX_OFFSET as f32
    }

    /// Checks if the point lies exactly on one of the endpoints of its edge.
    pub fn is_at_vertex(&self) -> bool {
        self.offset == 0 || self.offset == MAX_OFFSET
    }

    /// Returns the vertex this point lies on, or [NO_VERTEX] if it's somewhere
    /// in the middle of its edge.
    pub fn vertex_id(&self, g: &Graph) -> Result<VertexId, Error> {
        let edge = self.edge(g)?;
        Ok(self.vertex_on(&edge))
    }

    /// Checks if this point lies exactly on the given vertex.
    pub fn is_vertex(&self, g: &Graph, vertex: VertexId) -> Result<bool, Error> {
        Ok(vertex != NO_VERTEX && self.vertex_id(g)? == vertex)
    }

    /// Computes the position of this point on the edge geometry.
    pub fn location_on_network(&self, g: &Graph) -> Result<Coordinate, Error> {
        let edge = self.edge(g)?;
        let geometry = g
            .edge_geometry(self.edge_id)
            .ok_or(Error::InvalidEdge(self.edge_id))?;

        let target = edge.distance * self.offset_fraction();
        let mut travelled = 0.0;
        for pair in geometry.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let length = earth_distance(a.lat, a.lon, b.lat, b.lon);
            if length > 0.0 && travelled + length >= target {
                let t = ((target - travelled) / length).clamp(0.0, 1.0);
                if t >= 1.0 {
                    return Ok(b);
                }
                return Ok(Coordinate {
                    lat: a.lat + t * (b.lat - a.lat),
                    lon: a.lon + t * (b.lon - a.lon),
                });
            }
            travelled += length;
        }

        Ok(geometry[geometry.len() - 1])
    }

    /// Expands this point into paths to the endpoints of its edge.
    ///
    /// For a source (`as_source == true`), the paths lead from the point to the endpoints;
    /// for a target they lead from the endpoints to the point, and each path's `edge`
    /// is the direction in which the edge is traversed to arrive at the point.
    /// In both cases the returned paths have the endpoint as their `vertex`
    /// and an origin at [NO_VERTEX].
    ///
    /// A point lying exactly on a vertex yields a single, zero-weight path at that vertex.
    /// Directions forbidden by the edge's [Factor](crate::Factor) are left out.
    pub fn to_edge_paths<H: WeightHandler>(
        &self,
        g: &Graph,
        handler: &H,
        as_source: bool,
    ) -> Result<Vec<EdgePath<H::Weight>>, Error> {
        let edge = self.edge(g)?;

        let vertex = self.vertex_on(&edge);
        if vertex != NO_VERTEX {
            return Ok(vec![EdgePath::new(vertex, handler.zero())]);
        }

        let offset = self.offset_fraction();
        let (weight_from, factor) = handler.calculate(edge.profile, edge.distance * offset);
        let (weight_to, _) = handler.calculate(edge.profile, edge.distance * (1.0 - offset));
        if !factor.is_traversable() {
            return Ok(vec![]);
        }

        let origin = Arc::new(EdgePath::new(NO_VERTEX, handler.zero()));
        let mut paths = Vec::with_capacity(2);

        if as_source {
            if factor.direction.allows(false) {
                paths.push(EdgePath::with_from(
                    edge.from,
                    weight_from,
                    DirectedEdgeId::new(edge.id, false),
                    origin.clone(),
                ));
            }
            if factor.direction.allows(true) {
                paths.push(EdgePath::with_from(
                    edge.to,
                    weight_to,
                    DirectedEdgeId::new(edge.id, true),
                    origin,
                ));
            }
        } else {
            if factor.direction.allows(true) {
                paths.push(EdgePath::with_from(
                    edge.from,
                    weight_from,
                    DirectedEdgeId::new(edge.id, true),
                    origin.clone(),
                ));
            }
            if factor.direction.allows(false) {
                paths.push(EdgePath::with_from(
                    edge.to,
                    weight_to,
                    DirectedEdgeId::new(edge.id, false),
                    origin,
                ));
            }
        }

        Ok(paths)
    }

    /// Computes the direct path along the shared edge from this point to `target`,
    /// without searching the graph.
    ///
    /// Returns [None] if the edge can't be traversed from this point towards the target.
    pub fn edge_path_to<H: WeightHandler>(
        &self,
        g: &Graph,
        handler: &H,
        target: &RouterPoint,
    ) -> Result<Option<EdgePath<H::Weight>>, Error> {
        if self.edge_id != target.edge_id {
            return Err(Error::DifferentEdges(self.edge_id, target.edge_id));
        }

        let edge = self.edge(g)?;
        let source_vertex = self.vertex_on(&edge);
        let target_vertex = target.vertex_on(&edge);

        if self.offset == target.offset {
            return Ok(Some(EdgePath::new(target_vertex, handler.zero())));
        }

        let forward = target.offset > self.offset;
        let distance = edge.distance * (target.offset_fraction() - self.offset_fraction()).abs();
        let (weight, factor) = handler.calculate(edge.profile, distance);
        if !factor.is_traversable() || !factor.direction.allows(forward) {
            return Ok(None);
        }

        Ok(Some(EdgePath::with_from(
            target_vertex,
            weight,
            DirectedEdgeId::new(edge.id, forward),
            Arc::new(EdgePath::new(source_vertex, handler.zero())),
        )))
    }

    fn edge(&self, g: &Graph) -> Result<EdgeRef, Error> {
        g.edge(self.edge_id).ok_or(Error::InvalidEdge(self.edge_id))
    }

    fn vertex_on(&self, edge: &EdgeRef) -> VertexId {
        match self.offset {
            0 => edge.from,
            MAX_OFFSET => edge.to,
            _ => NO_VERTEX,
        }
    }
}

/// Kind of a [RouterPointError].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterPointErrorCode {
    Unknown,

    /// No admissible edge was found close enough to the location.
    NotResolvable,

    /// The location was resolved, but can't be routed to or from the other locations.
    NotRoutable,
}

/// Describes why a single location was left out of a batch computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterPointError {
    pub code: RouterPointErrorCode,
    pub message: String,
}

impl RouterPointError {
    pub fn not_resolvable(latitude: f32, longitude: f32) -> Self {
        Self {
            code: RouterPointErrorCode::NotResolvable,
            message: format!(
                "Could not resolve location {latitude},{longitude}: \
                 no suitable edge within range."
            ),
        }
    }

    pub fn not_routable() -> Self {
        Self {
            code: RouterPointErrorCode::NotRoutable,
            message: "Location could not be routed to or from.".to_string(),
        }
    }
}

impl std::fmt::Display for RouterPointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultWeightHandler, Direction, Factor};

    /// 0 ─(e0, profile 0, both ways)─ 1 ─(e1, profile 1, one-way)─ 2
    fn line_graph() -> Graph {
        let mut g = Graph::new();
        let v0 = g.add_vertex(0.0, 0.0);
        let v1 = g.add_vertex(0.0, 0.01);
        let v2 = g.add_vertex(0.0, 0.02);
        g.add_edge(v0, v1, 0, vec![]);
        g.add_edge(v1, v2, 1, vec![]);
        g
    }

    fn handler() -> DefaultWeightHandler<impl Fn(u16) -> Factor> {
        DefaultWeightHandler::new(|profile| match profile {
            0 => Factor::new(1.0, Direction::Both),
            _ => Factor::new(1.0, Direction::Forward),
        })
    }

    const EDGE_LENGTH: f32 = 1111.95;

    #[test]
    fn vertex_points() {
        let g = line_graph();
        let start = RouterPoint::new(0.0, 0.0, 0, 0);
        let end = RouterPoint::new(0.0, 0.01, 0, MAX_OFFSET);
        let middle = RouterPoint::new(0.0, 0.005, 0, MAX_OFFSET / 2);

        assert!(start.is_at_vertex());
        assert_eq!(start.vertex_id(&g), Ok(0));
        assert_eq!(end.vertex_id(&g), Ok(1));
        assert_eq!(middle.vertex_id(&g), Ok(NO_VERTEX));
        assert_eq!(end.is_vertex(&g, 1), Ok(true));
        assert_eq!(middle.is_vertex(&g, NO_VERTEX), Ok(false));

        let invalid = RouterPoint::new(0.0, 0.0, 42, 0);
        assert_eq!(invalid.vertex_id(&g), Err(Error::InvalidEdge(42)));
    }

    #[test]
    fn location_on_network() {
        let g = line_graph();
        let quarter = RouterPoint::new(0.001, 0.0025, 0, MAX_OFFSET / 4);
        let loc = quarter.location_on_network(&g).unwrap();
        assert!((loc.lon - 0.0025).abs() < 1e-5);
        assert_eq!(loc.lat, 0.0);

        let end = RouterPoint::new(0.0, 0.02, 1, MAX_OFFSET);
        assert_eq!(
            end.location_on_network(&g).unwrap(),
            Coordinate { lat: 0.0, lon: 0.02 }
        );
    }

    #[test]
    fn edge_paths_at_vertex() {
        let g = line_graph();
        let paths = RouterPoint::new(0.0, 0.01, 1, 0)
            .to_edge_paths(&g, &handler(), true)
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].vertex, 1);
        assert_eq!(paths[0].weight, 0.0);
        assert!(paths[0].from.is_none());
    }

    #[test]
    fn edge_paths_bidirectional() {
        let g = line_graph();
        let h = handler();
        let quarter = RouterPoint::new(0.0, 0.0025, 0, MAX_OFFSET / 4);

        let sources = quarter.to_edge_paths(&g, &h, true).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].vertex, 0);
        assert_eq!(sources[0].edge, DirectedEdgeId::new(0, false));
        assert_almost_eq!(sources[0].weight, EDGE_LENGTH * 0.25);
        assert_eq!(sources[1].vertex, 1);
        assert_eq!(sources[1].edge, DirectedEdgeId::new(0, true));
        assert_almost_eq!(sources[1].weight, EDGE_LENGTH * 0.75);
        assert_eq!(sources[1].origin().vertex, NO_VERTEX);

        let targets = quarter.to_edge_paths(&g, &h, false).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].vertex, 0);
        assert_eq!(targets[0].edge, DirectedEdgeId::new(0, true));
        assert_eq!(targets[1].vertex, 1);
        assert_eq!(targets[1].edge, DirectedEdgeId::new(0, false));
    }

    #[test]
    fn edge_paths_one_way() {
        let g = line_graph();
        let h = handler();
        let middle = RouterPoint::new(0.0, 0.015, 1, MAX_OFFSET / 2);

        let sources = middle.to_edge_paths(&g, &h, true).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].vertex, 2);

        let targets = middle.to_edge_paths(&g, &h, false).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].vertex, 1);
    }

    #[test]
    fn edge_paths_not_traversable() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(|_| Factor::NO_FACTOR);
        let middle = RouterPoint::new(0.0, 0.005, 0, MAX_OFFSET / 2);
        assert!(middle.to_edge_paths(&g, &h, true).unwrap().is_empty());
    }

    #[test]
    fn direct_path_on_same_edge() {
        let g = line_graph();
        let h = handler();
        let a = RouterPoint::new(0.0, 0.0125, 1, MAX_OFFSET / 4);
        let b = RouterPoint::new(0.0, 0.0175, 1, MAX_OFFSET / 4 * 3);

        let path = a.edge_path_to(&g, &h, &b).unwrap().unwrap();
        assert_eq!(path.vertex, NO_VERTEX);
        assert_eq!(path.edge, DirectedEdgeId::new(1, true));
        assert_almost_eq!(path.weight, EDGE_LENGTH * 0.5);

        // Edge 1 is one-way
        assert!(b.edge_path_to(&g, &h, &a).unwrap().is_none());

        let same = a.edge_path_to(&g, &h, &a).unwrap().unwrap();
        assert_eq!(same.weight, 0.0);

        let other_edge = RouterPoint::new(0.0, 0.005, 0, MAX_OFFSET / 2);
        assert_eq!(
            a.edge_path_to(&g, &h, &other_edge).unwrap_err(),
            Error::DifferentEdges(1, 0)
        );
    }
}
