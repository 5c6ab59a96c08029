// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use super::Dijkstra;
use crate::{
    Algorithm, EdgePath, Error, Graph, RouterPoint, RunState, VertexId, WeightHandler,
};

/// Entry in a per-vertex chain of targets, which can be reached through that vertex.
#[derive(Debug, Clone, Copy)]
struct LinkedTarget {
    target: usize,
    next: Option<usize>,
}

/// Computes the best paths from a single source [RouterPoint]
/// to many target [RouterPoints](RouterPoint) with one [Dijkstra] search.
///
/// Targets on the same edge as the source are first connected directly along that edge;
/// the search still runs and replaces such a direct path if it finds a strictly better one.
/// The search is bounded by `max_search` while any target is missing a path,
/// and by the worst of the already-known paths otherwise. It also terminates as soon as
/// all targets are reached and no further settled vertex could improve on any of them.
pub struct OneToMany<'a, H: WeightHandler> {
    graph: &'a Graph,
    handler: &'a H,
    source: RouterPoint,
    targets: &'a [RouterPoint],
    max_search: H::Weight,
    state: RunState,
    best: Vec<Option<Arc<EdgePath<H::Weight>>>>,
    settled: usize,
}

impl<'a, H: WeightHandler> OneToMany<'a, H> {
    pub fn new(
        graph: &'a Graph,
        handler: &'a H,
        source: RouterPoint,
        targets: &'a [RouterPoint],
        max_search: H::Weight,
    ) -> Self {
        Self {
            graph,
            handler,
            source,
            targets,
            max_search,
            state: RunState::NotRun,
            best: Vec::new(),
            settled: 0,
        }
    }

    pub fn source(&self) -> &RouterPoint {
        &self.source
    }

    pub fn targets(&self) -> &[RouterPoint] {
        self.targets
    }

    fn search(&mut self) -> Result<(), Error> {
        let g = self.graph;
        let h = self.handler;
        let targets = self.targets;

        let mut best: Vec<Option<Arc<EdgePath<H::Weight>>>> = vec![None; targets.len()];
        let source_paths = self.source.to_edge_paths(g, h, true)?;

        let mut target_paths = Vec::with_capacity(targets.len());
        let mut target_vertices = Vec::with_capacity(targets.len());
        let mut links: Vec<LinkedTarget> = Vec::new();
        let mut heads: HashMap<VertexId, usize> = HashMap::default();

        for (idx, target) in targets.iter().enumerate() {
            if target.edge_id == self.source.edge_id {
                best[idx] = self.source.edge_path_to(g, h, target)?.map(Arc::new);
            }

            let paths = target.to_edge_paths(g, h, false)?;
            for path in &paths {
                let next = heads.insert(path.vertex, links.len());
                links.push(LinkedTarget { target: idx, next });
            }
            target_paths.push(paths);
            target_vertices.push(target.vertex_id(g)?);
        }

        let max = if best.iter().any(Option::is_none) {
            self.max_search
        } else {
            best.iter()
                .flatten()
                .map(|p| p.weight)
                .fold(h.zero(), |max, w| if h.is_larger_than(w, max) { w } else { max })
        };

        let mut found = best.iter().filter(|p| p.is_some()).count();
        log::debug!(
            "one-to-many search for {} targets, {} connected along the source edge",
            targets.len(),
            found,
        );

        let mut dijkstra = Dijkstra::new(g, h, source_paths, max, false);
        dijkstra.run_with(|path| {
            let vertex = path.vertex;
            let mut link = heads.get(&vertex).copied();

            while let Some(idx) = link {
                let LinkedTarget { target, next } = links[idx];
                link = next;

                let Some(target_path) = target_paths[target].iter().find(|p| p.vertex == vertex)
                else {
                    continue;
                };

                let total = h.add(path.weight, target_path.weight);
                let improves = match best[target] {
                    None => true,
                    Some(ref known) => h.is_smaller_than(total, known.weight),
                };
                if !improves {
                    continue;
                }

                if best[target].is_none() {
                    found += 1;
                }
                best[target] = Some(if target_vertices[target] == vertex {
                    path.clone()
                } else {
                    Arc::new(EdgePath::with_from(
                        target_vertices[target],
                        total,
                        target_path.edge,
                        path.clone(),
                    ))
                });
            }

            // Stop once nothing settled from now on can improve any of the targets
            found == best.len()
                && best
                    .iter()
                    .flatten()
                    .all(|known| !h.is_smaller_than(path.weight, known.weight))
        })?;

        self.settled = dijkstra.settled_count()?;
        self.best = best;
        Ok(())
    }

    /// Returns the best path to the target with the given index.
    ///
    /// Fails with [Error::NoPath] if the target couldn't be reached.
    pub fn path(&self, target: usize) -> Result<&Arc<EdgePath<H::Weight>>, Error> {
        self.try_path(target)?.ok_or(Error::NoPath(target))
    }

    /// Returns the best path to the target with the given index,
    /// or [None] if the target couldn't be reached.
    pub fn try_path(&self, target: usize) -> Result<Option<&Arc<EdgePath<H::Weight>>>, Error> {
        self.state.check_succeeded()?;
        self.best
            .get(target)
            .map(Option::as_ref)
            .ok_or(Error::IndexOutOfRange {
                index: target,
                len: self.best.len(),
            })
    }

    /// Returns the number of vertices settled by the search.
    pub fn settled_count(&self) -> Result<usize, Error> {
        self.state.check_succeeded()?;
        Ok(self.settled)
    }

    /// Returns the weights of the best paths to every target,
    /// with [WeightHandler::infinite] for unreachable targets.
    pub fn weights(&self) -> Result<Vec<H::Weight>, Error> {
        self.state.check_succeeded()?;
        Ok(self
            .best
            .iter()
            .map(|p| p.as_ref().map_or(self.handler.infinite(), |p| p.weight))
            .collect())
    }
}

impl<H: WeightHandler> Algorithm for OneToMany<'_, H> {
    fn run(&mut self) -> Result<(), Error> {
        self.state.start()?;
        let outcome = self.search();
        self.state.finish(&outcome);
        outcome
    }

    fn state(&self) -> &RunState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AugmentedWeightHandler, DefaultWeightHandler, Direction, Factor, MAX_OFFSET, NO_VERTEX,
    };

    /// Profile 1 is one-way, profile 2 is closed.
    fn profile(p: u16) -> Factor {
        match p {
            1 => Factor::new(1.0, Direction::Forward),
            2 => Factor::NO_FACTOR,
            _ => Factor::new(1.0, Direction::Both),
        }
    }

    /// 0 ─(e0)─ 1 ─(e1)─ 2 ─(e2)─ 3, plus a disconnected 4 ─(e3)─ 5
    fn line_graph() -> Graph {
        let mut g = Graph::new();
        for i in 0..4 {
            g.add_vertex(0.0, 0.01 * i as f32);
        }
        g.add_vertex(1.0, 0.0);
        g.add_vertex(1.0, 0.01);
        g.add_edge(0, 1, 0, vec![]);
        g.add_edge(1, 2, 0, vec![]);
        g.add_edge(2, 3, 0, vec![]);
        g.add_edge(4, 5, 0, vec![]);
        g
    }

    fn edge_length(g: &Graph, edge: u32) -> f32 {
        g.edge(edge).unwrap().distance
    }

    fn half(edge: u32) -> RouterPoint {
        RouterPoint::new(0.0, 0.0, edge, MAX_OFFSET / 2)
    }

    #[test]
    fn targets_along_line() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [
            RouterPoint::new(0.0, 0.0, 1, MAX_OFFSET), // at vertex 2
            half(2),
            RouterPoint::new(0.0, 0.0, 0, 0), // at vertex 0
        ];
        let mut otm = OneToMany::new(&g, &h, half(0), &targets, h.infinite());
        otm.run().unwrap();

        let e0 = edge_length(&g, 0);
        let e1 = edge_length(&g, 1);
        let e2 = edge_length(&g, 2);
        let weights = otm.weights().unwrap();
        assert_almost_eq!(weights[0], e0 / 2.0 + e1);
        assert_almost_eq!(weights[1], e0 / 2.0 + e1 + e2 / 2.0);
        assert_almost_eq!(weights[2], e0 / 2.0);

        let to_vertex = otm.path(0).unwrap();
        assert_eq!(to_vertex.vertices(), vec![NO_VERTEX, 1, 2]);

        let to_middle = otm.path(1).unwrap();
        assert_eq!(to_middle.vertices(), vec![NO_VERTEX, 1, 2, NO_VERTEX]);
        assert_eq!(to_middle.edge.edge_id(), 2);
        assert!(to_middle.edge.is_forward());
    }

    #[test]
    fn same_edge_direct_path() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let source = RouterPoint::new(0.0, 0.0, 1, MAX_OFFSET / 4);
        let targets = [RouterPoint::new(0.0, 0.0, 1, MAX_OFFSET / 4 * 3)];
        let mut otm = OneToMany::new(&g, &h, source, &targets, h.infinite());
        otm.run().unwrap();

        let path = otm.path(0).unwrap();
        let expected = h
            .calculate(0, edge_length(&g, 1) * (targets[0].offset_fraction() - source.offset_fraction()))
            .0;
        assert_almost_eq!(path.weight, expected);
        assert_eq!(path.vertices(), vec![NO_VERTEX, NO_VERTEX]);
        assert_eq!(path.edge.edge_id(), 1);
        assert!(path.edge.is_forward());
    }

    #[test]
    fn same_location() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(1)];
        let mut otm = OneToMany::new(&g, &h, half(1), &targets, h.infinite());
        otm.run().unwrap();

        assert_eq!(otm.weights().unwrap(), vec![0.0]);
        assert_eq!(otm.path(0).unwrap().node_count(), 1);
    }

    #[test]
    fn one_way_same_edge_goes_around() {
        // Triangle 0 -> 1 one-way, 1 ─ 2 ─ 0 two-way
        let mut g = Graph::new();
        g.add_vertex(0.0, 0.0);
        g.add_vertex(0.0, 0.01);
        g.add_vertex(0.01, 0.005);
        g.add_edge(0, 1, 1, vec![]);
        g.add_edge(1, 2, 0, vec![]);
        g.add_edge(2, 0, 0, vec![]);
        let h = DefaultWeightHandler::new(profile);

        // Target is "behind" the source on the one-way edge
        let source = RouterPoint::new(0.0, 0.0, 0, MAX_OFFSET / 4 * 3);
        let targets = [RouterPoint::new(0.0, 0.0, 0, MAX_OFFSET / 4)];
        let mut otm = OneToMany::new(&g, &h, source, &targets, h.infinite());
        otm.run().unwrap();

        let e0 = edge_length(&g, 0);
        let expected = e0 / 4.0 + edge_length(&g, 1) + edge_length(&g, 2) + e0 / 4.0;
        let path = otm.path(0).unwrap();
        assert_almost_eq!(path.weight, expected);
        assert_eq!(path.vertices(), vec![NO_VERTEX, 1, 2, 0, NO_VERTEX]);
    }

    #[test]
    fn unreachable_target() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(2), half(3)];
        let mut otm = OneToMany::new(&g, &h, half(0), &targets, h.infinite());
        otm.run().unwrap();

        assert!(otm.try_path(0).unwrap().is_some());
        assert!(otm.try_path(1).unwrap().is_none());
        assert_eq!(otm.path(1).unwrap_err(), Error::NoPath(1));
        assert_eq!(otm.weights().unwrap()[1], h.infinite());
        assert_eq!(
            otm.path(2).unwrap_err(),
            Error::IndexOutOfRange { index: 2, len: 2 }
        );
    }

    #[test]
    fn max_search_bound() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(1), half(2)];
        let bound = edge_length(&g, 0) * 1.2;
        let mut otm = OneToMany::new(&g, &h, half(0), &targets, bound);
        otm.run().unwrap();

        assert!(otm.try_path(0).unwrap().is_some());
        assert!(otm.try_path(1).unwrap().is_none());
    }

    #[test]
    fn closed_source_edge() {
        let mut g = line_graph();
        let closed = g.add_edge(3, 4, 2, vec![]);
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(0)];
        let source = RouterPoint::new(0.0, 0.0, closed, MAX_OFFSET / 2);
        let mut otm = OneToMany::new(&g, &h, source, &targets, h.infinite());
        otm.run().unwrap();

        assert!(otm.try_path(0).unwrap().is_none());
    }

    #[test]
    fn augmented_weights() {
        let g = line_graph();
        let h = AugmentedWeightHandler::new(|_| Factor::with_speed(2.0, 0.1, Direction::Both));
        let targets = [RouterPoint::new(0.0, 0.0, 2, MAX_OFFSET)];
        let mut otm = OneToMany::new(&g, &h, RouterPoint::new(0.0, 0.0, 0, 0), &targets, h.infinite());
        otm.run().unwrap();

        let total = edge_length(&g, 0) + edge_length(&g, 1) + edge_length(&g, 2);
        let w = otm.path(0).unwrap().weight;
        assert_almost_eq!(w.distance, total);
        assert_almost_eq!(w.value, total * 2.0);
        assert_almost_eq!(w.time, total * 0.1);
    }

    #[test]
    fn single_use() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(1)];
        let mut otm = OneToMany::new(&g, &h, half(0), &targets, h.infinite());

        assert_eq!(otm.weights().unwrap_err(), Error::NotRun);
        otm.run().unwrap();
        assert_eq!(otm.run().unwrap_err(), Error::AlreadyRun);
        assert!(otm.has_succeeded());
    }

    #[test]
    fn invalid_source_edge() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(1)];
        let mut otm = OneToMany::new(&g, &h, half(42), &targets, h.infinite());

        assert_eq!(otm.run().unwrap_err(), Error::InvalidEdge(42));
        assert!(otm.has_run());
        assert!(!otm.has_succeeded());
        assert!(matches!(otm.weights(), Err(Error::NotSucceeded(_))));
    }

    #[test]
    fn stops_once_targets_cannot_improve() {
        // A long road: 0 ─ 1 ─ 2 ─ ... ─ 19
        let mut g = Graph::new();
        for i in 0..20 {
            g.add_vertex(0.0, 0.01 * i as f32);
        }
        for i in 0..19 {
            g.add_edge(i, i + 1, 0, vec![]);
        }
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(1)];

        let mut otm = OneToMany::new(&g, &h, half(0), &targets, h.infinite());
        otm.run().unwrap();

        let expected = edge_length(&g, 0) / 2.0 + edge_length(&g, 1) / 2.0;
        assert_almost_eq!(otm.weights().unwrap()[0], expected);

        // Vertices 0 and 1 reach the target, vertex 2 is already too far;
        // nothing further down the road gets settled
        assert!(otm.settled_count().unwrap() <= 3);
    }

    #[test]
    fn unreached_target_keeps_searching() {
        let g = line_graph();
        let h = DefaultWeightHandler::new(profile);
        let targets = [half(1), half(3)];

        let mut otm = OneToMany::new(&g, &h, half(0), &targets, h.infinite());
        otm.run().unwrap();

        assert!(otm.try_path(1).unwrap().is_none());
        assert_eq!(otm.settled_count().unwrap(), 4);
    }
}
