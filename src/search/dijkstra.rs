// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use crate::graph::EdgeRef;
use crate::{
    Algorithm, DirectedEdgeId, EdgePath, Error, Graph, RunState, VertexId, WeightHandler,
    NO_VERTEX,
};

#[derive(Debug)]
struct QueueItem<W> {
    metric: f32,
    order: u64,
    path: Arc<EdgePath<W>>,
}

impl<W> PartialEq for QueueItem<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<W> Eq for QueueItem<W> {}

impl<W> PartialOrd for QueueItem<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W> Ord for QueueItem<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: We revert the order of comparison,
        // as lower metrics (and earlier discoveries) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .metric
            .total_cmp(&self.metric)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// to settle vertices of a [Graph] in order of their weight from one or more source paths.
///
/// The search stops when all vertices within `max` weight have been settled,
/// or when the visitor passed to [Dijkstra::run_with] asks it to. Every settled vertex
/// is guaranteed to have its shortest weight, as long as the [WeightHandler] never
/// produces negative increments.
///
/// With `backward == true` edges are checked for traversability in the opposite
/// direction, yielding paths _to_ the sources instead of _from_ them.
pub struct Dijkstra<'a, H: WeightHandler> {
    graph: &'a Graph,
    handler: &'a H,
    edge_filter: Option<&'a dyn Fn(&EdgeRef) -> bool>,
    sources: Vec<EdgePath<H::Weight>>,
    max: H::Weight,
    backward: bool,
    state: RunState,
    visits: HashMap<VertexId, Arc<EdgePath<H::Weight>>>,
    stopped: bool,
}

impl<'a, H: WeightHandler> Dijkstra<'a, H> {
    pub fn new(
        graph: &'a Graph,
        handler: &'a H,
        sources: Vec<EdgePath<H::Weight>>,
        max: H::Weight,
        backward: bool,
    ) -> Self {
        Self {
            graph,
            handler,
            edge_filter: None,
            sources,
            max,
            backward,
            state: RunState::NotRun,
            visits: HashMap::default(),
            stopped: false,
        }
    }

    /// Restricts the search to edges for which `filter` returns true.
    pub fn with_edge_filter(mut self, filter: &'a dyn Fn(&EdgeRef) -> bool) -> Self {
        self.edge_filter = Some(filter);
        self
    }

    /// Runs the search, calling `visit` with the path to every settled vertex,
    /// in order of non-decreasing weight. Returning `true` from `visit` stops the search.
    pub fn run_with<V>(&mut self, mut visit: V) -> Result<(), Error>
    where
        V: FnMut(&Arc<EdgePath<H::Weight>>) -> bool,
    {
        self.state.start()?;
        self.search(&mut visit);
        let outcome = Ok(());
        self.state.finish(&outcome);
        outcome
    }

    fn search<V>(&mut self, visit: &mut V)
    where
        V: FnMut(&Arc<EdgePath<H::Weight>>) -> bool,
    {
        let graph = self.graph;
        let h = self.handler;

        let mut queue: BinaryHeap<QueueItem<H::Weight>> = BinaryHeap::default();
        let mut known_weights: HashMap<VertexId, H::Weight> = HashMap::default();
        let mut order: u64 = 0;

        for source in std::mem::take(&mut self.sources) {
            if source.vertex == NO_VERTEX || h.is_larger_than(source.weight, self.max) {
                continue;
            }
            if let Some(&known) = known_weights.get(&source.vertex) {
                if !h.is_smaller_than(source.weight, known) {
                    continue;
                }
            }

            known_weights.insert(source.vertex, source.weight);
            queue.push(QueueItem {
                metric: h.metric(source.weight),
                order,
                path: Arc::new(source),
            });
            order += 1;
        }

        while let Some(item) = queue.pop() {
            let path = item.path;

            // Multiple items might be kept in the queue for the same vertex - only the first one counts
            if self.visits.contains_key(&path.vertex) {
                continue;
            }

            if h.is_larger_than(path.weight, self.max) {
                break;
            }

            self.visits.insert(path.vertex, path.clone());
            if visit(&path) {
                self.stopped = true;
                break;
            }

            for edge in graph.edges(path.vertex) {
                if self.visits.contains_key(&edge.to) {
                    continue;
                }

                if let Some(filter) = self.edge_filter {
                    if !filter(&edge) {
                        continue;
                    }
                }

                let (increment, factor) = h.calculate(edge.profile, edge.distance);
                if !factor.is_traversable() || !factor.direction.allows(edge.forward != self.backward)
                {
                    continue;
                }

                // Check if this is the cheapest way to the neighbor
                let weight = h.add(path.weight, increment);
                if h.is_larger_than(weight, self.max) {
                    continue;
                }
                if let Some(&known) = known_weights.get(&edge.to) {
                    if !h.is_smaller_than(weight, known) {
                        continue;
                    }
                }

                known_weights.insert(edge.to, weight);
                queue.push(QueueItem {
                    metric: h.metric(weight),
                    order,
                    path: Arc::new(EdgePath::with_from(
                        edge.to,
                        weight,
                        DirectedEdgeId::new(edge.id, edge.forward),
                        path.clone(),
                    )),
                });
                order += 1;
            }
        }

        log::trace!(
            "dijkstra settled {} vertices (stopped early: {})",
            self.visits.len(),
            self.stopped
        );
    }

    /// Returns the best path to a vertex, if it was settled.
    pub fn try_get_visit(&self, vertex: VertexId) -> Result<Option<&Arc<EdgePath<H::Weight>>>, Error> {
        self.state.check_succeeded()?;
        Ok(self.visits.get(&vertex))
    }

    /// Returns the number of settled vertices.
    pub fn settled_count(&self) -> Result<usize, Error> {
        self.state.check_succeeded()?;
        Ok(self.visits.len())
    }

    /// Checks if the search was stopped by the visitor.
    pub fn was_stopped(&self) -> Result<bool, Error> {
        self.state.check_succeeded()?;
        Ok(self.stopped)
    }
}

impl<H: WeightHandler> Algorithm for Dijkstra<'_, H> {
    fn run(&mut self) -> Result<(), Error> {
        self.run_with(|_| false)
    }

    fn state(&self) -> &RunState {
        &self.state
    }
}
