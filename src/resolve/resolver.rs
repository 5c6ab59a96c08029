// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::ResolveOptions;
use crate::distance::{project_on_segment, BoundingBox};
use crate::graph::EdgeRef;
use crate::{
    earth_distance, is_valid_coordinate, Algorithm, EdgeId, Error, Graph, RouterPoint, RunState,
    SpatialIndex, MAX_OFFSET,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    edge: EdgeId,
    distance: f32,
    offset: u16,
}

impl Candidate {
    fn is_closer_than(&self, other: &Option<Candidate>) -> bool {
        match other {
            None => true,
            Some(o) => self.distance < o.distance,
        }
    }
}

/// Snaps a single location onto the closest admissible edge of a [Graph].
///
/// Candidate edges come from a [SpatialIndex] probed around the location, and are measured
/// against their full geometry (including shape points). Edges rejected by `is_acceptable`
/// or lying further than [ResolveOptions::max_distance] are ignored.
///
/// If an `is_better` predicate is provided, the closest edge it accepts wins over
/// any closer edge it rejects. When it accepts none of the candidates,
/// the closest admissible edge is returned.
///
/// Not finding any edge isn't an error - the run succeeds and [ResolveAlgorithm::result]
/// returns [None].
pub struct ResolveAlgorithm<'a, I: SpatialIndex + ?Sized> {
    graph: &'a Graph,
    index: &'a I,
    latitude: f32,
    longitude: f32,
    options: ResolveOptions,
    is_acceptable: &'a dyn Fn(&EdgeRef) -> bool,
    is_better: Option<&'a dyn Fn(&EdgeRef) -> bool>,
    state: RunState,
    result: Option<RouterPoint>,
}

impl<'a, I: SpatialIndex + ?Sized> ResolveAlgorithm<'a, I> {
    pub fn new(
        graph: &'a Graph,
        index: &'a I,
        latitude: f32,
        longitude: f32,
        options: ResolveOptions,
        is_acceptable: &'a dyn Fn(&EdgeRef) -> bool,
    ) -> Self {
        Self {
            graph,
            index,
            latitude,
            longitude,
            options,
            is_acceptable,
            is_better: None,
            state: RunState::NotRun,
            result: None,
        }
    }

    /// Sets the predicate marking preferred edges.
    pub fn with_is_better(mut self, is_better: &'a dyn Fn(&EdgeRef) -> bool) -> Self {
        self.is_better = Some(is_better);
        self
    }

    fn resolve(&self) -> Option<RouterPoint> {
        let (lat, lon) = (self.latitude, self.longitude);
        if !is_valid_coordinate(lat, lon) {
            log::debug!("not resolving invalid location {},{}", lat, lon);
            return None;
        }

        let bbox = BoundingBox::around(lat, lon, self.options.search_offset);
        let mut nearest: Option<Candidate> = None;
        let mut nearest_better: Option<Candidate> = None;

        for id in self.index.search_edges(&bbox) {
            let Some(edge) = self.graph.edge(id) else {
                continue;
            };
            if !(self.is_acceptable)(&edge) {
                continue;
            }

            let Some(candidate) = self.project(id) else {
                continue;
            };
            if candidate.distance > self.options.max_distance {
                continue;
            }

            if candidate.is_closer_than(&nearest) {
                nearest = Some(candidate);
            }
            if self.is_better.is_some_and(|f| f(&edge)) && candidate.is_closer_than(&nearest_better)
            {
                nearest_better = Some(candidate);
            }
        }

        let chosen = nearest_better.or(nearest);
        match chosen {
            Some(c) => log::trace!(
                "resolved {},{} onto edge {} at offset {} ({} m away)",
                lat,
                lon,
                c.edge,
                c.offset,
                c.distance,
            ),
            None => log::debug!("no edge found within range of {},{}", lat, lon),
        }

        chosen.map(|c| RouterPoint::new(lat, lon, c.edge, c.offset))
    }

    /// Finds the point of an edge closest to the location.
    fn project(&self, id: EdgeId) -> Option<Candidate> {
        let geometry = self.graph.edge_geometry(id)?;

        let mut best: Option<(f32, f32)> = None; // (distance, along)
        let mut walked: f32 = 0.0;
        for segment in geometry.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            let length = earth_distance(a.lat, a.lon, b.lat, b.lon);
            let p = project_on_segment(self.latitude, self.longitude, (a.lat, a.lon), (b.lat, b.lon));

            let is_closer = match best {
                None => true,
                Some((d, _)) => p.distance < d,
            };
            if is_closer {
                best = Some((p.distance, walked + p.t * length));
            }
            walked += length;
        }

        let (distance, along) = best?;
        let fraction = if walked > 0.0 { (along / walked).clamp(0.0, 1.0) } else { 0.0 };
        Some(Candidate {
            edge: id,
            distance,
            offset: (fraction * MAX_OFFSET as f32).round() as u16,
        })
    }

    /// Returns the resolved point, or [None] if no admissible edge was in range.
    pub fn result(&self) -> Result<Option<&RouterPoint>, Error> {
        self.state.check_succeeded()?;
        Ok(self.result.as_ref())
    }
}

impl<I: SpatialIndex + ?Sized> Algorithm for ResolveAlgorithm<'_, I> {
    fn run(&mut self) -> Result<(), Error> {
        self.state.start()?;
        self.result = self.resolve();
        let outcome = Ok(());
        self.state.finish(&outcome);
        outcome
    }

    fn state(&self) -> &RunState {
        &self.state
    }
}
