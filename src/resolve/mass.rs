// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use super::{ResolveAlgorithm, ResolveOptions};
use crate::graph::EdgeRef;
use crate::{
    Algorithm, Coordinate, Error, Graph, RouterPoint, RouterPointError, RunState, SpatialIndex,
    WeightHandler,
};

/// Resolves many locations at once.
///
/// Locations which can't be resolved are left out of [MassResolver::router_points],
/// and instead have an entry in [MassResolver::errors], keyed by their location index.
pub trait MassResolver: Algorithm {
    /// Returns the successfully resolved points, in the order of their locations.
    fn router_points(&self) -> Result<&[RouterPoint], Error>;

    /// Returns the resolution errors, keyed by location index.
    fn errors(&self) -> Result<&BTreeMap<usize, RouterPointError>, Error>;

    /// Maps an index into [MassResolver::router_points] back to the location index.
    fn location_index_of(&self, resolved: usize) -> Result<usize, Error>;

    /// Maps a location index into an index into [MassResolver::router_points],
    /// returning [None] for locations which failed to resolve.
    fn resolved_index_of(&self, location: usize) -> Result<Option<usize>, Error>;
}

/// [MassResolver] snapping every location with a [ResolveAlgorithm], admitting
/// only edges with a traversable [Factor](crate::Factor) under the given [WeightHandler].
pub struct MassResolvingAlgorithm<'a, H: WeightHandler, I: SpatialIndex + ?Sized> {
    graph: &'a Graph,
    index: &'a I,
    handler: &'a H,
    locations: &'a [Coordinate],
    options: ResolveOptions,
    is_better: Option<&'a dyn Fn(&EdgeRef) -> bool>,
    state: RunState,
    router_points: Vec<RouterPoint>,
    location_indices: Vec<usize>,
    errors: BTreeMap<usize, RouterPointError>,
}

impl<'a, H: WeightHandler, I: SpatialIndex + ?Sized> MassResolvingAlgorithm<'a, H, I> {
    pub fn new(
        graph: &'a Graph,
        index: &'a I,
        handler: &'a H,
        locations: &'a [Coordinate],
        options: ResolveOptions,
    ) -> Self {
        Self {
            graph,
            index,
            handler,
            locations,
            options,
            is_better: None,
            state: RunState::NotRun,
            router_points: Vec::new(),
            location_indices: Vec::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Sets the predicate marking preferred edges, see [ResolveAlgorithm::with_is_better].
    pub fn with_is_better(mut self, is_better: &'a dyn Fn(&EdgeRef) -> bool) -> Self {
        self.is_better = Some(is_better);
        self
    }

    pub fn locations(&self) -> &[Coordinate] {
        self.locations
    }

    fn resolve_all(&mut self) -> Result<(), Error> {
        let h = self.handler;
        let is_acceptable = |edge: &EdgeRef| h.factor(edge.profile).is_traversable();

        for (idx, location) in self.locations.iter().enumerate() {
            let mut resolver = ResolveAlgorithm::new(
                self.graph,
                self.index,
                location.lat,
                location.lon,
                self.options,
                &is_acceptable,
            );
            if let Some(is_better) = self.is_better {
                resolver = resolver.with_is_better(is_better);
            }
            resolver.run()?;

            match resolver.result()? {
                Some(&rp) => {
                    self.router_points.push(rp);
                    self.location_indices.push(idx);
                }
                None => {
                    self.errors
                        .insert(idx, RouterPointError::not_resolvable(location.lat, location.lon));
                }
            }
        }

        log::debug!(
            "resolved {} of {} locations",
            self.router_points.len(),
            self.locations.len()
        );
        Ok(())
    }
}

impl<H: WeightHandler, I: SpatialIndex + ?Sized> Algorithm for MassResolvingAlgorithm<'_, H, I> {
    fn run(&mut self) -> Result<(), Error> {
        self.state.start()?;
        let outcome = self.resolve_all();
        self.state.finish(&outcome);
        outcome
    }

    fn state(&self) -> &RunState {
        &self.state
    }
}

impl<H: WeightHandler, I: SpatialIndex + ?Sized> MassResolver for MassResolvingAlgorithm<'_, H, I> {
    fn router_points(&self) -> Result<&[RouterPoint], Error> {
        self.state.check_succeeded()?;
        Ok(&self.router_points)
    }

    fn errors(&self) -> Result<&BTreeMap<usize, RouterPointError>, Error> {
        self.state.check_succeeded()?;
        Ok(&self.errors)
    }

    fn location_index_of(&self, resolved: usize) -> Result<usize, Error> {
        self.state.check_succeeded()?;
        self.location_indices
            .get(resolved)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: resolved,
                len: self.location_indices.len(),
            })
    }

    fn resolved_index_of(&self, location: usize) -> Result<Option<usize>, Error> {
        self.state.check_succeeded()?;
        if location >= self.locations.len() {
            return Err(Error::IndexOutOfRange {
                index: location,
                len: self.locations.len(),
            });
        }
        Ok(self.location_indices.binary_search(&location).ok())
    }
}
