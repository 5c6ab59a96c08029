// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};

use super::{shrink_list, shrink_matrix, WeightRouter};
use crate::{
    Algorithm, Error, MassResolver, RouterPoint, RouterPointError, RunState, WeightHandler,
};

/// Computes a weight matrix between many locations, leaving out locations
/// which can't be routed.
///
/// Locations are first resolved with a [MassResolver] (which is run, unless it has
/// already been), and then passed to a [WeightRouter]. Points flagged by the router
/// as non-routable are removed from the resolved points and from both dimensions
/// of the matrix, and get a [NotRoutable](crate::RouterPointErrorCode::NotRoutable) error.
///
/// Two kinds of indices are in play: _location_ indices into the locations originally
/// given to the mass resolver, and _corrected_ indices into [WeightMatrixAlgorithm::router_points]
/// and [WeightMatrixAlgorithm::weights]. Errors are keyed by location index.
/// Locations which failed to resolve have their errors reported by the mass resolver.
pub struct WeightMatrixAlgorithm<'a, H, R, M>
where
    H: WeightHandler,
    R: WeightRouter<H> + ?Sized,
    M: MassResolver,
{
    router: &'a R,
    handler: &'a H,
    mass_resolver: M,
    state: RunState,
    errors: BTreeMap<usize, RouterPointError>,
    location_indices: Vec<usize>,
    router_points: Vec<RouterPoint>,
    weights: Vec<Vec<H::Weight>>,
}

impl<'a, H, R, M> WeightMatrixAlgorithm<'a, H, R, M>
where
    H: WeightHandler,
    R: WeightRouter<H> + ?Sized,
    M: MassResolver,
{
    pub fn new(router: &'a R, handler: &'a H, mass_resolver: M) -> Self {
        Self {
            router,
            handler,
            mass_resolver,
            state: RunState::NotRun,
            errors: BTreeMap::new(),
            location_indices: Vec::new(),
            router_points: Vec::new(),
            weights: Vec::new(),
        }
    }

    fn calculate(&mut self) -> Result<(), Error> {
        if !self.mass_resolver.has_run() {
            self.mass_resolver.run()?;
        }

        let points = self.mass_resolver.router_points()?.to_vec();
        let location_indices = (0..points.len())
            .map(|i| self.mass_resolver.location_index_of(i))
            .collect::<Result<Vec<usize>, Error>>()?;

        let mut invalids = BTreeSet::new();
        let weights = self
            .router
            .calculate_weights(self.handler, &points, &mut invalids)?;

        for &invalid in &invalids {
            let location = *location_indices.get(invalid).ok_or(Error::IndexOutOfRange {
                index: invalid,
                len: location_indices.len(),
            })?;
            log::warn!("location {} is not routable, dropping it from the matrix", location);
            self.errors.insert(location, RouterPointError::not_routable());
        }

        self.router_points = shrink_list(&points, &invalids);
        self.location_indices = shrink_list(&location_indices, &invalids);
        self.weights = shrink_matrix(&weights, &invalids);

        log::debug!(
            "weight matrix of {} points computed ({} dropped as not routable)",
            self.router_points.len(),
            invalids.len()
        );
        Ok(())
    }

    /// Returns the weights between all routable points, indexed by corrected indices.
    pub fn weights(&self) -> Result<&[Vec<H::Weight>], Error> {
        self.state.check_succeeded()?;
        Ok(&self.weights)
    }

    /// Returns all resolved and routable points, indexed by corrected indices.
    pub fn router_points(&self) -> Result<&[RouterPoint], Error> {
        self.state.check_succeeded()?;
        Ok(&self.router_points)
    }

    /// Returns errors of resolved, but non-routable locations, keyed by location index.
    pub fn errors(&self) -> Result<&BTreeMap<usize, RouterPointError>, Error> {
        self.state.check_succeeded()?;
        Ok(&self.errors)
    }

    /// Maps a location index to a corrected index,
    /// or [None] if the location didn't make it into the matrix.
    pub fn corrected_index_of(&self, location: usize) -> Result<Option<usize>, Error> {
        self.state.check_succeeded()?;
        Ok(self.location_indices.iter().position(|&l| l == location))
    }

    /// Maps a corrected index back to the location index.
    pub fn original_index_of(&self, corrected: usize) -> Result<usize, Error> {
        self.state.check_succeeded()?;
        self.location_indices
            .get(corrected)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: corrected,
                len: self.location_indices.len(),
            })
    }

    pub fn mass_resolver(&self) -> &M {
        &self.mass_resolver
    }

    pub fn router(&self) -> &'a R {
        self.router
    }
}

impl<H, R, M> Algorithm for WeightMatrixAlgorithm<'_, H, R, M>
where
    H: WeightHandler,
    R: WeightRouter<H> + ?Sized,
    M: MassResolver,
{
    fn run(&mut self) -> Result<(), Error> {
        self.state.start()?;
        let outcome = self.calculate();
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
        earth_distance, is_valid_coordinate, Coordinate, DefaultWeightHandler, Direction,
        EdgeIndex, Factor, Graph, GraphRouter, MassResolvingAlgorithm, ResolveOptions,
        RouterPointErrorCode,
    };

    /// Great-circle distances between all points, with a fixed set of invalid points.
    struct RouterMock {
        invalids: BTreeSet<usize>,
    }

    impl RouterMock {
        fn new(invalids: &[usize]) -> Self {
            Self {
                invalids: invalids.iter().copied().collect(),
            }
        }
    }

    impl<H: WeightHandler<Weight = f32>> WeightRouter<H> for RouterMock {
        fn calculate_weights(
            &self,
            _: &H,
            points: &[RouterPoint],
            invalids: &mut BTreeSet<usize>,
        ) -> Result<Vec<Vec<f32>>, Error> {
            invalids.extend(self.invalids.iter().copied());
            Ok(points
                .iter()
                .map(|a| {
                    points
                        .iter()
                        .map(|b| earth_distance(a.latitude, a.longitude, b.latitude, b.longitude))
                        .collect()
                })
                .collect())
        }
    }

    /// Resolves every valid coordinate onto a made-up edge.
    struct MassResolverMock {
        locations: Vec<Coordinate>,
        state: RunState,
        router_points: Vec<RouterPoint>,
        location_indices: Vec<usize>,
        errors: BTreeMap<usize, RouterPointError>,
    }

    impl MassResolverMock {
        fn new(locations: &[(f32, f32)]) -> Self {
            Self {
                locations: locations
                    .iter()
                    .map(|&(lat, lon)| Coordinate { lat, lon })
                    .collect(),
                state: RunState::NotRun,
                router_points: Vec::new(),
                location_indices: Vec::new(),
                errors: BTreeMap::new(),
            }
        }
    }

    impl Algorithm for MassResolverMock {
        fn run(&mut self) -> Result<(), Error> {
            self.state.start()?;
            for (idx, c) in self.locations.iter().enumerate() {
                if is_valid_coordinate(c.lat, c.lon) {
                    self.router_points
                        .push(RouterPoint::new(c.lat, c.lon, idx as u32, 0));
                    self.location_indices.push(idx);
                } else {
                    self.errors
                        .insert(idx, RouterPointError::not_resolvable(c.lat, c.lon));
                }
            }
            let outcome = Ok(());
            self.state.finish(&outcome);
            outcome
        }

        fn state(&self) -> &RunState {
            &self.state
        }
    }

    impl MassResolver for MassResolverMock {
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
            Ok(self.location_indices[resolved])
        }

        fn resolved_index_of(&self, location: usize) -> Result<Option<usize>, Error> {
            self.state.check_succeeded()?;
            Ok(self.location_indices.iter().position(|&l| l == location))
        }
    }

    fn handler() -> DefaultWeightHandler<impl Fn(u16) -> Factor> {
        DefaultWeightHandler::new(|_| Factor::new(1.0, Direction::Both))
    }

    #[test]
    fn two_points() {
        let router = RouterMock::new(&[]);
        let h = handler();
        let mut m = WeightMatrixAlgorithm::new(
            &router,
            &h,
            MassResolverMock::new(&[(0.0, 0.0), (1.0, 1.0)]),
        );
        m.run().unwrap();

        assert!(m.has_run());
        assert!(m.has_succeeded());
        assert!(m.errors().unwrap().is_empty());

        let expected = earth_distance(0.0, 0.0, 1.0, 1.0);
        let w = m.weights().unwrap();
        assert_eq!(w[0][0], 0.0);
        assert_almost_eq!(w[0][1], expected, 0.1);
        assert_almost_eq!(w[1][0], expected, 0.1);
        assert_eq!(w[1][1], 0.0);

        assert_eq!(m.router_points().unwrap().len(), 2);
        assert_eq!(m.corrected_index_of(0), Ok(Some(0)));
        assert_eq!(m.corrected_index_of(1), Ok(Some(1)));
    }

    #[test]
    fn unresolvable_second_point() {
        let router = RouterMock::new(&[]);
        let h = handler();
        let mut m = WeightMatrixAlgorithm::new(
            &router,
            &h,
            MassResolverMock::new(&[(0.0, 0.0), (180.0, 1.0)]),
        );
        m.run().unwrap();

        assert!(m.errors().unwrap().is_empty());
        let resolver_errors = m.mass_resolver().errors().unwrap();
        assert_eq!(resolver_errors.len(), 1);
        assert!(resolver_errors.contains_key(&1));

        assert_eq!(m.weights().unwrap().to_vec(), vec![vec![0.0]]);
        assert_eq!(m.router_points().unwrap().len(), 1);
        assert_eq!(m.corrected_index_of(0), Ok(Some(0)));
        assert_eq!(m.corrected_index_of(1), Ok(None));
        assert_eq!(m.original_index_of(0), Ok(0));
    }

    #[test]
    fn unresolvable_first_point() {
        let router = RouterMock::new(&[]);
        let h = handler();
        let mut m = WeightMatrixAlgorithm::new(
            &router,
            &h,
            MassResolverMock::new(&[(180.0, 0.0), (1.0, 1.0)]),
        );
        m.run().unwrap();

        assert!(m.errors().unwrap().is_empty());
        assert!(m.mass_resolver().errors().unwrap().contains_key(&0));
        assert_eq!(m.weights().unwrap().to_vec(), vec![vec![0.0]]);
        assert_eq!(m.corrected_index_of(1), Ok(Some(0)));
        assert_eq!(m.original_index_of(0), Ok(1));
        assert_eq!(m.mass_resolver().resolved_index_of(1), Ok(Some(0)));
        assert_eq!(m.mass_resolver().location_index_of(0), Ok(1));
    }

    #[test]
    fn not_routable_point() {
        for (invalid, valid) in [(1, 0), (0, 1)] {
            let router = RouterMock::new(&[invalid]);
            let h = handler();
            let mut m = WeightMatrixAlgorithm::new(
                &router,
                &h,
                MassResolverMock::new(&[(0.0, 0.0), (1.0, 1.0)]),
            );
            m.run().unwrap();

            let errors = m.errors().unwrap();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[&invalid].code, RouterPointErrorCode::NotRoutable);
            assert!(m.mass_resolver().errors().unwrap().is_empty());

            assert_eq!(m.weights().unwrap().to_vec(), vec![vec![0.0]]);
            assert_eq!(m.router_points().unwrap().len(), 1);
            assert_eq!(m.corrected_index_of(valid), Ok(Some(0)));
            assert_eq!(m.corrected_index_of(invalid), Ok(None));
            assert_eq!(m.original_index_of(0), Ok(valid));
        }
    }

    #[test]
    fn index_mapping_invariant() {
        let locations = [
            (0.0, 0.0),
            (95.0, 0.0),
            (0.5, 0.5),
            (1.0, 1.0),
            (0.0, 200.0),
            (2.0, 2.0),
        ];
        let router = RouterMock::new(&[1, 3]); // resolved indices, that is locations 2 and 5
        let h = handler();
        let mut m = WeightMatrixAlgorithm::new(&router, &h, MassResolverMock::new(&locations));
        m.run().unwrap();

        let routing_errors = m.errors().unwrap();
        let resolving_errors = m.mass_resolver().errors().unwrap();
        assert_eq!(routing_errors.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(resolving_errors.keys().copied().collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(
            m.router_points().unwrap().len() + routing_errors.len() + resolving_errors.len(),
            locations.len()
        );

        let weights = m.weights().unwrap();
        assert_eq!(weights.len(), 2);
        assert!(weights.iter().all(|row| row.len() == 2));

        for location in [0, 3] {
            let corrected = m.corrected_index_of(location).unwrap().unwrap();
            assert_eq!(m.original_index_of(corrected), Ok(location));
        }
        assert_eq!(
            m.original_index_of(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn already_resolved() {
        let router = RouterMock::new(&[]);
        let h = handler();
        let mut resolver = MassResolverMock::new(&[(0.0, 0.0), (1.0, 1.0)]);
        resolver.run().unwrap();

        let mut m = WeightMatrixAlgorithm::new(&router, &h, resolver);
        m.run().unwrap();
        assert_eq!(m.router_points().unwrap().len(), 2);
    }

    #[test]
    fn single_use() {
        let router = RouterMock::new(&[]);
        let h = handler();
        let mut m = WeightMatrixAlgorithm::new(&router, &h, MassResolverMock::new(&[(0.0, 0.0)]));

        assert_eq!(m.weights().unwrap_err(), Error::NotRun);
        assert_eq!(m.router_points().unwrap_err(), Error::NotRun);
        assert_eq!(m.errors().unwrap_err(), Error::NotRun);
        assert_eq!(m.corrected_index_of(0).unwrap_err(), Error::NotRun);
        assert_eq!(m.original_index_of(0).unwrap_err(), Error::NotRun);

        m.run().unwrap();
        assert_eq!(m.run().unwrap_err(), Error::AlreadyRun);
    }

    #[test]
    fn on_graph() {
        let mut g = Graph::new();
        g.add_vertex(0.0, 0.0);
        g.add_vertex(1.0, 1.0);
        g.add_vertex(50.0, 50.0);
        g.add_vertex(50.0, 50.01);
        g.add_edge(0, 1, 0, vec![]);
        g.add_edge(2, 3, 0, vec![]);
        let index = EdgeIndex::build(&g);
        let h = handler();
        let locations = [
            Coordinate { lat: 0.0, lon: 0.0 },
            Coordinate { lat: 180.0, lon: 1.0 },
            Coordinate { lat: 1.0, lon: 1.0 },
            Coordinate {
                lat: 50.0,
                lon: 50.005,
            },
        ];
        let router = GraphRouter::new(&g);
        let resolver = MassResolvingAlgorithm::new(&g, &index, &h, &locations, ResolveOptions::default());

        let mut m = WeightMatrixAlgorithm::new(&router, &h, resolver);
        m.run().unwrap();

        // Location 1 can't be resolved, location 3 lies on a separate component
        assert!(m.mass_resolver().errors().unwrap().contains_key(&1));
        assert_eq!(m.errors().unwrap().keys().copied().collect::<Vec<_>>(), vec![3]);

        let expected = earth_distance(0.0, 0.0, 1.0, 1.0);
        let w = m.weights().unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(w[0][0], 0.0);
        assert_eq!(w[1][1], 0.0);
        assert_almost_eq!(w[0][1], expected, 1.0);
        assert_almost_eq!(w[1][0], expected, 1.0);
        assert_eq!(m.corrected_index_of(2), Ok(Some(1)));
    }
}
