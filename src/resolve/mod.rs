// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod mass;
mod resolver;

pub use mass::{MassResolver, MassResolvingAlgorithm};
pub use resolver::ResolveAlgorithm;

/// Default half-size of the box probed in the spatial index, in meters.
pub const DEFAULT_SEARCH_OFFSET: f32 = 1000.0;

/// Default maximum distance between a location and the edge it's snapped onto, in meters.
pub const DEFAULT_MAX_EDGE_DISTANCE: f32 = 50.0;

/// Options for snapping locations onto a [Graph](crate::Graph).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    /// Distance from the location, in meters, in which the spatial index is probed for
    /// candidate edges. Defaults to [DEFAULT_SEARCH_OFFSET].
    pub search_offset: f32,

    /// Maximum distance, in meters, between the location and the closest point of
    /// an edge for that edge to be considered. Defaults to [DEFAULT_MAX_EDGE_DISTANCE].
    pub max_distance: f32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            search_offset: DEFAULT_SEARCH_OFFSET,
            max_distance: DEFAULT_MAX_EDGE_DISTANCE,
        }
    }
}
