// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod augmented;
mod default;

pub use augmented::{AugmentedWeightHandler, ProfileMetric, Weight};
pub use default::DefaultWeightHandler;

use std::fmt::Debug;

/// Directions in which an edge may be traversed, relative to its stored direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Both,
    Forward,
    Backward,
}

impl Direction {
    /// Checks if an edge may be traversed in (`forward == true`) or
    /// against (`forward == false`) its stored direction.
    pub fn allows(self, forward: bool) -> bool {
        match self {
            Direction::Both => true,
            Direction::Forward => forward,
            Direction::Backward => !forward,
        }
    }
}

/// Seconds per meter at 50 km/h, the speed assumed by [Factor::new].
pub const DEFAULT_SPEED_FACTOR: f32 = 3.6 / 50.0;

/// Cost multipliers derived from an edge's profile.
///
/// A factor with a zero `value` marks an edge which can't be used at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factor {
    /// Multiplier of the length, to express preference for a specific edge.
    pub value: f32,

    /// Seconds needed to traverse one meter of the edge.
    pub speed_factor: f32,

    pub direction: Direction,
}

impl Factor {
    /// Factor of edges which must not be traversed.
    pub const NO_FACTOR: Self = Self {
        value: 0.0,
        speed_factor: 0.0,
        direction: Direction::Both,
    };

    /// Creates a factor with the given cost multiplier, traversed at
    /// [DEFAULT_SPEED_FACTOR]. Use [Factor::with_speed] to set the speed.
    pub fn new(value: f32, direction: Direction) -> Self {
        Self {
            value,
            speed_factor: DEFAULT_SPEED_FACTOR,
            direction,
        }
    }

    pub fn with_speed(value: f32, speed_factor: f32, direction: Direction) -> Self {
        Self {
            value,
            speed_factor,
            direction,
        }
    }

    /// Checks if the edge may be used at all.
    pub fn is_traversable(&self) -> bool {
        self.value != 0.0
    }
}

/// Arithmetic and comparisons over an opaque weight type.
///
/// All search and path-composition code is written against this trait, so that
/// the same algorithms work for plain scalar costs ([DefaultWeightHandler])
/// and for costs augmented with time and distance ([AugmentedWeightHandler]).
///
/// Weights produced by [WeightHandler::calculate] must not be negative.
pub trait WeightHandler {
    type Weight: Copy + Debug;

    /// The weight of an empty path.
    fn zero(&self) -> Self::Weight;

    /// A weight which no real path can exceed, used for unreachable targets.
    fn infinite(&self) -> Self::Weight;

    fn add(&self, a: Self::Weight, b: Self::Weight) -> Self::Weight;

    fn subtract(&self, a: Self::Weight, b: Self::Weight) -> Self::Weight;

    fn is_smaller_than(&self, a: Self::Weight, b: Self::Weight) -> bool;

    fn is_larger_than(&self, a: Self::Weight, b: Self::Weight) -> bool {
        self.is_smaller_than(b, a)
    }

    /// Scalar used to order the search frontier. Must be monotone with
    /// [WeightHandler::is_smaller_than].
    fn metric(&self, w: Self::Weight) -> f32;

    /// Returns the factor for edges with the given profile.
    fn factor(&self, profile: u16) -> Factor;

    /// Converts a traversal of `distance` meters over an edge with the given profile
    /// into a weight increment. The returned [Factor] tells whether (and in which
    /// directions) the edge can be traversed at all.
    fn calculate(&self, profile: u16, distance: f32) -> (Self::Weight, Factor);
}
