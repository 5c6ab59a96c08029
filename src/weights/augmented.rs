// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;
use std::ops::{Add, Sub};

use super::{Factor, WeightHandler};

/// Which component of a [Weight] a profile optimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileMetric {
    #[default]
    Custom,
    TimeInSeconds,
    DistanceInMeters,
}

/// A weight augmented with time and distance.
///
/// Only `value` takes part in comparisons; `time` and `distance`
/// are carried along for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Weight {
    pub value: f32,

    /// Time in seconds.
    pub time: f32,

    /// Distance in meters.
    pub distance: f32,
}

impl Weight {
    pub const ZERO: Self = Self {
        value: 0.0,
        time: 0.0,
        distance: 0.0,
    };

    pub const MAX: Self = Self {
        value: f32::MAX,
        time: f32::MAX,
        distance: f32::MAX,
    };

    /// Returns the component of this weight corresponding to the given metric.
    pub fn for_metric(&self, metric: ProfileMetric) -> f32 {
        match metric {
            ProfileMetric::Custom => self.value,
            ProfileMetric::TimeInSeconds => self.time,
            ProfileMetric::DistanceInMeters => self.distance,
        }
    }
}

impl Add for Weight {
    type Output = Weight;

    fn add(self, rhs: Weight) -> Weight {
        Weight {
            value: self.value + rhs.value,
            time: self.time + rhs.time,
            distance: self.distance + rhs.distance,
        }
    }
}

impl Sub for Weight {
    type Output = Weight;

    fn sub(self, rhs: Weight) -> Weight {
        Weight {
            value: self.value - rhs.value,
            time: self.time - rhs.time,
            distance: self.distance - rhs.distance,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}m {}s", self.value, self.distance, self.time)
    }
}

/// [Weights](Weight) tracking cost, time and distance at once.
#[derive(Debug, Clone)]
pub struct AugmentedWeightHandler<F> {
    get_factor: F,
}

impl<F: Fn(u16) -> Factor> AugmentedWeightHandler<F> {
    pub fn new(get_factor: F) -> Self {
        Self { get_factor }
    }
}

impl<F: Fn(u16) -> Factor> WeightHandler for AugmentedWeightHandler<F> {
    type Weight = Weight;

    fn zero(&self) -> Weight {
        Weight::ZERO
    }

    fn infinite(&self) -> Weight {
        Weight::MAX
    }

    fn add(&self, a: Weight, b: Weight) -> Weight {
        a + b
    }

    fn subtract(&self, a: Weight, b: Weight) -> Weight {
        a - b
    }

    fn is_smaller_than(&self, a: Weight, b: Weight) -> bool {
        a.value < b.value
    }

    fn metric(&self, w: Weight) -> f32 {
        w.value
    }

    fn factor(&self, profile: u16) -> Factor {
        (self.get_factor)(profile)
    }

    fn calculate(&self, profile: u16, distance: f32) -> (Weight, Factor) {
        let factor = self.factor(profile);
        let w = Weight {
            value: distance * factor.value,
            time: distance * factor.speed_factor,
            distance,
        };
        (w, factor)
    }
}
