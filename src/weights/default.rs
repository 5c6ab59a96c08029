// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{Factor, WeightHandler};

/// Scalar weights: the length of an edge multiplied by its [Factor::value].
///
/// `get_factor` plays the role of a vehicle profile, translating an edge's
/// profile payload into a [Factor].
#[derive(Debug, Clone)]
pub struct DefaultWeightHandler<F> {
    get_factor: F,
}

impl<F: Fn(u16) -> Factor> DefaultWeightHandler<F> {
    pub fn new(get_factor: F) -> Self {
        Self { get_factor }
    }
}

impl<F: Fn(u16) -> Factor> WeightHandler for DefaultWeightHandler<F> {
    type Weight = f32;

    fn zero(&self) -> f32 {
        0.0
    }

    fn infinite(&self) -> f32 {
        f32::MAX
    }

    fn add(&self, a: f32, b: f32) -> f32 {
        a + b
    }

    fn subtract(&self, a: f32, b: f32) -> f32 {
        a - b
    }

    fn is_smaller_than(&self, a: f32, b: f32) -> bool {
        a < b
    }

    fn metric(&self, w: f32) -> f32 {
        w
    }

    fn factor(&self, profile: u16) -> Factor {
        (self.get_factor)(profile)
    }

    fn calculate(&self, profile: u16, distance: f32) -> (f32, Factor) {
        let factor = self.factor(profile);
        (distance * factor.value, factor)
    }
}
