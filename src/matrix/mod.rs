// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use crate::{Error, RouterPoint, WeightHandler};

mod router;
mod weight_matrix;

pub use router::GraphRouter;
pub use weight_matrix::WeightMatrixAlgorithm;

/// Computes full weight matrices between [RouterPoints](RouterPoint).
pub trait WeightRouter<H: WeightHandler> {
    /// Returns the weights between all ordered pairs of `points`, with `result[i][j]`
    /// being the weight from `points[i]` to `points[j]`.
    ///
    /// Indices of points which can't be routed to or from are added to `invalids`.
    /// Their rows and columns are still present in the result, but carry no meaning.
    fn calculate_weights(
        &self,
        handler: &H,
        points: &[RouterPoint],
        invalids: &mut BTreeSet<usize>,
    ) -> Result<Vec<Vec<H::Weight>>, Error>;
}

/// Copies a list, leaving out elements at the `removed` indices.
pub fn shrink_list<T: Clone>(list: &[T], removed: &BTreeSet<usize>) -> Vec<T> {
    list.iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, x)| x.clone())
        .collect()
}

/// Copies a square matrix, leaving out both the rows and the columns at the `removed` indices.
pub fn shrink_matrix<T: Clone>(matrix: &[Vec<T>], removed: &BTreeSet<usize>) -> Vec<Vec<T>> {
    shrink_list(matrix, removed)
        .iter()
        .map(|row| shrink_list(row, removed))
        .collect()
}
