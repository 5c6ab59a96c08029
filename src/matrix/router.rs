// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use super::WeightRouter;
use crate::{Algorithm, Error, Graph, OneToMany, RouterPoint, WeightHandler};

/// [WeightRouter] running one unbounded [OneToMany] search per point over a [Graph].
///
/// Points which can't be routed are chosen greedily: as long as some ordered pair
/// of the remaining points has no path, the point involved in the most such pairs
/// (the one with the highest index on ties) is marked as invalid.
/// All remaining points are mutually reachable.
#[derive(Debug, Clone, Copy)]
pub struct GraphRouter<'g> {
    graph: &'g Graph,
}

impl<'g> GraphRouter<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }
}

impl<H: WeightHandler> WeightRouter<H> for GraphRouter<'_> {
    fn calculate_weights(
        &self,
        handler: &H,
        points: &[RouterPoint],
        invalids: &mut BTreeSet<usize>,
    ) -> Result<Vec<Vec<H::Weight>>, Error> {
        let mut weights = Vec::with_capacity(points.len());
        let mut reachable = Vec::with_capacity(points.len());

        for source in points {
            let mut search = OneToMany::new(self.graph, handler, *source, points, handler.infinite());
            search.run()?;

            weights.push(search.weights()?);
            reachable.push(
                (0..points.len())
                    .map(|target| search.try_path(target).map(|p| p.is_some()))
                    .collect::<Result<Vec<bool>, Error>>()?,
            );
        }

        flag_unroutable(&reachable, invalids);
        Ok(weights)
    }
}

fn flag_unroutable(reachable: &[Vec<bool>], invalids: &mut BTreeSet<usize>) {
    let n = reachable.len();
    let is_unreachable = |from: usize, to: usize| {
        !reachable[from][to] && !invalids.contains(&from) && !invalids.contains(&to)
    };

    let mut unreachable_pairs = vec![0_usize; n];
    for from in 0..n {
        for to in 0..n {
            if is_unreachable(from, to) {
                unreachable_pairs[from] += 1;
                unreachable_pairs[to] += 1;
            }
        }
    }

    loop {
        let worst = (0..n)
            .filter(|i| !invalids.contains(i))
            .max_by_key(|&i| (unreachable_pairs[i], i));

        let dropped = match worst {
            Some(i) if unreachable_pairs[i] > 0 => i,
            _ => break,
        };

        log::debug!(
            "point {} is not routable ({} unreachable pairs)",
            dropped,
            unreachable_pairs[dropped]
        );

        // Pairs involving the dropped point no longer count against the others
        for other in (0..n).filter(|&i| i != dropped && !invalids.contains(&i)) {
            if !reachable[dropped][other] {
                unreachable_pairs[other] -= 1;
            }
            if !reachable[other][dropped] {
                unreachable_pairs[other] -= 1;
            }
        }
        unreachable_pairs[dropped] = 0;
        invalids.insert(dropped);
    }
}
