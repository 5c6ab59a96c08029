// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::BoundingBox;
use crate::{earth_distance, EdgeId, Graph};

/// Recommended maximum distance between two indexed points of the same edge, in meters.
pub const DEFAULT_SAMPLE_SPACING: f32 = 100.0;

/// Finds candidate edges for snapping positions onto a [Graph].
pub trait SpatialIndex {
    /// Returns ids of edges close to or within the provided box, sorted and without duplicates.
    ///
    /// Implementations may return edges which turn out to lie outside of the box;
    /// callers must check the actual geometry.
    fn search_edges(&self, bbox: &BoundingBox) -> Vec<EdgeId>;
}

#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    lat: f32,
    lon: f32,
    edge: EdgeId,
}

#[derive(Debug, Clone)]
struct KDNode {
    pivot: IndexedPoint,
    left: Option<Box<KDNode>>,
    right: Option<Box<KDNode>>,
}

/// EdgeIndex implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over the geometry of all edges of a [Graph], speeding up the search for edges
/// near a position. [Graph] itself implements [SpatialIndex] by checking every edge,
/// which takes significantly more time than resolving against an EdgeIndex on large graphs.
///
/// Every vertex and shape point is indexed, together with additional sample points
/// placed along each segment, so that no two consecutive indexed points of an edge are
/// more than `sample_spacing` meters apart. Boxes extending at least `sample_spacing / 2`
/// beyond a segment point are thus guaranteed to find that segment.
///
/// This implementation assumes euclidean geometry, even though distances are measured
/// with [earth_distance]. This results in undefined behavior when edges
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude).
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    root: Option<Box<KDNode>>,
    sample_spacing: f32,
}

impl EdgeIndex {
    /// Builds an index over all edges of the graph, with [DEFAULT_SAMPLE_SPACING].
    pub fn build(g: &Graph) -> Self {
        Self::with_sample_spacing(g, DEFAULT_SAMPLE_SPACING)
    }

    /// Builds an index over all edges of the graph, with a custom (positive)
    /// maximum distance between indexed points.
    pub fn with_sample_spacing(g: &Graph, sample_spacing: f32) -> Self {
        assert!(sample_spacing.is_finite() && sample_spacing > 0.0);

        let mut points = Vec::new();
        for edge in 0..g.edge_count() as EdgeId {
            let geometry = g
                .edge_geometry(edge)
                .expect("edge ids below edge_count must exist");

            points.push(IndexedPoint {
                lat: geometry[0].lat,
                lon: geometry[0].lon,
                edge,
            });

            for pair in geometry.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let length = earth_distance(a.lat, a.lon, b.lat, b.lon);
                let steps = (length / sample_spacing).ceil().max(1.0) as usize;
                for k in 1..=steps {
                    let t = k as f32 / steps as f32;
                    points.push(IndexedPoint {
                        lat: a.lat + t * (b.lat - a.lat),
                        lon: a.lon + t * (b.lon - a.lon),
                        edge,
                    });
                }
            }
        }

        log::debug!(
            "indexed {} edges with {} points",
            g.edge_count(),
            points.len()
        );

        Self {
            root: KDNode::build(points.as_mut_slice(), false),
            sample_spacing,
        }
    }

    /// Returns the maximum distance between two consecutive indexed points of an edge, in meters.
    pub fn sample_spacing(&self) -> f32 {
        self.sample_spacing
    }
}

impl SpatialIndex for EdgeIndex {
    fn search_edges(&self, bbox: &BoundingBox) -> Vec<EdgeId> {
        let mut found = Vec::new();
        if let Some(ref root) = self.root {
            root.search(bbox, false, &mut found);
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}

impl KDNode {
    fn search(&self, bbox: &BoundingBox, lon_divides: bool, found: &mut Vec<EdgeId>) {
        if bbox.contains(self.pivot.lat, self.pivot.lon) {
            found.push(self.pivot.edge);
        }

        let (axis, min, max) = if lon_divides {
            (self.pivot.lon, bbox.min_lon, bbox.max_lon)
        } else {
            (self.pivot.lat, bbox.min_lat, bbox.max_lat)
        };

        // Points equal to the pivot on the splitting axis may end up in either branch
        if min <= axis {
            if let Some(ref left) = self.left {
                left.search(bbox, !lon_divides, found);
            }
        }
        if max >= axis {
            if let Some(ref right) = self.right {
                right.search(bbox, !lon_divides, found);
            }
        }
    }

    fn build(points: &mut [IndexedPoint], lon_divides: bool) -> Option<Box<Self>> {
        match points.len() {
            0 => None,
            1 => Some(Box::new(Self {
                pivot: points[0],
                left: None,
                right: None,
            })),
            _ => {
                if lon_divides {
                    points.sort_by(|a, b| a.lon.total_cmp(&b.lon));
                } else {
                    points.sort_by(|a, b| a.lat.total_cmp(&b.lat));
                }
                let median = points.len() / 2;
                let pivot = points[median];
                let (left, right_and_pivot) = points.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Box::new(Self {
                    pivot,
                    left: Self::build(left, !lon_divides),
                    right: Self::build(right, !lon_divides),
                }))
            }
        }
    }
}
