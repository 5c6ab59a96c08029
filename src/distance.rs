// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Length of one degree of latitude, in meters.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS * std::f64::consts::PI / 180.0;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in meters.
pub fn earth_distance(lat1: f32, lon1: f32, lat2: f32, lon2: f32) -> f32 {
    let lat1 = (lat1 as f64).to_radians();
    let lon1 = (lon1 as f64).to_radians();
    let lat2 = (lat2 as f64).to_radians();
    let lon2 = (lon2 as f64).to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    (EARTH_DIAMETER * h.sqrt().asin()) as f32
}

/// Checks if a position is a finite coordinate within the valid latitude and longitude ranges.
pub fn is_valid_coordinate(lat: f32, lon: f32) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// Axis-aligned box in lat-lon space, with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f32,
    pub min_lon: f32,
    pub max_lat: f32,
    pub max_lon: f32,
}

impl BoundingBox {
    /// Creates a box spanning approximately `meters` in every direction from the given position.
    ///
    /// Near the poles the longitude span is widened to the full [-180°, 180°] range.
    pub fn around(lat: f32, lon: f32, meters: f32) -> Self {
        let dlat = meters as f64 / METERS_PER_DEGREE;
        let cos_lat = (lat as f64).to_radians().cos();
        let dlon = if cos_lat > 1e-6 { dlat / cos_lat } else { 360.0 };

        Self {
            min_lat: (lat as f64 - dlat) as f32,
            min_lon: (lon as f64 - dlon).max(-180.0) as f32,
            max_lat: (lat as f64 + dlat) as f32,
            max_lon: (lon as f64 + dlon).min(180.0) as f32,
        }
    }

    /// Creates the smallest box containing all provided positions,
    /// or [None] if there are no positions.
    pub fn covering<I: IntoIterator<Item = (f32, f32)>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc, (lat, lon)| {
            Some(match acc {
                None => Self {
                    min_lat: lat,
                    min_lon: lon,
                    max_lat: lat,
                    max_lon: lon,
                },
                Some(b) => Self {
                    min_lat: b.min_lat.min(lat),
                    min_lon: b.min_lon.min(lon),
                    max_lat: b.max_lat.max(lat),
                    max_lon: b.max_lon.max(lon),
                },
            })
        })
    }

    pub fn contains(&self, lat: f32, lon: f32) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }
}

/// Closest point of a segment to some position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentProjection {
    /// Position of the closest point along the segment, from 0 (start) to 1 (end).
    pub t: f32,
    pub lat: f32,
    pub lon: f32,
    /// Distance from the position to the closest point, in meters.
    pub distance: f32,
}

/// Projects a position onto the segment `a`-`b` (given as lat-lon pairs).
///
/// The projection is done on a local equirectangular plane centered at the position,
/// which is accurate for the short distances considered when snapping to edges.
pub(crate) fn project_on_segment(
    lat: f32,
    lon: f32,
    a: (f32, f32),
    b: (f32, f32),
) -> SegmentProjection {
    let scale = (lat as f64).to_radians().cos();
    let (px, py) = (lon as f64 * scale, lat as f64);
    let (ax, ay) = (a.1 as f64 * scale, a.0 as f64);
    let (bx, by) = (b.1 as f64 * scale, b.0 as f64);

    let dx = bx - ax;
    let dy = by - ay;
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let proj_lat = (a.0 as f64 + t * (b.0 as f64 - a.0 as f64)) as f32;
    let proj_lon = (a.1 as f64 + t * (b.1 as f64 - a.1 as f64)) as f32;

    SegmentProjection {
        t: t as f32,
        lat: proj_lat,
        lon: proj_lon,
        distance: earth_distance(lat, lon, proj_lat, proj_lon),
    }
}
