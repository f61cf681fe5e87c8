//! Planar geometry helpers
//!
//! Degree/km conversions, a bounded-tail normal sampler, an equirectangular
//! projection, and even-odd point-in-polygon tests. All coordinates passed as
//! `DVec2` are `(x = lng, y = lat)` in degrees unless stated otherwise.

use glam::DVec2;
use rand::Rng;

/// Kilometres per degree of latitude
pub const KM_PER_DEG_LAT: f64 = 110.574;

/// Kilometres per degree of longitude at the equator
pub const KM_PER_DEG_LNG: f64 = 111.320;

/// Latitude at which the projection's longitude scale is fixed
///
/// Mid-range of the covered mid-latitude region. Using one reference keeps
/// the projected metric consistent across every cluster.
///
/// Distances computed from [`project_to_km`] are projected km, not ground
/// km. East-west they shrink by `cos(lat) / cos(38°)` away from the
/// reference: at 42.3°N (Brookline) a 0.12 km projected gap is about
/// 0.113 km on the ground, while south of 38° it is slightly wider.
pub const PROJECTION_REFERENCE_LAT: f64 = 38.0;

/// Rejections before [`sample_clamped_standard_normal`] gives up and clamps
const MAX_NORMAL_REJECTIONS: usize = 100;

/// Convert a north-south distance to degrees of latitude
#[inline]
pub fn km_to_lat_degrees(km: f64) -> f64 {
    km / KM_PER_DEG_LAT
}

/// Convert an east-west distance to degrees of longitude at a given latitude
///
/// Undefined near the poles; this crate only operates at mid-latitudes.
#[inline]
pub fn km_to_lng_degrees(km: f64, at_lat_degrees: f64) -> f64 {
    km / (KM_PER_DEG_LNG * at_lat_degrees.to_radians().cos())
}

/// Project a coordinate to planar km
///
/// Returns `(x_km, y_km)` as a `DVec2`. Only local distances are meaningful,
/// and east-west ones are exact only at [`PROJECTION_REFERENCE_LAT`].
#[inline]
pub fn project_to_km(lat: f64, lng: f64) -> DVec2 {
    DVec2::new(
        lng * KM_PER_DEG_LNG * PROJECTION_REFERENCE_LAT.to_radians().cos(),
        lat * KM_PER_DEG_LAT,
    )
}

/// Draw a standard normal variate with its tails cut at `max_sigma`
///
/// Box-Muller draws outside `[-max_sigma, max_sigma]` are rejected. After
/// 100 rejections the last draw is clamped instead.
pub fn sample_clamped_standard_normal<R: Rng + ?Sized>(rng: &mut R, max_sigma: f64) -> f64 {
    let mut z = 0.0;
    for _ in 0..MAX_NORMAL_REJECTIONS {
        z = box_muller(rng);
        if z.abs() <= max_sigma {
            return z;
        }
    }
    z.clamp(-max_sigma, max_sigma)
}

fn box_muller<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen() is in [0, 1); flip it so ln never sees zero
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Axis-aligned box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    /// Build a box from latitude and longitude ranges
    pub fn from_ranges(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min: DVec2::new(min_lng, min_lat),
            max: DVec2::new(max_lng, max_lat),
        }
    }

    /// Smallest box enclosing every vertex, or `None` for an empty slice
    pub fn from_points(points: &[DVec2]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { min, max })
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Even-odd ray casting test against one closed ring
///
/// The ring may or may not repeat its first vertex at the end.
pub fn point_in_polygon_ring(point: DVec2, ring: &[DVec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True iff inside the outer ring `rings[0]` and inside none of the holes
pub fn point_in_polygon_with_holes(point: DVec2, rings: &[Vec<DVec2>]) -> bool {
    match rings.split_first() {
        Some((outer, holes)) => {
            point_in_polygon_ring(point, outer)
                && !holes.iter().any(|hole| point_in_polygon_ring(point, hole))
        }
        None => false,
    }
}
