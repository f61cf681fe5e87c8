//! Uniform-grid spatial hash for minimum-distance enforcement
//!
//! Points are projected to planar km and bucketed by grid cell. The cell side
//! equals the minimum distance, so any point closer than that lies in the
//! same cell or one of its eight neighbours.

use std::collections::HashMap;

use glam::DVec2;

use crate::geometry::project_to_km;

/// Grid cell key
type CellKey = (i64, i64);

/// Spatial hash over projected km coordinates
///
/// One hash covers one label's generation pass and is dropped afterwards.
/// The minimum distance holds in projected km (see
/// [`PROJECTION_REFERENCE_LAT`](crate::geometry::PROJECTION_REFERENCE_LAT)),
/// so north of 38° the ground spacing east-west can dip below it.
///
/// # Example
///
/// ```
/// use proxy_density::SpatialHash;
///
/// let mut hash = SpatialHash::new(0.12);
/// assert!(hash.can_place(40.0, -74.0));
/// hash.record(40.0, -74.0);
/// assert!(!hash.can_place(40.0, -74.0));
/// assert!(hash.can_place(40.01, -74.0)); // ~1.1 km north
/// ```
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size_km: f64,
    min_distance_sq: f64,
    buckets: HashMap<CellKey, Vec<DVec2>>,
    len: usize,
}

impl SpatialHash {
    /// Create an empty hash whose cell size is `min_distance_km`
    pub fn new(min_distance_km: f64) -> Self {
        Self {
            cell_size_km: min_distance_km,
            min_distance_sq: min_distance_km * min_distance_km,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    #[inline]
    fn cell_of(&self, p: DVec2) -> CellKey {
        (
            (p.x / self.cell_size_km).floor() as i64,
            (p.y / self.cell_size_km).floor() as i64,
        )
    }

    /// True if no recorded point lies strictly closer than the minimum distance
    pub fn can_place(&self, lat: f64, lng: f64) -> bool {
        let p = project_to_km(lat, lng);
        let (cx, cy) = self.cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy)) {
                    if bucket.iter().any(|q| q.distance_squared(p) < self.min_distance_sq) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Record an accepted point
    pub fn record(&mut self, lat: f64, lng: f64) {
        let p = project_to_km(lat, lng);
        let key = self.cell_of(p);
        self.buckets.entry(key).or_default().push(p);
        self.len += 1;
    }

    /// Number of recorded points
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied grid cells
    pub fn occupied_cells(&self) -> usize {
        self.buckets.len()
    }
}
