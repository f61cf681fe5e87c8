//! Privacy-cell aggregation
//!
//! Snaps points onto a square degree grid and reports per-cell counts, so a
//! density layer can be published without individual coordinates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};
use crate::feature::{Feature, FeatureCollection, GeneratedPoint};
use crate::label::LabelSet;

/// Default cell side in degrees (about 500 m at mid-latitudes)
pub const DEFAULT_CELL_SIZE_DEG: f64 = 0.005;

/// Counts for one grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAggregate {
    /// `"{lat:.4}_{lng:.4}"` of the cell centre
    pub cell_id: String,
    pub lat: f64,
    pub lng: f64,
    pub label_counts: BTreeMap<String, u32>,
    pub total_count: u32,
    /// Sum of label weights over the cell's points
    pub weighted_sum: f64,
}

/// Cell id and centre for a coordinate
///
/// # Errors
///
/// Returns `InvalidConfig` unless `cell_size_deg` is finite and positive
pub fn cell_for(lat: f64, lng: f64, cell_size_deg: f64) -> Result<(String, f64, f64)> {
    check_cell_size(cell_size_deg)?;
    Ok(snap(lat, lng, cell_size_deg))
}

/// Aggregate points into grid cells, ordered by cell id
///
/// Labels missing from `labels` count toward the totals with zero weight.
///
/// # Errors
///
/// Returns `InvalidConfig` unless `cell_size_deg` is finite and positive
pub fn aggregate_to_cells<'p, I>(points: I, labels: &LabelSet, cell_size_deg: f64) -> Result<Vec<CellAggregate>>
where
    I: IntoIterator<Item = &'p GeneratedPoint>,
{
    check_cell_size(cell_size_deg)?;
    let mut cells: BTreeMap<String, CellAggregate> = BTreeMap::new();
    for point in points {
        let (cell_id, lat, lng) = snap(point.lat, point.lng, cell_size_deg);
        let weight = labels.get(&point.label).map_or(0.0, |l| l.weight);
        let cell = cells.entry(cell_id.clone()).or_insert_with(|| CellAggregate {
            cell_id,
            lat,
            lng,
            label_counts: BTreeMap::new(),
            total_count: 0,
            weighted_sum: 0.0,
        });
        *cell.label_counts.entry(point.label.clone()).or_insert(0) += 1;
        cell.total_count += 1;
        cell.weighted_sum += weight;
    }
    tracing::debug!(cells = cells.len(), cell_size_deg, "aggregated points");
    Ok(cells.into_values().collect())
}

fn check_cell_size(cell_size_deg: f64) -> Result<()> {
    if !(cell_size_deg > 0.0 && cell_size_deg.is_finite()) {
        return Err(DensityError::InvalidConfig(format!(
            "cell size must be positive (got {})",
            cell_size_deg
        )));
    }
    Ok(())
}

fn snap(lat: f64, lng: f64, cell_size_deg: f64) -> (String, f64, f64) {
    let cell_lat = (lat / cell_size_deg).floor() * cell_size_deg + cell_size_deg / 2.0;
    let cell_lng = (lng / cell_size_deg).floor() * cell_size_deg + cell_size_deg / 2.0;
    (format!("{:.4}_{:.4}", cell_lat, cell_lng), cell_lat, cell_lng)
}

/// GeoJSON with one point feature per cell centre
pub fn cells_to_feature_collection(cells: &[CellAggregate]) -> FeatureCollection<CellAggregate> {
    FeatureCollection::new(
        cells
            .iter()
            .map(|c| Feature::point(c.lat, c.lng, c.clone()))
            .collect(),
    )
}
