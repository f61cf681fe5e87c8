//! Land/water containment index
//!
//! Answers whether a coordinate is a valid sampling location. Backed either by
//! a land-mask polygon set (with per-polygon bounding boxes for pruning) or,
//! when no mask is available, by a fixed list of water exclusion rectangles.

use std::path::Path;

use glam::DVec2;
use serde_json::Value;

use crate::error::{DensityError, Result};
use crate::geometry::{point_in_polygon_with_holes, BoundingBox};

/// Built-in water bodies as `(name, min_lat, max_lat, min_lng, max_lng)`
const WATER_BOXES: &[(&str, f64, f64, f64, f64)] = &[
    ("New York Harbor", 40.50, 40.66, -74.08, -73.97),
    ("Long Island Sound", 40.95, 41.15, -73.55, -72.60),
    ("New York Bight", 39.50, 40.45, -73.95, -73.00),
    ("Atlantic off Southeast Florida", 25.50, 26.80, -80.06, -79.50),
    ("Biscayne Bay", 25.60, 25.76, -80.20, -80.15),
    ("Massachusetts Bay", 42.25, 42.45, -71.02, -70.60),
    ("Chesapeake Bay", 38.30, 39.30, -76.45, -76.25),
    ("Lake Erie", 41.55, 42.50, -82.50, -80.50),
];

/// A land polygon: outer ring plus optional holes, `(lng, lat)` vertices
#[derive(Debug, Clone, PartialEq)]
pub struct LandPolygon {
    rings: Vec<Vec<DVec2>>,
    bbox: BoundingBox,
}

impl LandPolygon {
    /// Build a polygon from its rings; `rings[0]` is the outer boundary
    ///
    /// # Errors
    ///
    /// Returns `PolygonData` if there is no outer ring or the outer ring has
    /// fewer than three vertices.
    pub fn new(rings: Vec<Vec<DVec2>>) -> Result<Self> {
        let outer = rings
            .first()
            .ok_or_else(|| DensityError::PolygonData("polygon has no rings".to_string()))?;
        if outer.len() < 3 {
            return Err(DensityError::PolygonData(format!(
                "outer ring needs at least 3 vertices (got {})",
                outer.len()
            )));
        }
        let bbox = BoundingBox::from_points(outer)
            .ok_or_else(|| DensityError::PolygonData("empty outer ring".to_string()))?;
        Ok(Self { rings, bbox })
    }

    /// Bounding box of the outer ring
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Bounding-box prune, then the full even-odd test
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        self.bbox.contains(point) && point_in_polygon_with_holes(point, &self.rings)
    }
}

/// A named axis-aligned water rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionRect {
    pub name: String,
    pub bounds: BoundingBox,
}

impl ExclusionRect {
    pub fn new(name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

/// The built-in water exclusion rectangles for the covered region
pub fn default_water_boxes() -> Vec<ExclusionRect> {
    WATER_BOXES
        .iter()
        .map(|&(name, min_lat, max_lat, min_lng, max_lng)| {
            ExclusionRect::new(name, BoundingBox::from_ranges(min_lat, max_lat, min_lng, max_lng))
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Mode {
    LandMask(Vec<LandPolygon>),
    Exclusion(Vec<ExclusionRect>),
}

/// Read-only oracle for valid sampling locations
///
/// Immutable after construction, so it can be shared freely across
/// generation passes.
///
/// ```rust
/// use proxy_density::ContainmentIndex;
///
/// let index = ContainmentIndex::water_boxes();
/// assert!(!index.is_allowed(40.60, -74.03)); // New York Harbor
/// assert!(index.is_allowed(40.7128, -74.0060)); // Manhattan
/// ```
#[derive(Debug, Clone)]
pub struct ContainmentIndex {
    mode: Mode,
}

impl ContainmentIndex {
    /// Land-mask index; an empty polygon set falls back to the water boxes
    pub fn from_polygons(polygons: Vec<LandPolygon>) -> Self {
        if polygons.is_empty() {
            tracing::warn!("land mask contains no polygons, using water exclusion boxes");
            return Self::water_boxes();
        }
        Self {
            mode: Mode::LandMask(polygons),
        }
    }

    /// Index built from the built-in water exclusion boxes
    pub fn water_boxes() -> Self {
        Self::with_exclusion_rects(default_water_boxes())
    }

    /// Index built from a custom list of exclusion rectangles
    pub fn with_exclusion_rects(rects: Vec<ExclusionRect>) -> Self {
        Self {
            mode: Mode::Exclusion(rects),
        }
    }

    /// Index that allows every coordinate
    pub fn unrestricted() -> Self {
        Self::with_exclusion_rects(Vec::new())
    }

    /// Parse a GeoJSON land mask
    ///
    /// Accepts a FeatureCollection, a Feature, a GeometryCollection, or a bare
    /// Polygon/MultiPolygon. Non-polygonal geometries are skipped.
    ///
    /// # Errors
    ///
    /// Returns `PolygonData` if the JSON is malformed or holds no polygons.
    pub fn from_geojson(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| DensityError::PolygonData(e.to_string()))?;
        let mut polygons = Vec::new();
        collect_polygons(&value, &mut polygons)?;
        if polygons.is_empty() {
            return Err(DensityError::PolygonData(
                "no Polygon or MultiPolygon geometries found".to_string(),
            ));
        }
        tracing::info!(polygons = polygons.len(), "loaded land mask");
        Ok(Self {
            mode: Mode::LandMask(polygons),
        })
    }

    /// Read a GeoJSON land mask from disk
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `PolygonData` if it does not parse.
    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_geojson(&json)
    }

    /// Load a land mask if a path is given, degrading to the water boxes on
    /// any failure
    pub fn load_or_fallback(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::info!("no land mask supplied, using water exclusion boxes");
            return Self::water_boxes();
        };
        match Self::from_geojson_file(path) {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "land mask unavailable, using water exclusion boxes");
                Self::water_boxes()
            }
        }
    }

    /// Whether `(lat, lng)` is a valid sampling location
    pub fn is_allowed(&self, lat: f64, lng: f64) -> bool {
        let point = DVec2::new(lng, lat);
        match &self.mode {
            Mode::LandMask(polygons) => polygons.iter().any(|p| p.contains(point)),
            Mode::Exclusion(rects) => !rects.iter().any(|r| r.bounds.contains(point)),
        }
    }

    /// True when backed by polygon data rather than exclusion rectangles
    pub fn uses_land_mask(&self) -> bool {
        matches!(self.mode, Mode::LandMask(_))
    }

    /// Number of land polygons, zero in rectangle mode
    pub fn polygon_count(&self) -> usize {
        match &self.mode {
            Mode::LandMask(polygons) => polygons.len(),
            Mode::Exclusion(_) => 0,
        }
    }

    /// Box enclosing every land polygon, `None` in exclusion mode
    pub fn land_extent(&self) -> Option<BoundingBox> {
        let Mode::LandMask(polygons) = &self.mode else {
            return None;
        };
        let (first, rest) = polygons.split_first()?;
        Some(rest.iter().fold(*first.bbox(), |acc, polygon| BoundingBox {
            min: acc.min.min(polygon.bbox().min),
            max: acc.max.max(polygon.bbox().max),
        }))
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<LandPolygon>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DensityError::PolygonData("object without a \"type\"".to_string()))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| DensityError::PolygonData("FeatureCollection without features".to_string()))?;
            for feature in features {
                collect_polygons(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_polygons(geometry, out)?,
        },
        "GeometryCollection" => {
            let geometries = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| DensityError::PolygonData("GeometryCollection without geometries".to_string()))?;
            for geometry in geometries {
                collect_polygons(geometry, out)?;
            }
        }
        "Polygon" => {
            out.push(parse_polygon(coordinates(value)?)?);
        }
        "MultiPolygon" => {
            let polygons = coordinates(value)?
                .as_array()
                .ok_or_else(|| DensityError::PolygonData("MultiPolygon coordinates must be an array".to_string()))?;
            for polygon in polygons {
                out.push(parse_polygon(polygon)?);
            }
        }
        _ => {}
    }
    Ok(())
}

fn coordinates(geometry: &Value) -> Result<&Value> {
    geometry
        .get("coordinates")
        .ok_or_else(|| DensityError::PolygonData("geometry without coordinates".to_string()))
}

fn parse_polygon(value: &Value) -> Result<LandPolygon> {
    let rings = value
        .as_array()
        .ok_or_else(|| DensityError::PolygonData("polygon must be an array of rings".to_string()))?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?;
    LandPolygon::new(rings)
}

fn parse_ring(value: &Value) -> Result<Vec<DVec2>> {
    value
        .as_array()
        .ok_or_else(|| DensityError::PolygonData("ring must be an array of positions".to_string()))?
        .iter()
        .map(|position| {
            let pair = position.as_array().filter(|p| p.len() >= 2);
            let lng = pair.and_then(|p| p[0].as_f64());
            let lat = pair.and_then(|p| p[1].as_f64());
            match (lng, lat) {
                (Some(lng), Some(lat)) => Ok(DVec2::new(lng, lat)),
                _ => Err(DensityError::PolygonData(format!(
                    "invalid position {}",
                    position
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISLAND: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "island"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[-75.0, 39.0], [-73.0, 39.0], [-73.0, 41.0], [-75.0, 41.0], [-75.0, 39.0]],
                        [[-74.2, 39.8], [-73.8, 39.8], [-73.8, 40.2], [-74.2, 40.2], [-74.2, 39.8]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
            }
        ]
    }"#;

    #[test]
    fn test_fallback_rejects_harbor() {
        let index = ContainmentIndex::water_boxes();
        assert!(!index.uses_land_mask());
        assert!(!index.is_allowed(40.60, -74.03));
        assert!(!index.is_allowed(40.55, -74.05));
    }

    #[test]
    fn test_fallback_allows_metro_centroids() {
        let index = ContainmentIndex::water_boxes();
        for (lat, lng) in [
            (40.7128, -74.0060),
            (40.6501, -73.9496),
            (26.3683, -80.1289),
            (25.7907, -80.1300),
            (42.3463, -71.1526),
            (41.4648, -81.5047),
        ] {
            assert!(index.is_allowed(lat, lng), "({}, {}) should be land", lat, lng);
        }
    }

    #[test]
    fn test_unrestricted_allows_everything() {
        let index = ContainmentIndex::unrestricted();
        assert!(index.is_allowed(40.60, -74.03));
        assert!(index.is_allowed(0.0, 0.0));
    }

    #[test]
    fn test_geojson_polygon_with_hole() {
        let index = ContainmentIndex::from_geojson(ISLAND).unwrap();
        assert!(index.uses_land_mask());
        assert_eq!(index.polygon_count(), 1);
        assert!(index.is_allowed(39.5, -74.5));
        assert!(!index.is_allowed(40.0, -74.0)); // inside the hole
        assert!(!index.is_allowed(42.0, -74.0)); // outside the bbox
    }

    #[test]
    fn test_geojson_multipolygon() {
        let json = r#"{
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0]]]
            ]
        }"#;
        let index = ContainmentIndex::from_geojson(json).unwrap();
        assert_eq!(index.polygon_count(), 2);
        assert!(index.is_allowed(0.5, 0.5));
        assert!(index.is_allowed(5.5, 5.5));
        assert!(!index.is_allowed(3.0, 3.0));
    }

    #[test]
    fn test_geojson_errors() {
        assert!(ContainmentIndex::from_geojson("not json").is_err());
        assert!(ContainmentIndex::from_geojson(r#"{"type": "FeatureCollection", "features": []}"#).is_err());
        assert!(ContainmentIndex::from_geojson(r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0]]]}"#).is_err());
        assert!(ContainmentIndex::from_geojson(r#"{"type": "Polygon", "coordinates": [[["a", 0]]]}"#).is_err());
        assert!(ContainmentIndex::from_geojson(r#"{"coordinates": []}"#).is_err());
    }

    #[test]
    fn test_load_or_fallback_missing_file() {
        let index = ContainmentIndex::load_or_fallback(Some(Path::new("/nonexistent/land.geojson")));
        assert!(!index.uses_land_mask());
        assert!(!index.is_allowed(40.60, -74.03));

        let index = ContainmentIndex::load_or_fallback(None);
        assert!(!index.uses_land_mask());
    }

    #[test]
    fn test_load_or_fallback_malformed_file() {
        let path = std::env::temp_dir().join(format!("proxy_density_malformed_{}.geojson", std::process::id()));
        std::fs::write(&path, r#"{"type": "FeatureCollection", "features": [{"#).unwrap();
        assert!(ContainmentIndex::from_geojson_file(&path).is_err());

        let index = ContainmentIndex::load_or_fallback(Some(&path));
        std::fs::remove_file(&path).unwrap();
        assert!(!index.uses_land_mask());
        assert_eq!(index.polygon_count(), 0);
        assert!(!index.is_allowed(40.60, -74.03)); // New York Harbor
        assert!(index.is_allowed(40.7128, -74.0060));
    }

    #[test]
    fn test_land_polygon_bbox_and_extent() {
        let index = ContainmentIndex::from_geojson(ISLAND).unwrap();
        let extent = index.land_extent().unwrap();
        assert_eq!(extent, BoundingBox::from_ranges(39.0, 41.0, -75.0, -73.0));

        let square = LandPolygon::new(vec![vec![
            DVec2::new(5.0, 5.0),
            DVec2::new(6.0, 5.0),
            DVec2::new(6.0, 7.0),
            DVec2::new(5.0, 7.0),
        ]])
        .unwrap();
        assert_eq!(*square.bbox(), BoundingBox::from_ranges(5.0, 7.0, 5.0, 6.0));

        let island = LandPolygon::new(vec![vec![
            DVec2::new(-75.0, 39.0),
            DVec2::new(-73.0, 39.0),
            DVec2::new(-73.0, 41.0),
        ]])
        .unwrap();
        let both = ContainmentIndex::from_polygons(vec![island, square]);
        assert_eq!(both.land_extent(), Some(BoundingBox::from_ranges(39.0, 41.0, -75.0, 6.0)));

        assert!(ContainmentIndex::water_boxes().land_extent().is_none());
    }

    #[test]
    fn test_empty_polygon_set_falls_back() {
        let index = ContainmentIndex::from_polygons(Vec::new());
        assert!(!index.uses_land_mask());
    }

    #[test]
    fn test_land_polygon_requires_outer_ring() {
        assert!(LandPolygon::new(Vec::new()).is_err());
        assert!(LandPolygon::new(vec![vec![DVec2::ZERO, DVec2::ONE]]).is_err());
    }
}
