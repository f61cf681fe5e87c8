//! Generated points and their GeoJSON boundary representation
//!
//! Points stay as a fixed record internally; conversion to GeoJSON happens
//! only when a cloud leaves the crate.

use serde::{Deserialize, Serialize};

/// A labeled point produced by one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPoint {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    /// Id of the cluster the point was drawn from
    pub cluster: String,
}

/// GeoJSON `FeatureCollection`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub features: Vec<Feature<P>>,
}

/// GeoJSON `Feature` with a point geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub geometry: PointGeometry,
    pub properties: P,
}

/// GeoJSON `Point`; coordinates are `[lng, lat]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: PointType,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    Point,
}

/// Properties attached to every generated point feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointProperties {
    pub label: String,
    pub cluster: String,
}

impl<P> Feature<P> {
    pub fn point(lat: f64, lng: f64, properties: P) -> Self {
        Self {
            kind: FeatureType::Feature,
            geometry: PointGeometry {
                kind: PointType::Point,
                coordinates: [lng, lat],
            },
            properties,
        }
    }

    pub fn lat(&self) -> f64 {
        self.geometry.coordinates[1]
    }

    pub fn lng(&self) -> f64 {
        self.geometry.coordinates[0]
    }
}

impl<P> FeatureCollection<P> {
    pub fn new(features: Vec<Feature<P>>) -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            features,
        }
    }
}

impl<P: Serialize> FeatureCollection<P> {
    /// Render as a GeoJSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&GeneratedPoint> for Feature<PointProperties> {
    fn from(point: &GeneratedPoint) -> Self {
        Feature::point(
            point.lat,
            point.lng,
            PointProperties {
                label: point.label.clone(),
                cluster: point.cluster.clone(),
            },
        )
    }
}

/// Convert generated points into a GeoJSON collection
pub fn to_feature_collection(points: &[GeneratedPoint]) -> FeatureCollection<PointProperties> {
    FeatureCollection::new(points.iter().map(Feature::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geojson_shape() {
        let points = vec![GeneratedPoint {
            lat: 40.5,
            lng: -74.25,
            label: "Cohen".to_string(),
            cluster: "manhattan".to_string(),
        }];
        let value = serde_json::to_value(to_feature_collection(&points)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-74.25, 40.5]},
                    "properties": {"label": "Cohen", "cluster": "manhattan"}
                }]
            })
        );
    }

    #[test]
    fn test_empty_collection_keeps_shape() {
        let json = to_feature_collection(&[]).to_json().unwrap();
        assert_eq!(json, r#"{"type":"FeatureCollection","features":[]}"#);
    }

    #[test]
    fn test_parse_back() {
        let json = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Point","coordinates":[1.0,2.0]},
            "properties":{"label":"X","cluster":"c1"}}]}"#;
        let fc: FeatureCollection<PointProperties> = serde_json::from_str(json).unwrap();
        assert_eq!(fc.features.len(), 1);
        assert_eq!(fc.features[0].lat(), 2.0);
        assert_eq!(fc.features[0].lng(), 1.0);
        assert_eq!(fc.features[0].properties.label, "X");
    }
}
