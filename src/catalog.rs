//! Built-in catalogs and JSON catalog loading
//!
//! The default tables cover the US East Coast metro areas plus a few inland
//! communities, and the tracked surname list with its origin categories.

use crate::cluster::Cluster;
use crate::error::{DensityError, Result};
use crate::label::{Label, LabelOrigin, LabelSet};

/// `(id, lat, lng, spread_km, base_count, intensity, node_count, lng_stretch)`
const CLUSTERS: &[(&str, f64, f64, f64, u32, f64, usize, f64)] = &[
    ("manhattan", 40.7128, -74.0060, 2.5, 900, 1.00, 6, 0.55),
    ("brooklyn", 40.6501, -73.9496, 3.5, 1000, 1.00, 7, 1.0),
    ("great-neck", 40.7429, -73.6138, 1.6, 300, 0.95, 3, 1.0),
    ("monsey", 41.2565, -74.0998, 1.8, 350, 0.98, 3, 1.0),
    ("teaneck", 40.9176, -74.0301, 1.8, 300, 0.92, 3, 1.0),
    ("lakewood", 40.0583, -74.4057, 2.4, 500, 0.98, 4, 1.0),
    ("boca-raton", 26.3683, -80.1289, 3.0, 500, 0.92, 5, 0.7),
    ("miami-beach", 25.7907, -80.1300, 1.5, 300, 0.88, 3, 0.5),
    ("brookline", 42.3463, -71.1526, 1.6, 280, 0.88, 3, 1.0),
    ("bethesda", 38.9897, -77.0997, 2.0, 300, 0.82, 4, 1.0),
    ("pikesville", 39.3772, -76.7395, 1.8, 260, 0.90, 3, 1.0),
    ("cheltenham", 40.0379, -75.1302, 1.8, 260, 0.82, 3, 1.0),
    ("beachwood", 41.4648, -81.5047, 1.8, 250, 0.88, 3, 1.0),
    ("sandy-springs", 33.9519, -84.3341, 2.2, 220, 0.72, 4, 1.0),
];

const SURNAMES: &[(&str, f64, LabelOrigin)] = &[
    ("Cohen", 0.95, LabelOrigin::Kohanim),
    ("Kohn", 0.94, LabelOrigin::Kohanim),
    ("Levy", 0.92, LabelOrigin::Levite),
    ("Levi", 0.93, LabelOrigin::Levite),
    ("Levin", 0.88, LabelOrigin::Levite),
    ("Levine", 0.88, LabelOrigin::Levite),
    ("Goldberg", 0.92, LabelOrigin::Ashkenazi),
    ("Goldstein", 0.92, LabelOrigin::Ashkenazi),
    ("Goldman", 0.88, LabelOrigin::Ashkenazi),
    ("Rosenberg", 0.90, LabelOrigin::Ashkenazi),
    ("Rosenthal", 0.88, LabelOrigin::Ashkenazi),
    ("Rosen", 0.82, LabelOrigin::Ashkenazi),
    ("Weinberg", 0.88, LabelOrigin::Ashkenazi),
    ("Weinstein", 0.90, LabelOrigin::Ashkenazi),
    ("Weiss", 0.78, LabelOrigin::Ashkenazi),
    ("Schwartz", 0.75, LabelOrigin::Ashkenazi),
    ("Friedman", 0.85, LabelOrigin::Ashkenazi),
    ("Silverman", 0.88, LabelOrigin::Ashkenazi),
    ("Bernstein", 0.90, LabelOrigin::Ashkenazi),
    ("Epstein", 0.92, LabelOrigin::Ashkenazi),
    ("Feinstein", 0.92, LabelOrigin::Ashkenazi),
    ("Finkelstein", 0.94, LabelOrigin::Ashkenazi),
    ("Horowitz", 0.92, LabelOrigin::Ashkenazi),
    ("Moskowitz", 0.94, LabelOrigin::Ashkenazi),
    ("Rabinowitz", 0.95, LabelOrigin::Ashkenazi),
    ("Shapiro", 0.90, LabelOrigin::Ashkenazi),
    ("Klein", 0.70, LabelOrigin::Ashkenazi),
    ("Katz", 0.88, LabelOrigin::Ashkenazi),
    ("Kaplan", 0.85, LabelOrigin::Kohanim),
    ("Greenberg", 0.90, LabelOrigin::Ashkenazi),
    ("Feldman", 0.85, LabelOrigin::Ashkenazi),
    ("Kaufman", 0.78, LabelOrigin::Ashkenazi),
    ("Schiff", 0.88, LabelOrigin::Ashkenazi),
    ("Perlman", 0.88, LabelOrigin::Ashkenazi),
    ("Segal", 0.88, LabelOrigin::Ashkenazi),
    ("Siegel", 0.85, LabelOrigin::Ashkenazi),
];

/// The built-in metro cluster table
pub fn default_clusters() -> Vec<Cluster> {
    CLUSTERS
        .iter()
        .map(|&(id, lat, lng, spread_km, base_count, intensity, node_count, stretch)| {
            Cluster::new(id, lat, lng, spread_km, base_count, intensity, node_count)
                .with_lng_stretch(stretch)
        })
        .collect()
}

/// The built-in surname table
pub fn default_labels() -> Vec<Label> {
    SURNAMES
        .iter()
        .map(|&(name, weight, origin)| Label::new(name, weight).with_origin(origin))
        .collect()
}

/// Parse a JSON array of clusters
///
/// Validation happens when the clusters are handed to `ClusterModel`.
///
/// # Errors
///
/// Returns `Catalog` if the JSON does not match the cluster schema.
pub fn clusters_from_json(json: &str) -> Result<Vec<Cluster>> {
    serde_json::from_str(json).map_err(|e| DensityError::Catalog(format!("clusters: {}", e)))
}

/// Parse and validate a JSON array of labels
///
/// # Errors
///
/// Returns `Catalog` for malformed JSON and the `LabelSet` validation errors
/// otherwise.
pub fn labels_from_json(json: &str) -> Result<LabelSet> {
    let labels: Vec<Label> =
        serde_json::from_str(json).map_err(|e| DensityError::Catalog(format!("labels: {}", e)))?;
    LabelSet::new(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterModel;
    use crate::config::GeneratorConfig;
    use crate::containment::ContainmentIndex;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_catalogs_validate() {
        let labels = LabelSet::new(default_labels()).unwrap();
        assert_eq!(labels.len(), 36);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let model = ClusterModel::new(default_clusters(), &GeneratorConfig::default(), &mut rng).unwrap();
        assert_eq!(model.len(), 14);
    }

    #[test]
    fn test_default_centroids_on_land() {
        let index = ContainmentIndex::water_boxes();
        for cluster in default_clusters() {
            assert!(
                index.is_allowed(cluster.centroid_lat, cluster.centroid_lng),
                "{} centroid is in a water box",
                cluster.id
            );
        }
    }

    #[test]
    fn test_default_model_keeps_nodes_under_water_boxes() {
        let index = ContainmentIndex::water_boxes();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let model =
            ClusterModel::build(default_clusters(), &index, &GeneratorConfig::default(), &mut rng).unwrap();
        assert!(model.entries().iter().all(|e| !e.nodes().is_empty()));
    }

    #[test]
    fn test_clusters_from_json() {
        let json = r#"[
            {"id": "a", "centroid_lat": 40.0, "centroid_lng": -74.0, "spread_km": 1.0,
             "base_count": 10, "intensity": 0.5, "node_count": 2, "lng_stretch": 0.8}
        ]"#;
        let clusters = clusters_from_json(json).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].lng_stretch, 0.8);

        let negative = r#"[{"id": "a", "centroid_lat": 40.0, "centroid_lng": -74.0,
            "spread_km": 1.0, "base_count": -5, "intensity": 0.5, "node_count": 2}]"#;
        assert!(matches!(clusters_from_json(negative), Err(DensityError::Catalog(_))));
    }

    #[test]
    fn test_labels_from_json() {
        let labels = labels_from_json(r#"[{"name": "Katz", "weight": 0.88, "origin": "ashkenazi"}]"#).unwrap();
        assert_eq!(labels.get("Katz").unwrap().origin, Some(LabelOrigin::Ashkenazi));

        let dup = r#"[{"name": "Katz", "weight": 0.88}, {"name": "Katz", "weight": 0.5}]"#;
        assert!(matches!(labels_from_json(dup), Err(DensityError::DuplicateId(_))));
        assert!(matches!(labels_from_json("{"), Err(DensityError::Catalog(_))));
    }
}
