//! Point cloud generation
//!
//! For every label, walks every cluster, derives a target count from
//! `base_count * intensity * weight * variability`, and fills it with sampled
//! points that pass the label's spatial hash. Points that cannot be placed
//! within the retry budget are dropped; the cloud is allowed to undercount.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cluster::{ClusterEntry, ClusterModel};
use crate::config::GeneratorConfig;
use crate::containment::ContainmentIndex;
use crate::error::Result;
use crate::feature::{to_feature_collection, FeatureCollection, GeneratedPoint, PointProperties};
use crate::label::{Label, LabelSet};
use crate::sampler::PointSampler;
use crate::spatial::SpatialHash;

/// Desired point count for one (cluster, label) pair
///
/// Non-decreasing in every factor; never negative.
#[inline]
pub fn target_count(base_count: u32, intensity: f64, weight: f64, variability: f64) -> usize {
    (base_count as f64 * intensity * weight * variability)
        .max(0.0)
        .round() as usize
}

/// How one cluster contributed to a label's cloud
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterYield {
    pub cluster: String,
    /// Variability factor drawn for this (cluster, label) pair
    pub variability: f64,
    pub target: usize,
    /// Points actually placed; never above `target`
    pub emitted: usize,
}

/// All points generated for one label
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub label: String,
    pub points: Vec<GeneratedPoint>,
    pub yields: Vec<ClusterYield>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn yield_for(&self, cluster: &str) -> Option<&ClusterYield> {
        self.yields.iter().find(|y| y.cluster == cluster)
    }

    pub fn to_feature_collection(&self) -> FeatureCollection<PointProperties> {
        to_feature_collection(&self.points)
    }
}

/// Aggregate counts for one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub total_points: usize,
    pub label_count: usize,
    pub cluster_count: usize,
    /// Labels whose cloud came out empty
    pub empty_labels: Vec<String>,
}

/// Label name to point cloud; every requested label has an entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DensityMap {
    clouds: BTreeMap<String, PointCloud>,
    cluster_count: usize,
}

impl DensityMap {
    pub fn get(&self, label: &str) -> Option<&PointCloud> {
        self.clouds.get(label)
    }

    pub fn clouds(&self) -> impl Iterator<Item = &PointCloud> {
        self.clouds.values()
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.clouds.values().map(PointCloud::len).sum()
    }

    /// Every point of every label, in label order
    pub fn all_points(&self) -> impl Iterator<Item = &GeneratedPoint> {
        self.clouds.values().flat_map(|c| c.points.iter())
    }

    /// One GeoJSON collection per label, empty ones included
    pub fn to_feature_collections(&self) -> BTreeMap<String, FeatureCollection<PointProperties>> {
        self.clouds
            .iter()
            .map(|(name, cloud)| (name.clone(), cloud.to_feature_collection()))
            .collect()
    }

    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            total_points: self.total_points(),
            label_count: self.clouds.len(),
            cluster_count: self.cluster_count,
            empty_labels: self
                .clouds
                .values()
                .filter(|c| c.is_empty())
                .map(|c| c.label.clone())
                .collect(),
        }
    }
}

/// Generates labeled point clouds over a cluster model
///
/// # Example
///
/// ```
/// use proxy_density::*;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let config = GeneratorConfigBuilder::new().seed(42).build().unwrap();
/// let containment = ContainmentIndex::unrestricted();
/// let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
/// let model = ClusterModel::build(
///     vec![Cluster::new("c1", 40.0, -74.0, 1.0, 100, 1.0, 3)],
///     &containment,
///     &config,
///     &mut rng,
/// )
/// .unwrap();
/// let labels = LabelSet::new(vec![Label::new("X", 1.0)]).unwrap();
///
/// let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();
/// let map = generator.generate(&labels);
/// let cloud = map.get("X").unwrap();
/// assert!(cloud.len() <= 135);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PointCloudGenerator<'a> {
    model: &'a ClusterModel,
    containment: &'a ContainmentIndex,
    config: &'a GeneratorConfig,
}

impl<'a> PointCloudGenerator<'a> {
    /// Bind a model and containment index to a checked config
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` breaks the builder's rules, e.g. a
    /// deserialized config with `variability_min > variability_max`.
    pub fn new(
        model: &'a ClusterModel,
        containment: &'a ContainmentIndex,
        config: &'a GeneratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            containment,
            config,
        })
    }

    /// Generate every label with an RNG derived from `(config.seed, label name)`
    ///
    /// A label's cloud does not depend on which other labels are requested.
    pub fn generate(&self, labels: &LabelSet) -> DensityMap {
        self.generate_each(labels, |label| {
            let mut rng = label_rng(self.config.seed, &label.name);
            self.generate_label(label, &mut rng)
        })
    }

    /// Generate every label from one caller-provided random stream
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, labels: &LabelSet, rng: &mut R) -> DensityMap {
        self.generate_each(labels, |label| self.generate_label(label, rng))
    }

    fn generate_each<F>(&self, labels: &LabelSet, mut per_label: F) -> DensityMap
    where
        F: FnMut(&Label) -> PointCloud,
    {
        let clouds: BTreeMap<String, PointCloud> = labels
            .labels()
            .iter()
            .map(|label| (label.name.clone(), per_label(label)))
            .collect();

        let map = DensityMap {
            clouds,
            cluster_count: self.model.len(),
        };
        tracing::info!(
            labels = map.len(),
            clusters = self.model.len(),
            points = map.total_points(),
            "generation complete"
        );
        map
    }

    /// Generate one label's cloud with a fresh spatial hash
    pub fn generate_label<R: Rng + ?Sized>(&self, label: &Label, rng: &mut R) -> PointCloud {
        let mut hash = SpatialHash::new(self.config.min_point_distance_km);
        let mut points = Vec::new();
        let yields = self
            .model
            .entries()
            .iter()
            .map(|entry| self.fill_cluster(label, entry, &mut hash, &mut points, rng))
            .collect();

        tracing::info!(label = %label.name, points = points.len(), "generated label");
        PointCloud {
            label: label.name.clone(),
            points,
            yields,
        }
    }

    fn fill_cluster<R: Rng + ?Sized>(
        &self,
        label: &Label,
        entry: &ClusterEntry,
        hash: &mut SpatialHash,
        points: &mut Vec<GeneratedPoint>,
        rng: &mut R,
    ) -> ClusterYield {
        let cfg = self.config;
        let cluster = entry.cluster();
        let sampler = PointSampler::new(self.containment, cfg);

        let variability = rng.gen_range(cfg.variability_min..=cfg.variability_max);
        let target = target_count(cluster.base_count, cluster.intensity, label.weight, variability);

        let mut emitted = 0;
        for _ in 0..target {
            let placed = (0..cfg.placement_attempts).find_map(|_| {
                let p = sampler.sample(entry, rng)?;
                hash.can_place(p.lat, p.lng).then_some(p)
            });
            if let Some(p) = placed {
                hash.record(p.lat, p.lng);
                points.push(GeneratedPoint {
                    lat: p.lat,
                    lng: p.lng,
                    label: label.name.clone(),
                    cluster: cluster.id.clone(),
                });
                emitted += 1;
            }
        }

        tracing::debug!(
            label = %label.name,
            cluster = %cluster.id,
            target,
            emitted,
            "filled cluster"
        );
        ClusterYield {
            cluster: cluster.id.clone(),
            variability,
            target,
            emitted,
        }
    }
}

/// Per-label RNG: FNV-1a of the name mixed into the run seed
fn label_rng(seed: u64, name: &str) -> ChaCha8Rng {
    let name_hash = name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3));
    ChaCha8Rng::seed_from_u64(seed ^ name_hash ^ 0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::error::DensityError;
    use crate::geometry::project_to_km;

    fn setup(clusters: Vec<Cluster>, containment: &ContainmentIndex) -> (ClusterModel, GeneratorConfig) {
        let config = GeneratorConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let model = ClusterModel::build(clusters, containment, &config, &mut rng).unwrap();
        (model, config)
    }

    fn c1() -> Cluster {
        Cluster::new("c1", 40.0, -74.0, 1.0, 100, 1.0, 3)
    }

    #[test]
    fn test_new_rejects_inverted_variability() {
        let containment = ContainmentIndex::unrestricted();
        let (model, config) = setup(vec![c1()], &containment);

        // Deserialized configs skip the builder, so the range can arrive inverted
        let mut value = serde_json::to_value(config).unwrap();
        value["variability_min"] = serde_json::json!(1.4);
        value["variability_max"] = serde_json::json!(0.6);
        let inverted: GeneratorConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(
            PointCloudGenerator::new(&model, &containment, &inverted),
            Err(DensityError::InvalidConfig(_))
        ));

        let mut bad_probability = config;
        bad_probability.regional_probability = 1.5;
        assert!(PointCloudGenerator::new(&model, &containment, &bad_probability).is_err());

        let mut bad_sigma = config;
        bad_sigma.max_sigma = -2.0;
        assert!(PointCloudGenerator::new(&model, &containment, &bad_sigma).is_err());

        let mut bad_distance = config;
        bad_distance.min_point_distance_km = f64::NAN;
        assert!(PointCloudGenerator::new(&model, &containment, &bad_distance).is_err());
    }

    #[test]
    fn test_target_count() {
        assert_eq!(target_count(100, 1.0, 1.0, 0.65), 65);
        assert_eq!(target_count(100, 1.0, 1.0, 1.35), 135);
        assert_eq!(target_count(100, 0.5, 0.5, 1.0), 25);
        assert_eq!(target_count(100, 1.0, 0.0, 1.2), 0);
        assert_eq!(target_count(0, 1.0, 1.0, 1.2), 0);
    }

    #[test]
    fn test_target_count_monotone_in_weight() {
        let mut previous = 0;
        for step in 0..=100 {
            let weight = step as f64 / 100.0;
            let count = target_count(537, 0.83, weight, 1.07);
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn test_scenario_single_cluster() {
        let containment = ContainmentIndex::unrestricted();
        let (model, config) = setup(vec![c1()], &containment);
        let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();
        let labels = LabelSet::new(vec![Label::new("X", 1.0)]).unwrap();

        let map = generator.generate(&labels);
        let cloud = map.get("X").unwrap();
        let y = cloud.yield_for("c1").unwrap();

        assert!((65..=135).contains(&y.target));
        assert!(y.emitted <= y.target);
        assert_eq!(cloud.len(), y.emitted);
        // Plenty of room at 0.12 km spacing within a ~1 km spread
        assert!(cloud.len() >= 60, "only {} points", cloud.len());
        for p in &cloud.points {
            assert!(project_to_km(p.lat, p.lng).distance(project_to_km(40.0, -74.0)) < 8.0);
            assert_eq!(p.label, "X");
            assert_eq!(p.cluster, "c1");
        }
    }

    #[test]
    fn test_min_distance_per_label() {
        let containment = ContainmentIndex::unrestricted();
        // Small spread forces spacing pressure
        let (model, config) = setup(
            vec![Cluster::new("tight", 40.0, -74.0, 0.3, 400, 1.0, 2)],
            &containment,
        );
        let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();
        let labels = LabelSet::new(vec![Label::new("A", 1.0), Label::new("B", 1.0)]).unwrap();
        let map = generator.generate(&labels);

        for cloud in map.clouds() {
            let projected: Vec<_> = cloud.points.iter().map(|p| project_to_km(p.lat, p.lng)).collect();
            for (i, a) in projected.iter().enumerate() {
                for b in &projected[i + 1..] {
                    assert!(a.distance(*b) >= config.min_point_distance_km - 1e-9);
                }
            }
            let y = cloud.yield_for("tight").unwrap();
            assert!(y.emitted <= y.target);
        }
    }

    #[test]
    fn test_zero_weight_label_is_empty_not_missing() {
        let containment = ContainmentIndex::unrestricted();
        let (model, config) = setup(vec![c1()], &containment);
        let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();
        let labels = LabelSet::new(vec![Label::new("Zero", 0.0), Label::new("X", 1.0)]).unwrap();

        let map = generator.generate(&labels);
        let zero = map.get("Zero").unwrap();
        assert!(zero.is_empty());
        assert!(zero.yields.iter().all(|y| y.target == 0));

        let summary = map.summary();
        assert_eq!(summary.label_count, 2);
        assert_eq!(summary.cluster_count, 1);
        assert_eq!(summary.empty_labels, vec!["Zero".to_string()]);
        assert_eq!(summary.total_points, map.get("X").unwrap().len());

        let collections = map.to_feature_collections();
        assert!(collections["Zero"].features.is_empty());
    }

    #[test]
    fn test_containment_respected() {
        let containment = ContainmentIndex::water_boxes();
        // Brooklyn sits next to the harbor box
        let (model, config) = setup(
            vec![Cluster::new("brooklyn", 40.6501, -73.9496, 4.0, 400, 1.0, 6)],
            &containment,
        );
        let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();
        let labels = LabelSet::new(vec![Label::new("Cohen", 0.95)]).unwrap();

        let map = generator.generate(&labels);
        let cloud = map.get("Cohen").unwrap();
        assert!(!cloud.is_empty());
        for p in &cloud.points {
            assert!(containment.is_allowed(p.lat, p.lng));
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let containment = ContainmentIndex::unrestricted();
        let (model, config) = setup(vec![c1()], &containment);
        let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();

        let both = LabelSet::new(vec![Label::new("X", 1.0), Label::new("Y", 0.5)]).unwrap();
        let only_x = both.filter_by_name("X");

        let a = generator.generate(&both);
        let b = generator.generate(&only_x);
        assert_eq!(a.get("X"), b.get("X"));
    }

    #[test]
    fn test_generate_with_rng_covers_all_labels() {
        let containment = ContainmentIndex::unrestricted();
        let (model, config) = setup(
            vec![c1(), Cluster::new("c2", 41.0, -73.0, 2.0, 50, 0.5, 4)],
            &containment,
        );
        let generator = PointCloudGenerator::new(&model, &containment, &config).unwrap();
        let labels = LabelSet::new(vec![Label::new("X", 1.0), Label::new("Y", 0.5)]).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let map = generator.generate_with_rng(&labels, &mut rng);
        assert_eq!(map.len(), 2);
        for cloud in map.clouds() {
            assert_eq!(cloud.yields.len(), 2);
            let total: usize = cloud.yields.iter().map(|y| y.emitted).sum();
            assert_eq!(total, cloud.len());
        }
        assert_eq!(map.all_points().count(), map.total_points());
    }

    #[test]
    fn test_label_rng_differs_by_name() {
        let a: u64 = label_rng(1, "Cohen").gen();
        let b: u64 = label_rng(1, "Levy").gen();
        let c: u64 = label_rng(1, "Cohen").gen();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
