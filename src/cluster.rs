//! Population cluster model
//!
//! Clusters are metro-area hot-spots. Each one owns a fixed set of jittered
//! sub-centroids ("nodes") drawn once at model construction; sampling around
//! several nodes instead of the centroid breaks up radial artifacts.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::containment::ContainmentIndex;
use crate::error::{DensityError, Result};
use crate::geometry::{km_to_lat_degrees, km_to_lng_degrees, sample_clamped_standard_normal};

/// Latitude bound for centroids; the km/degree conversions degrade near the poles
const MAX_CENTROID_LAT: f64 = 80.0;

fn default_lng_stretch() -> f64 {
    1.0
}

/// A named population hot-spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique identifier
    pub id: String,
    pub centroid_lat: f64,
    pub centroid_lng: f64,
    /// Spatial spread (km), strictly positive
    pub spread_km: f64,
    /// Point count at full intensity and weight
    pub base_count: u32,
    /// Relative intensity in [0, 1]
    pub intensity: f64,
    /// Number of sub-centroid nodes, at least 1
    pub node_count: usize,
    /// East-west stretch applied to node and sample offsets
    #[serde(default = "default_lng_stretch")]
    pub lng_stretch: f64,
}

impl Cluster {
    /// Create a cluster with `lng_stretch = 1.0`
    pub fn new(
        id: impl Into<String>,
        centroid_lat: f64,
        centroid_lng: f64,
        spread_km: f64,
        base_count: u32,
        intensity: f64,
        node_count: usize,
    ) -> Self {
        Self {
            id: id.into(),
            centroid_lat,
            centroid_lng,
            spread_km,
            base_count,
            intensity,
            node_count,
            lng_stretch: default_lng_stretch(),
        }
    }

    pub fn with_lng_stretch(mut self, stretch: f64) -> Self {
        self.lng_stretch = stretch;
        self
    }

    fn invalid(&self, reason: impl Into<String>) -> DensityError {
        DensityError::InvalidCluster {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("id must not be empty"));
        }
        if !(self.centroid_lat.abs() <= MAX_CENTROID_LAT) {
            return Err(self.invalid(format!(
                "centroid latitude must be within ±{} (got {})",
                MAX_CENTROID_LAT, self.centroid_lat
            )));
        }
        if !(self.centroid_lng.abs() <= 180.0) {
            return Err(self.invalid(format!(
                "centroid longitude must be within ±180 (got {})",
                self.centroid_lng
            )));
        }
        if !(self.spread_km > 0.0 && self.spread_km.is_finite()) {
            return Err(self.invalid(format!("spread_km must be positive (got {})", self.spread_km)));
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(self.invalid(format!("intensity must be in [0, 1] (got {})", self.intensity)));
        }
        if self.node_count == 0 {
            return Err(self.invalid("node_count must be >= 1"));
        }
        if !(self.lng_stretch > 0.0 && self.lng_stretch.is_finite()) {
            return Err(self.invalid(format!("lng_stretch must be positive (got {})", self.lng_stretch)));
        }
        Ok(())
    }
}

/// A jittered sub-centroid of a cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterNode {
    pub lat: f64,
    pub lng: f64,
}

/// A cluster together with its usable nodes
#[derive(Debug, Clone)]
pub struct ClusterEntry {
    cluster: Cluster,
    nodes: Vec<ClusterNode>,
    unfiltered_fallback: bool,
}

impl ClusterEntry {
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Never empty
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    /// True when containment excluded every node and the unfiltered set was kept
    ///
    /// The nodes of such a cluster lie outside the land mask. Sampled points
    /// are still checked individually, so the cluster may undercount.
    pub fn uses_unfiltered_nodes(&self) -> bool {
        self.unfiltered_fallback
    }
}

/// Immutable catalog of clusters and their nodes
///
/// Built once, then shared by reference with the sampler and generator.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    entries: Vec<ClusterEntry>,
}

impl ClusterModel {
    /// Validate the clusters and draw `node_count` nodes for each
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a config outside the builder's rules,
    /// `InvalidCluster` for a cluster violating its invariants and
    /// `DuplicateId` when two clusters share an id.
    pub fn new<R: Rng + ?Sized>(
        clusters: Vec<Cluster>,
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let mut seen = HashSet::new();
        for cluster in &clusters {
            cluster.validate()?;
            if !seen.insert(cluster.id.as_str()) {
                return Err(DensityError::DuplicateId(cluster.id.clone()));
            }
        }

        let entries = clusters
            .into_iter()
            .map(|cluster| {
                let nodes = generate_nodes(&cluster, config, rng);
                ClusterEntry {
                    cluster,
                    nodes,
                    unfiltered_fallback: false,
                }
            })
            .collect();

        Ok(Self { entries })
    }

    /// Construct the model and filter its nodes against `containment`
    pub fn build<R: Rng + ?Sized>(
        clusters: Vec<Cluster>,
        containment: &ContainmentIndex,
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self::new(clusters, config, rng)?.filter_nodes(containment))
    }

    /// Drop nodes that fall outside `containment`
    ///
    /// A cluster whose nodes would all be dropped keeps its unfiltered set.
    pub fn filter_nodes(mut self, containment: &ContainmentIndex) -> Self {
        for entry in &mut self.entries {
            let allowed: Vec<ClusterNode> = entry
                .nodes
                .iter()
                .copied()
                .filter(|n| containment.is_allowed(n.lat, n.lng))
                .collect();
            if allowed.is_empty() {
                tracing::warn!(
                    cluster = %entry.cluster.id,
                    nodes = entry.nodes.len(),
                    "every node excluded by containment, keeping unfiltered nodes"
                );
                entry.unfiltered_fallback = true;
            } else {
                tracing::debug!(
                    cluster = %entry.cluster.id,
                    kept = allowed.len(),
                    total = entry.nodes.len(),
                    "filtered cluster nodes"
                );
                entry.nodes = allowed;
                entry.unfiltered_fallback = false;
            }
        }
        self
    }

    pub fn entries(&self) -> &[ClusterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ClusterEntry> {
        self.entries.iter().find(|e| e.cluster.id == id)
    }

    /// Ids of clusters running on their unfiltered node set
    pub fn fallback_clusters(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.unfiltered_fallback)
            .map(|e| e.cluster.id.as_str())
            .collect()
    }
}

fn generate_nodes<R: Rng + ?Sized>(
    cluster: &Cluster,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Vec<ClusterNode> {
    let reach_km = cluster.spread_km * config.node_spread_factor;
    (0..cluster.node_count)
        .map(|_| {
            let dy = sample_clamped_standard_normal(rng, config.max_sigma) * reach_km;
            let dx = sample_clamped_standard_normal(rng, config.max_sigma)
                * reach_km
                * cluster.lng_stretch;
            ClusterNode {
                lat: cluster.centroid_lat + km_to_lat_degrees(dy),
                lng: cluster.centroid_lng + km_to_lng_degrees(dx, cluster.centroid_lat),
            }
        })
        .collect()
}
