//! Single-point sampling around a cluster
//!
//! Each attempt picks a node, chooses a broad "regional" or tight "local"
//! spread, offsets the node by a clamped normal scaled to that spread, adds a
//! small uniform texture jitter, and checks the candidate against the
//! containment index.

use rand::Rng;

use crate::cluster::ClusterEntry;
use crate::config::GeneratorConfig;
use crate::containment::ContainmentIndex;
use crate::geometry::{km_to_lat_degrees, km_to_lng_degrees, sample_clamped_standard_normal};

/// A sampled coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Draws candidate points from clusters under a containment constraint
#[derive(Debug, Clone, Copy)]
pub struct PointSampler<'a> {
    containment: &'a ContainmentIndex,
    config: &'a GeneratorConfig,
}

impl<'a> PointSampler<'a> {
    pub fn new(containment: &'a ContainmentIndex, config: &'a GeneratorConfig) -> Self {
        Self {
            containment,
            config,
        }
    }

    /// Sample one allowed point from `entry`
    ///
    /// Returns `None` once `sampler_attempts` candidates have been rejected.
    /// That is an expected outcome and the caller simply skips the point.
    pub fn sample<R: Rng + ?Sized>(&self, entry: &ClusterEntry, rng: &mut R) -> Option<SampledPoint> {
        (0..self.config.sampler_attempts).find_map(|_| {
            let candidate = self.candidate(entry, rng)?;
            self.containment
                .is_allowed(candidate.lat, candidate.lng)
                .then_some(candidate)
        })
    }

    /// Draw one unchecked candidate
    fn candidate<R: Rng + ?Sized>(&self, entry: &ClusterEntry, rng: &mut R) -> Option<SampledPoint> {
        let cfg = self.config;
        let cluster = entry.cluster();
        let nodes = entry.nodes();
        if nodes.is_empty() {
            return None;
        }
        let node = nodes[rng.gen_range(0..nodes.len())];

        let base_sigma = if rng.gen_bool(cfg.regional_probability) {
            cfg.regional_sigma
        } else {
            cfg.local_sigma
        };
        let sigma_lat_km = cluster.spread_km * base_sigma;
        let sigma_lng_km = cluster.spread_km * base_sigma * cluster.lng_stretch;

        let dy = sample_clamped_standard_normal(rng, cfg.max_sigma) * sigma_lat_km
            + texture(rng, cfg.texture_jitter_km);
        let dx = sample_clamped_standard_normal(rng, cfg.max_sigma) * sigma_lng_km
            + texture(rng, cfg.texture_jitter_km);

        Some(SampledPoint {
            lat: node.lat + km_to_lat_degrees(dy),
            lng: node.lng + km_to_lng_degrees(dx, node.lat),
        })
    }
}

#[inline]
fn texture<R: Rng + ?Sized>(rng: &mut R, half_width_km: f64) -> f64 {
    if half_width_km > 0.0 {
        rng.gen_range(-half_width_km..=half_width_km)
    } else {
        0.0
    }
}
