//! Generator Configuration and Builder
//!
//! Tuning constants for the sampler and point cloud generator. The defaults
//! reproduce the reference density look; the builder validates overrides.

use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};

/// Minimum distance between two points of the same label, in projected km
pub const MIN_POINT_DISTANCE_KM: f64 = 0.12;

/// Configuration for point cloud generation
///
/// # Example
///
/// ```rust
/// use proxy_density::*;
///
/// let config = GeneratorConfigBuilder::new()
///     .seed(42)
///     .min_point_distance_km(0.2)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: GeneratorConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Random seed; each label derives its own stream from it
    pub seed: u64,

    /// Minimum pairwise distance between points of one label (km)
    ///
    /// Also the spatial hash cell size.
    pub min_point_distance_km: f64,

    /// Containment attempts per sampler call
    pub sampler_attempts: usize,

    /// Sampler + spacing attempts per desired point before it is dropped
    pub placement_attempts: usize,

    /// Rejection bound for the clamped standard normal, in sigmas
    pub max_sigma: f64,

    /// Node offset scale as a fraction of the cluster spread
    pub node_spread_factor: f64,

    /// Probability of drawing a point in regional (broad) mode
    pub regional_probability: f64,

    /// Sigma multiplier for regional mode
    pub regional_sigma: f64,

    /// Sigma multiplier for local mode
    pub local_sigma: f64,

    /// Half-width of the uniform high-frequency texture jitter (km)
    pub texture_jitter_km: f64,

    /// Lower bound of the per (cluster, label) variability factor
    pub variability_min: f64,

    /// Upper bound of the per (cluster, label) variability factor
    pub variability_max: f64,
}

impl GeneratorConfig {
    /// Check every field against the builder's rules
    ///
    /// Needed for configs that bypass the builder, such as deserialized ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        check_min_point_distance(self.min_point_distance_km)?;
        check_attempts("sampler", self.sampler_attempts)?;
        check_attempts("placement", self.placement_attempts)?;
        check_positive("max sigma", self.max_sigma)?;
        check_positive("node spread factor", self.node_spread_factor)?;
        check_probability(self.regional_probability)?;
        check_positive("regional sigma", self.regional_sigma)?;
        check_positive("local sigma", self.local_sigma)?;
        check_texture_jitter(self.texture_jitter_km)?;
        check_variability(self.variability_min, self.variability_max)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfigBuilder::new().seed(0).into_config()
    }
}

/// Builder for creating GeneratorConfig with validation
///
/// ```rust
/// use proxy_density::*;
///
/// let config = GeneratorConfigBuilder::new()
///     .seed(7)
///     .variability(0.8, 1.2)
///     .unwrap()
///     .placement_attempts(20)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.placement_attempts, 20);
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorConfigBuilder {
    seed: Option<u64>,
    min_point_distance_km: f64,
    sampler_attempts: usize,
    placement_attempts: usize,
    max_sigma: f64,
    node_spread_factor: f64,
    regional_probability: f64,
    regional_sigma: f64,
    local_sigma: f64,
    texture_jitter_km: f64,
    variability_min: f64,
    variability_max: f64,
}

impl GeneratorConfigBuilder {
    /// Create a new builder with the reference values
    ///
    /// Defaults:
    /// - seed: random
    /// - min_point_distance_km: 0.12
    /// - sampler_attempts: 20, placement_attempts: 12
    /// - max_sigma: 2.8, node_spread_factor: 0.9
    /// - regional mode: p = 0.35, sigma 1.1; local mode sigma 0.5
    /// - texture_jitter_km: 0.15
    /// - variability: [0.65, 1.35]
    pub fn new() -> Self {
        Self {
            seed: None,
            min_point_distance_km: MIN_POINT_DISTANCE_KM,
            sampler_attempts: 20,
            placement_attempts: 12,
            max_sigma: 2.8,
            node_spread_factor: 0.9,
            regional_probability: 0.35,
            regional_sigma: 1.1,
            local_sigma: 0.5,
            texture_jitter_km: 0.15,
            variability_min: 0.65,
            variability_max: 1.35,
        }
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the minimum inter-point distance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the distance is not strictly positive
    pub fn min_point_distance_km(mut self, km: f64) -> Result<Self> {
        check_min_point_distance(km)?;
        self.min_point_distance_km = km;
        Ok(self)
    }

    /// Set the containment attempts per sampler call
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if attempts == 0
    pub fn sampler_attempts(mut self, attempts: usize) -> Result<Self> {
        check_attempts("sampler", attempts)?;
        self.sampler_attempts = attempts;
        Ok(self)
    }

    /// Set the attempts per desired point
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if attempts == 0
    pub fn placement_attempts(mut self, attempts: usize) -> Result<Self> {
        check_attempts("placement", attempts)?;
        self.placement_attempts = attempts;
        Ok(self)
    }

    /// Set the rejection bound of the clamped normal
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if sigma <= 0
    pub fn max_sigma(mut self, sigma: f64) -> Result<Self> {
        check_positive("max sigma", sigma)?;
        self.max_sigma = sigma;
        Ok(self)
    }

    /// Set the regional/local jitter mixture
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the probability is outside [0, 1] or a
    /// sigma is not positive
    pub fn jitter_modes(
        mut self,
        regional_probability: f64,
        regional_sigma: f64,
        local_sigma: f64,
    ) -> Result<Self> {
        check_probability(regional_probability)?;
        check_positive("regional sigma", regional_sigma)?;
        check_positive("local sigma", local_sigma)?;
        self.regional_probability = regional_probability;
        self.regional_sigma = regional_sigma;
        self.local_sigma = local_sigma;
        Ok(self)
    }

    /// Set the texture jitter half-width
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if km is negative
    pub fn texture_jitter_km(mut self, km: f64) -> Result<Self> {
        check_texture_jitter(km)?;
        self.texture_jitter_km = km;
        Ok(self)
    }

    /// Set the variability range drawn once per (cluster, label)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if min < 0 or min > max
    pub fn variability(mut self, min: f64, max: f64) -> Result<Self> {
        check_variability(min, max)?;
        self.variability_min = min;
        self.variability_max = max;
        Ok(self)
    }

    /// Build the configuration
    ///
    /// If no seed was provided, a random one is drawn.
    pub fn build(self) -> Result<GeneratorConfig> {
        Ok(self.into_config())
    }

    fn into_config(self) -> GeneratorConfig {
        GeneratorConfig {
            seed: self.seed.unwrap_or_else(rand::random),
            min_point_distance_km: self.min_point_distance_km,
            sampler_attempts: self.sampler_attempts,
            placement_attempts: self.placement_attempts,
            max_sigma: self.max_sigma,
            node_spread_factor: self.node_spread_factor,
            regional_probability: self.regional_probability,
            regional_sigma: self.regional_sigma,
            local_sigma: self.local_sigma,
            texture_jitter_km: self.texture_jitter_km,
            variability_min: self.variability_min,
            variability_max: self.variability_max,
        }
    }
}

impl Default for GeneratorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_min_point_distance(km: f64) -> Result<()> {
    if !(km > 0.0 && km.is_finite()) {
        return Err(DensityError::InvalidConfig(format!(
            "min point distance must be positive (got {})",
            km
        )));
    }
    Ok(())
}

fn check_attempts(kind: &str, attempts: usize) -> Result<()> {
    if attempts == 0 {
        return Err(DensityError::InvalidConfig(format!(
            "{} attempts must be >= 1",
            kind
        )));
    }
    Ok(())
}

fn check_positive(what: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(DensityError::InvalidConfig(format!(
            "{} must be positive (got {})",
            what, value
        )));
    }
    Ok(())
}

fn check_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(DensityError::InvalidConfig(format!(
            "regional probability must be in [0, 1] (got {})",
            p
        )));
    }
    Ok(())
}

fn check_texture_jitter(km: f64) -> Result<()> {
    if !(km >= 0.0 && km.is_finite()) {
        return Err(DensityError::InvalidConfig(format!(
            "texture jitter must be >= 0 (got {})",
            km
        )));
    }
    Ok(())
}

fn check_variability(min: f64, max: f64) -> Result<()> {
    if !(min >= 0.0 && min <= max && max.is_finite()) {
        return Err(DensityError::InvalidConfig(format!(
            "variability range must satisfy 0 <= min <= max (got [{}, {}])",
            min, max
        )));
    }
    Ok(())
}
