//! Synthetic surname-density point clouds
//!
//! Given a catalog of metro-area clusters and a catalog of weighted labels
//! (surnames), generates plausible, non-overlapping point clouds per label
//! that avoid water, ready to be rendered as a density layer.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use proxy_density::*;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = GeneratorConfigBuilder::new().seed(42).build().unwrap();
//!
//! // Land mask if available, built-in water boxes otherwise
//! let containment = ContainmentIndex::load_or_fallback(None);
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
//! let model = ClusterModel::build(default_clusters(), &containment, &config, &mut rng).unwrap();
//! let labels = LabelSet::new(default_labels()).unwrap();
//!
//! let map = PointCloudGenerator::new(&model, &containment, &config)
//!     .unwrap()
//!     .generate(&labels);
//! let geojson = map.get("Cohen").unwrap().to_feature_collection().to_json().unwrap();
//! println!("{} points, {} bytes of GeoJSON", map.total_points(), geojson.len());
//! ```
//!
//! # Pipeline
//!
//! Cluster model and containment index are built once and are read-only
//! afterwards. Each label then gets its own spatial hash, so the minimum
//! distance is enforced within a label but not across labels.

pub mod error;
pub mod config;
pub mod geometry;
pub mod containment;
pub mod cluster;
pub mod label;
pub mod catalog;
pub mod spatial;
pub mod sampler;
pub mod feature;
pub mod generator;
pub mod aggregate;

// Re-export core types for convenience
pub use error::{DensityError, Result};
pub use config::{GeneratorConfig, GeneratorConfigBuilder, MIN_POINT_DISTANCE_KM};
pub use containment::{ContainmentIndex, ExclusionRect, LandPolygon};
pub use cluster::{Cluster, ClusterEntry, ClusterModel, ClusterNode};
pub use label::{Label, LabelOrigin, LabelSet};
pub use catalog::{default_clusters, default_labels};
pub use spatial::SpatialHash;
pub use sampler::{PointSampler, SampledPoint};
pub use feature::{FeatureCollection, GeneratedPoint, PointProperties};
pub use generator::{ClusterYield, DensityMap, GenerationSummary, PointCloud, PointCloudGenerator};
pub use aggregate::{aggregate_to_cells, CellAggregate, DEFAULT_CELL_SIZE_DEG};

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
