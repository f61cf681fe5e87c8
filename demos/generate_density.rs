//! Example: Generate density clouds over the built-in catalogs
//!
//! Usage: cargo run --example generate_density -- [LAND_MASK.geojson] [SURNAME]

use std::path::PathBuf;

use proxy_density::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::fmt::SubscriberBuilder;

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let land_mask = args.next().map(PathBuf::from);
    let surname = args.next();

    let config = GeneratorConfigBuilder::new().seed(42).build()?;
    let containment = ContainmentIndex::load_or_fallback(land_mask.as_deref());

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let model = ClusterModel::build(default_clusters(), &containment, &config, &mut rng)?;
    let all_labels = LabelSet::new(default_labels())?;
    let labels = match surname {
        Some(name) => all_labels.filter_by_name(&name),
        None => all_labels,
    };

    println!("Configuration:");
    println!("  Seed: {}", config.seed);
    println!("  Clusters: {}", model.len());
    println!("  Labels: {}", labels.len());
    println!("  Land mask polygons: {}", containment.polygon_count());
    if let Some(extent) = containment.land_extent() {
        println!(
            "  Land mask extent: lat [{:.3}, {:.3}], lng [{:.3}, {:.3}]",
            extent.min.y, extent.max.y, extent.min.x, extent.max.x
        );
    }
    println!();

    let map = PointCloudGenerator::new(&model, &containment, &config)?.generate(&labels);
    let summary = map.summary();

    println!("Summary:");
    println!("  Total points: {}", summary.total_points);
    println!("  Empty labels: {}", summary.empty_labels.len());
    println!();

    println!("Top labels:");
    for label in labels.sorted_by_weight().into_iter().take(5) {
        if let Some(cloud) = map.get(&label.name) {
            println!("  {:<12} weight={:.2} points={}", label.name, label.weight, cloud.len());
        }
    }

    let cells = aggregate_to_cells(map.all_points(), &labels, DEFAULT_CELL_SIZE_DEG)?;
    println!("\nAggregated into {} privacy cells", cells.len());

    Ok(())
}
