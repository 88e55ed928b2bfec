//! Example: sweeping the subsample fraction and the clustering threshold.
//!
//! Three noisy blobs of histograms are clustered at several `max_d` values.
//! For each threshold the stability is measured at a few fractions; a good
//! threshold stays stable as the fraction shrinks.
//!
//! Run with `RUST_LOG=cluster_stability=info` to see per-run logging.

use cluster_stability::{output, HierarchicalClusterer, Result, SampleStore, SubsampleStabilityTester};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use tracing_subscriber::EnvFilter;

/// Poisson-fluctuated histograms around three template shapes.
fn histograms(per_shape: usize) -> Result<SampleStore> {
    let templates = [
        [40.0, 120.0, 200.0, 120.0, 40.0],
        [200.0, 120.0, 60.0, 30.0, 10.0],
        [10.0, 30.0, 60.0, 120.0, 200.0],
    ];
    let mut rng = StdRng::seed_from_u64(2024);
    let mut coordinates = Vec::new();
    let mut features = Vec::new();
    for (shape, template) in templates.iter().enumerate() {
        for i in 0..per_shape {
            let row: Vec<f64> = template
                .iter()
                .map(|&mean| Poisson::new(mean).map(|p| p.sample(&mut rng)).unwrap_or(mean))
                .collect();
            coordinates.push(vec![shape as f64, i as f64 / per_shape as f64]);
            features.push(row);
        }
    }
    SampleStore::from_rows(coordinates, features)?.with_param_names(["shape", "t"])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = histograms(40)?.normalized();

    for max_d in [0.02, 0.1, 0.5] {
        let clusterer = HierarchicalClusterer::new(max_d);
        println!("max_d = {}", max_d);
        for fraction in [0.9, 0.5, 0.2] {
            let table = SubsampleStabilityTester::new()
                .fraction(fraction)
                .repeat(100)
                .random_seed(7)
                .run(&store, &clusterer)?;
            let summary = table.summary()?;
            println!(
                "  fraction {:.1}: fom {:.3} \u{00B1} {:.3}, clusters {:.2} \u{00B1} {:.2}",
                fraction, summary.fom_mean, summary.fom_std, summary.nclusters_mean, summary.nclusters_std
            );
        }
    }

    let table = SubsampleStabilityTester::thorough()
        .fraction(0.5)
        .random_seed(7)
        .show_progress(true)
        .run(&store, &HierarchicalClusterer::new(0.1))?;
    println!();
    println!("{}", output::format_summary(&table));
    Ok(())
}
