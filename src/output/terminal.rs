//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::ResultTable;

/// Format a ResultTable for human-readable terminal output.
pub fn format_summary(table: &ResultTable) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let md = table.metadata();

    output.push_str("cluster-stability\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Store: {} points, {} drawn per trial ({:.0}%)\n",
        md.store_size,
        md.subsample_size,
        md.fraction * 100.0
    ));
    output.push_str(&format!(
        "  Clustering: {} linkage, max_d = {}, {} metric\n",
        md.linkage, md.max_d, md.metric
    ));
    output.push_str(&format!(
        "  Reference: {} clusters\n",
        md.reference_nclusters
    ));
    let seed_note = if md.seeded { "" } else { " (random)" };
    output.push_str(&format!("  Seed: {}{}\n", md.seed, seed_note));
    output.push('\n');

    let summary = match table.summary() {
        Ok(summary) => summary,
        Err(_) => {
            output.push_str(&format!("  {}\n\n", "No trials were run".yellow().bold()));
            output.push_str(&sep);
            output.push('\n');
            return output;
        }
    };

    output.push_str(&format!(
        "  {}\n\n",
        format_stability(summary.fom_mean, md.fom_bounds)
    ));
    output.push_str(&format!(
        "    {}: {:.3} \u{00B1} {:.3} (min {:.3}, max {:.3})\n",
        md.fom, summary.fom_mean, summary.fom_std, summary.fom_min, summary.fom_max
    ));
    for name in md.foms.iter().filter(|name| **name != md.fom) {
        if let Ok((mean, std)) = table.fom_stats(name) {
            output.push_str(&format!("    {}: {:.3} \u{00B1} {:.3}\n", name, mean, std));
        }
    }
    output.push_str(&format!(
        "    Clusters: {:.2} \u{00B1} {:.2}\n",
        summary.nclusters_mean, summary.nclusters_std
    ));
    output.push('\n');

    output.push_str("    Cluster count distribution:\n");
    for (nclusters, count) in table.nclusters_histogram() {
        let share = count as f64 / summary.n as f64;
        let bar = "\u{2588}".repeat((share * 30.0).round() as usize);
        output.push_str(&format!(
            "      {:>4} clusters  {:>5}  {}\n",
            nclusters, count, bar
        ));
    }
    output.push('\n');

    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!(
        "{} trials in {:.2} s\n",
        summary.n, md.runtime_secs
    ));

    output
}

/// Stability label from where the mean score sits within the score range.
fn format_stability(fom_mean: f64, (lo, hi): (f64, f64)) -> String {
    let position = if hi > lo { (fom_mean - lo) / (hi - lo) } else { 1.0 };
    if position >= 0.95 {
        "\u{2713} Stable clustering".green().bold().to_string()
    } else if position >= 0.75 {
        "\u{26A0} Partly stable clustering".yellow().bold().to_string()
    } else {
        "\u{2717} Unstable clustering".red().bold().to_string()
    }
}
