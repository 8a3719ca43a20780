//! Console output utilities
//!
//! Human-readable run summaries printed by the binary.

use crate::models::{Manifest, TraitOutput};

/// One-line summary of a trait's probabilities and implied prevalence
#[must_use]
pub fn trait_summary_line(key: &str, output: &TraitOutput) -> String {
    let values: Vec<f64> = output.prob_by_cell.values().copied().collect();
    if values.is_empty() {
        return format!("  {key}: no cells");
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let prevalence = output
        .meta
        .national_prevalence()
        .map_or_else(|| "n/a".to_string(), |p| format!("{:.2}%", p * 100.0));
    format!(
        "  {key}: min={min:.4}, max={max:.4}, mean={mean:.4}, prevalence={prevalence}, cells={}",
        values.len()
    )
}

/// Print min / max / mean / prevalence of a trait's probabilities
pub fn print_trait_summary(key: &str, output: &TraitOutput) {
    println!("{}", trait_summary_line(key, output));
}

/// Print the manifest listing with region badges
pub fn print_manifest_summary(manifest: &Manifest) {
    println!(
        "Validation passed! Wrote manifest with {} traits.",
        manifest.traits.len()
    );
    for entry in &manifest.traits {
        let badge = if entry.region_support == "national_only" {
            "[National]"
        } else {
            "[Regional]"
        };
        println!("  • {}: {} {badge}", entry.key, entry.label);
    }
}
