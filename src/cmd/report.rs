//! `greenlight breakdown`: print the weighting methodology for a saved
//! report so the scoring is independently verifiable.

use anyhow::{Context, Result};
use console::style;
use greenlight::report::ComprehensiveReport;
use greenlight::scoring::ScoringEngine;
use std::path::Path;

pub fn breakdown(path: &Path) -> Result<i32> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;
    let report: ComprehensiveReport = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report JSON: {}", path.display()))?;

    let engine = ScoringEngine::default();
    let breakdown = engine.breakdown(&report.phase_reports);

    println!("{:<16} {:>8} {:>8} {:>14}", "Phase", "Score", "Weight", "Contribution");
    for entry in &breakdown.entries {
        println!(
            "{:<16} {:>8.1} {:>8.2} {:>14.2}",
            entry.phase.to_string(),
            entry.score,
            entry.weight,
            entry.contribution
        );
    }
    println!(
        "{:<16} {:>8} {:>8.2} {:>14.2}",
        style("total").bold(),
        "",
        breakdown.weight_sum,
        breakdown.total
    );
    println!(
        "Report overall (unweighted mean): {:.2}",
        report.overall_score
    );

    Ok(0)
}
