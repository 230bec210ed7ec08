//! `greenlight init` and `greenlight validate`.

use anyhow::Result;
use console::style;
use greenlight::config::AuditConfig;
use std::path::Path;

/// Write the default configuration template.
pub fn init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        println!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(0);
    }

    AuditConfig::default().save(path)?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        path.display()
    );
    Ok(0)
}

/// Validate the configuration file, printing every violation.
pub fn validate(path: &Path) -> Result<i32> {
    let config = match AuditConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            return Ok(2);
        }
    };

    let violations = config.validate();
    if violations.is_empty() {
        println!(
            "{} {} is valid",
            style("✓").green(),
            path.display()
        );
        return Ok(0);
    }

    eprintln!(
        "{} {} violation(s) in {}:",
        style("✗").red(),
        violations.len(),
        path.display()
    );
    for violation in &violations {
        eprintln!("  {} {}", style("-").dim(), violation);
    }
    Ok(2)
}
