//! `greenlight run`: execute the audit over captured analyzer results and
//! gate on the outcome.
//!
//! Exit codes: 0 when the overall status permits success, 1 when an
//! analyzer error failed the run, 2 on configuration errors.

use anyhow::{Context, Result};
use console::style;
use greenlight::analyzer::{AnalyzerRegistry, ResultsFile};
use greenlight::config::{AuditConfig, ConfigOverrides};
use greenlight::errors::ConfigError;
use greenlight::orchestrator::{AuditOrchestrator, RunOptions};
use greenlight::scoring::ScoringEngine;
use greenlight::ui::AuditUI;
use std::path::PathBuf;
use std::sync::Arc;

pub struct RunArgs {
    pub config: PathBuf,
    pub results: PathBuf,
    pub sequential: bool,
    pub stop_on_error: bool,
    pub production: bool,
    pub development: bool,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

pub async fn execute(args: RunArgs) -> Result<i32> {
    let config = match AuditConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            return Ok(2);
        }
    };

    let results = ResultsFile::load(&args.results)?;
    let registry = AnalyzerRegistry::from_results(results);

    let mut overrides = if args.production {
        ConfigOverrides::production()
    } else if args.development {
        ConfigOverrides::development()
    } else {
        ConfigOverrides::default()
    };
    if args.sequential {
        overrides.parallel = Some(false);
    }
    if args.verbose {
        overrides.verbose = Some(true);
    }

    let effective = config.apply_overrides(&overrides);
    let ui = Arc::new(AuditUI::new(
        effective.enabled_phases().len() as u64,
        effective.verbose,
    ));

    let progress_ui = Arc::clone(&ui);
    let phase_ui = Arc::clone(&ui);
    let orchestrator = AuditOrchestrator::new(config, registry)
        .with_progress_callback(move |progress| progress_ui.on_progress(progress))
        .with_phase_callback(move |report| phase_ui.on_phase_complete(report));

    let run_options = RunOptions {
        overrides: Some(overrides),
        stop_on_error: args.stop_on_error,
    };
    let report = match orchestrator.execute_audit(run_options).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(config_err) = e.downcast_ref::<ConfigError>() {
                eprintln!("{} {}", style("error:").red().bold(), config_err);
                return Ok(2);
            }
            return Err(e);
        }
    };

    let engine = ScoringEngine::default();
    let assessment = engine.assess(&report);
    ui.finish(&report, &assessment);

    if report.config.output_format.includes_json() {
        let path = args
            .output
            .unwrap_or_else(|| report.config.output_path.clone());
        let content =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("  Report written to {}", path.display());
    }

    Ok(if report.overall_status.permits_success_exit() {
        0
    } else {
        1
    })
}
