//! The audit orchestrator: sequences phase execution, tracks progress, and
//! assembles the comprehensive report.
//!
//! One orchestrator instance coordinates one run at a time. It owns the
//! progress map for the duration of the run (single writer), exposes
//! immutable snapshots to concurrent readers, and fans out to phase
//! analyzers either sequentially or in two concurrency tiers joined with a
//! partial-failure-tolerant join: every launched phase resolves to a report
//! or an error, and no phase's failure cancels its siblings.
//!
//! ## Example
//!
//! ```no_run
//! use greenlight::analyzer::{AnalyzerOutput, AnalyzerRegistry, StaticAnalyzer};
//! use greenlight::config::AuditConfig;
//! use greenlight::orchestrator::{AuditOrchestrator, RunOptions};
//! use greenlight::phase::AuditPhase;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut registry = AnalyzerRegistry::new();
//! for phase in AuditPhase::ALL {
//!     registry.register(StaticAnalyzer::new(phase, AnalyzerOutput::new(90.0, "ok")));
//! }
//!
//! let orchestrator = AuditOrchestrator::new(AuditConfig::default(), registry);
//! let report = orchestrator.execute_audit(RunOptions::default()).await?;
//! println!("{}: {:.1}", report.overall_status, report.overall_score);
//! # Ok(())
//! # }
//! ```

use crate::analyzer::{AnalyzerOutput, AnalyzerRegistry};
use crate::config::{AuditConfig, AuditThresholds, ConfigOverrides};
use crate::errors::{AuditError, ConfigError, ErrorCategory};
use crate::phase::{AuditPhase, PhaseProgress, PhaseReport, PhaseStatus, ProgressStatus};
use crate::report::{ComprehensiveReport, PhaseError};
use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Caller-facing options for one run.
#[derive(Default)]
pub struct RunOptions {
    /// Overrides layered over the orchestrator's base configuration before
    /// the run starts.
    pub overrides: Option<ConfigOverrides>,
    /// Abort the run after the first analyzer error instead of recording it
    /// and continuing.
    pub stop_on_error: bool,
}

/// Observable run lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Initializing,
    Executing,
    Reporting,
    Done,
    Cancelled,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Executing => "executing",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

type ProgressCallback = Box<dyn Fn(&PhaseProgress) + Send + Sync>;
type PhaseCallback = Box<dyn Fn(&PhaseReport) + Send + Sync>;

/// Coordinates phase analyzers into a single audit run.
pub struct AuditOrchestrator {
    config: AuditConfig,
    registry: AnalyzerRegistry,
    state: Mutex<RunState>,
    progress: Mutex<BTreeMap<AuditPhase, PhaseProgress>>,
    cancelled: AtomicBool,
    on_progress: Option<ProgressCallback>,
    on_phase_complete: Option<PhaseCallback>,
}

impl AuditOrchestrator {
    /// Create an orchestrator over a base configuration and analyzer table.
    pub fn new(config: AuditConfig, registry: AnalyzerRegistry) -> Self {
        Self {
            config,
            registry,
            state: Mutex::new(RunState::Idle),
            progress: Mutex::new(BTreeMap::new()),
            cancelled: AtomicBool::new(false),
            on_progress: None,
            on_phase_complete: None,
        }
    }

    /// Register a callback invoked synchronously on every progress
    /// transition. Callbacks run on the coordinating task; a blocking
    /// callback serializes an otherwise-concurrent tier.
    pub fn with_progress_callback(
        mut self,
        callback: impl Fn(&PhaseProgress) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Register a callback invoked synchronously when a phase completes
    /// with a report.
    pub fn with_phase_callback(
        mut self,
        callback: impl Fn(&PhaseReport) + Send + Sync + 'static,
    ) -> Self {
        self.on_phase_complete = Some(Box::new(callback));
        self
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        *lock(&self.state)
    }

    /// Read-only snapshot of per-phase progress in execution order.
    ///
    /// Safe to call concurrently with an in-flight run; two calls without
    /// an intervening transition return equal snapshots.
    pub fn progress_snapshot(&self) -> Vec<PhaseProgress> {
        let progress = lock(&self.progress);
        AuditPhase::ALL
            .iter()
            .filter_map(|phase| progress.get(phase).cloned())
            .collect()
    }

    /// Request cancellation of the current run.
    ///
    /// Advisory only: every currently running progress entry is forced to
    /// failed with message "cancelled", but in-flight analyzer calls are
    /// not interrupted. The final report is still assembled from whatever
    /// phases completed before the call.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);

        let forced: Vec<PhaseProgress> = {
            let mut progress = lock(&self.progress);
            progress
                .values_mut()
                .filter_map(|entry| entry.cancel().then(|| entry.clone()))
                .collect()
        };
        for entry in &forced {
            if let Some(callback) = &self.on_progress {
                callback(entry);
            }
        }

        let mut state = lock(&self.state);
        if *state == RunState::Executing {
            *state = RunState::Cancelled;
        }
    }

    /// Prepare a run: layer overrides, validate the effective
    /// configuration, and build one pending progress entry per enabled
    /// phase. Fails fast on any configuration violation.
    pub fn initialize(&self, options: &RunOptions) -> Result<AuditConfig, ConfigError> {
        self.set_state(RunState::Initializing);
        self.cancelled.store(false, Ordering::SeqCst);

        let config = match &options.overrides {
            Some(overrides) => self.config.apply_overrides(overrides),
            None => self.config.clone(),
        };

        let violations = config.validate();
        if !violations.is_empty() {
            self.set_state(RunState::Idle);
            return Err(ConfigError::Invalid { violations });
        }

        let mut progress = lock(&self.progress);
        *progress = config
            .enabled_phases()
            .into_iter()
            .map(|phase| (phase, PhaseProgress::new(phase)))
            .collect();

        Ok(config)
    }

    /// Run the full audit and assemble the comprehensive report.
    pub async fn execute_audit(&self, options: RunOptions) -> Result<ComprehensiveReport> {
        let started = Instant::now();
        let config = self.initialize(&options)?;
        self.set_state(RunState::Executing);

        let mut reports: BTreeMap<AuditPhase, PhaseReport> = BTreeMap::new();
        let mut errors: Vec<PhaseError> = Vec::new();

        if config.parallel {
            self.execute_tiered(&config, &options, &mut reports, &mut errors)
                .await?;
        } else {
            self.execute_sequential(&config, &options, &mut reports, &mut errors)
                .await?;
        }

        self.set_state(RunState::Reporting);
        let report = ComprehensiveReport::assemble(
            config,
            reports,
            errors,
            started.elapsed().as_millis() as u64,
        );

        if self.cancelled.load(Ordering::SeqCst) {
            self.set_state(RunState::Cancelled);
        } else {
            self.set_state(RunState::Done);
        }
        Ok(report)
    }

    /// Sequential mode: fixed phase order, one analyzer at a time.
    async fn execute_sequential(
        &self,
        config: &AuditConfig,
        options: &RunOptions,
        reports: &mut BTreeMap<AuditPhase, PhaseReport>,
        errors: &mut Vec<PhaseError>,
    ) -> Result<()> {
        for phase in config.enabled_phases() {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }
            let result = self.execute_phase(phase, config).await;
            let stop = self.collect(phase, result, reports, errors)? && options.stop_on_error;
            if stop {
                break;
            }
        }
        Ok(())
    }

    /// Parallel mode: the independent tier runs concurrently and is fully
    /// joined before the dependent tier launches. Within a tier the join is
    /// partial-failure tolerant.
    async fn execute_tiered(
        &self,
        config: &AuditConfig,
        options: &RunOptions,
        reports: &mut BTreeMap<AuditPhase, PhaseReport>,
        errors: &mut Vec<PhaseError>,
    ) -> Result<()> {
        for tier in [&AuditPhase::INDEPENDENT, &AuditPhase::DEPENDENT] {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }
            let phases: Vec<AuditPhase> = tier
                .iter()
                .copied()
                .filter(|p| config.is_enabled(*p))
                .collect();

            let results = join_all(
                phases
                    .iter()
                    .map(|phase| self.execute_phase(*phase, config)),
            )
            .await;

            let mut tier_errored = false;
            for (phase, result) in phases.into_iter().zip(results) {
                tier_errored |= self.collect(phase, result, reports, errors)?;
            }
            if tier_errored && options.stop_on_error {
                break;
            }
        }
        Ok(())
    }

    /// Record one phase outcome. Returns `true` when an analyzer error was
    /// recorded. Orchestrator-category errors are programming errors and
    /// abort the run; cancellations are dropped silently.
    fn collect(
        &self,
        phase: AuditPhase,
        result: Result<PhaseReport, AuditError>,
        reports: &mut BTreeMap<AuditPhase, PhaseReport>,
        errors: &mut Vec<PhaseError>,
    ) -> Result<bool> {
        match result {
            Ok(report) => {
                reports.insert(phase, report);
                Ok(false)
            }
            Err(e) if e.is_cancellation() => Ok(false),
            Err(e) if e.category == ErrorCategory::Orchestrator => Err(e.into()),
            Err(e) => {
                errors.push(PhaseError {
                    phase,
                    message: e.message,
                });
                Ok(true)
            }
        }
    }

    /// Execute one phase: transition its progress, invoke the analyzer,
    /// and normalize the output into a report by applying the configured
    /// threshold.
    async fn execute_phase(
        &self,
        phase: AuditPhase,
        config: &AuditConfig,
    ) -> Result<PhaseReport, AuditError> {
        let analyzer = self.registry.get(phase).ok_or_else(|| {
            AuditError::orchestrator(format!(
                "No analyzer registered for enabled phase '{}'",
                phase.key()
            ))
            .with_remediation("register an analyzer for every enabled phase")
        })?;

        self.update_progress(phase, |p| {
            p.start();
        });
        if config.verbose {
            eprintln!("[audit] {} analyzer started", phase);
        }

        let outcome = analyzer.analyze().await;

        // A cancellation while the analyzer was in flight already forced
        // this entry to failed; the forced state wins and the late result
        // is discarded.
        if self.cancelled.load(Ordering::SeqCst)
            && self.progress_status(phase) == Some(ProgressStatus::Failed)
        {
            return Err(AuditError::cancelled(phase));
        }

        match outcome {
            Ok(output) => {
                let status = if phase_passes(phase, &output, &config.thresholds) {
                    PhaseStatus::Passed
                } else {
                    PhaseStatus::Failed
                };
                let report = PhaseReport::new(phase, output.score, status, output.summary)
                    .with_details(output.details)
                    .with_recommendations(output.recommendations);

                self.update_progress(phase, |p| {
                    p.complete(format!("{} scored {:.0} ({})", phase, report.score, status));
                });
                if config.verbose {
                    eprintln!("[audit] {} {} at {:.0}", phase, status, report.score);
                }
                if let Some(callback) = &self.on_phase_complete {
                    callback(&report);
                }
                Ok(report)
            }
            Err(e) => {
                let message = e.to_string();
                self.update_progress(phase, |p| {
                    p.fail(message.clone());
                });
                if config.verbose {
                    eprintln!("[audit] {} analyzer failed: {}", phase, message);
                }
                Err(AuditError::phase(phase, message))
            }
        }
    }

    fn set_state(&self, next: RunState) {
        *lock(&self.state) = next;
    }

    fn progress_status(&self, phase: AuditPhase) -> Option<ProgressStatus> {
        lock(&self.progress).get(&phase).map(|p| p.status)
    }

    /// Apply a mutation to one progress entry and fire the progress
    /// callback with the resulting snapshot. The lock is released before
    /// the callback runs so callbacks may take their own snapshots.
    fn update_progress(&self, phase: AuditPhase, mutate: impl FnOnce(&mut PhaseProgress)) {
        let snapshot = {
            let mut progress = lock(&self.progress);
            match progress.get_mut(&phase) {
                Some(entry) => {
                    mutate(entry);
                    Some(entry.clone())
                }
                None => None,
            }
        };
        if let (Some(entry), Some(callback)) = (snapshot, &self.on_progress) {
            callback(&entry);
        }
    }
}

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// The per-category pass condition applied when normalizing an analyzer
/// output into a phase report.
fn phase_passes(phase: AuditPhase, output: &AnalyzerOutput, thresholds: &AuditThresholds) -> bool {
    match phase {
        AuditPhase::CodeQuality => {
            let t = thresholds.code_quality.clone().unwrap_or_default();
            let complexity_ok = output
                .detail_f64("maxComplexity")
                .is_none_or(|c| c <= t.max_complexity as f64);
            output.score >= t.min_score && complexity_ok
        }
        AuditPhase::Security => {
            let t = thresholds.security.clone().unwrap_or_default();
            output.detail_u64("criticalIssues").unwrap_or(0) <= t.max_critical_issues as u64
                && output.detail_u64("highIssues").unwrap_or(0) <= t.max_high_issues as u64
                && output.score >= t.min_score
        }
        AuditPhase::Testing => {
            let t = thresholds.testing.clone().unwrap_or_default();
            output.detail_f64("coverage").unwrap_or(0.0) >= t.min_coverage
        }
        AuditPhase::Performance => {
            let t = thresholds.performance.clone().unwrap_or_default();
            let bundle_ok = output
                .detail_f64("bundleSizeKb")
                .is_none_or(|kb| kb <= t.max_bundle_size_kb as f64);
            output.score >= t.min_score && bundle_ok
        }
        AuditPhase::Accessibility => {
            let t = thresholds.accessibility.clone().unwrap_or_default();
            let contrast_ok = output
                .detail_f64("contrastRatio")
                .is_none_or(|ratio| ratio >= t.min_contrast_ratio);
            output.score >= t.min_score && contrast_ok
        }
        AuditPhase::Documentation => {
            let t = thresholds.documentation.clone().unwrap_or_default();
            output.detail_f64("coverage").unwrap_or(output.score) >= t.min_coverage
        }
    }
}
