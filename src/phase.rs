//! Phase definitions and per-phase result types for the audit pipeline.
//!
//! This module provides:
//! - `AuditPhase` - the closed set of six audit categories
//! - `PhaseReport` - the immutable result of one executed phase
//! - `PhaseProgress` - the mutable progress record the orchestrator owns
//!   during a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six fixed audit categories.
///
/// The enumeration is closed: every map in the pipeline is keyed by it, and
/// the orchestrator dispatches to analyzers by table lookup on this value.
/// Variant order is the fixed sequential execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditPhase {
    CodeQuality,
    Security,
    Testing,
    Performance,
    Accessibility,
    Documentation,
}

impl AuditPhase {
    /// All phases in sequential execution order.
    pub const ALL: [AuditPhase; 6] = [
        AuditPhase::CodeQuality,
        AuditPhase::Security,
        AuditPhase::Testing,
        AuditPhase::Performance,
        AuditPhase::Accessibility,
        AuditPhase::Documentation,
    ];

    /// The independent dependency tier: phases with no input from other
    /// analyzers, launched first in parallel mode.
    pub const INDEPENDENT: [AuditPhase; 3] = [
        AuditPhase::CodeQuality,
        AuditPhase::Security,
        AuditPhase::Documentation,
    ];

    /// The dependent dependency tier: phases whose analyzers consume
    /// static-analysis context the independent tier produces.
    pub const DEPENDENT: [AuditPhase; 3] = [
        AuditPhase::Testing,
        AuditPhase::Performance,
        AuditPhase::Accessibility,
    ];

    /// Human-readable name, e.g. "Code Quality".
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CodeQuality => "Code Quality",
            Self::Security => "Security",
            Self::Testing => "Testing",
            Self::Performance => "Performance",
            Self::Accessibility => "Accessibility",
            Self::Documentation => "Documentation",
        }
    }

    /// Wire key used in configuration and report JSON, e.g. "codeQuality".
    pub fn key(&self) -> &'static str {
        match self {
            Self::CodeQuality => "codeQuality",
            Self::Security => "security",
            Self::Testing => "testing",
            Self::Performance => "performance",
            Self::Accessibility => "accessibility",
            Self::Documentation => "documentation",
        }
    }
}

impl fmt::Display for AuditPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for AuditPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "codequality" => Ok(Self::CodeQuality),
            "security" => Ok(Self::Security),
            "testing" => Ok(Self::Testing),
            "performance" => Ok(Self::Performance),
            "accessibility" => Ok(Self::Accessibility),
            "documentation" => Ok(Self::Documentation),
            _ => anyhow::bail!(
                "Unknown audit phase '{}'. Valid phases: codeQuality, security, testing, \
                 performance, accessibility, documentation",
                s
            ),
        }
    }
}

/// Threshold outcome of an executed phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    /// The phase met its configured pass condition.
    #[default]
    Passed,
    /// The phase ran but missed its configured pass condition.
    Failed,
}

impl PhaseStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Result of one executed phase.
///
/// Created by the orchestrator immediately after the phase analyzer returns
/// and never mutated afterward. The `details` payload is analyzer-specific
/// and opaque to the pipeline except for the well-known fields the scoring
/// engine reads (security issue counts, test coverage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseReport {
    /// Phase this report belongs to.
    pub phase: AuditPhase,
    /// When the analyzer call returned.
    pub timestamp: DateTime<Utc>,
    /// Analyzer score, 0-100.
    pub score: f64,
    /// Whether the configured pass condition held.
    pub status: PhaseStatus,
    /// One-line human summary from the analyzer.
    pub summary: String,
    /// Analyzer-specific structured payload.
    #[serde(default)]
    pub details: serde_json::Value,
    /// Ordered remediation suggestions from the analyzer.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl PhaseReport {
    /// Create a new phase report.
    ///
    /// # Examples
    ///
    /// ```
    /// use greenlight::phase::{AuditPhase, PhaseReport, PhaseStatus};
    ///
    /// let report = PhaseReport::new(AuditPhase::Security, 92.0, PhaseStatus::Passed, "No issues");
    /// assert_eq!(report.phase, AuditPhase::Security);
    /// assert!(report.status.is_passed());
    /// ```
    pub fn new(
        phase: AuditPhase,
        score: f64,
        status: PhaseStatus,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            timestamp: Utc::now(),
            score,
            status,
            summary: summary.into(),
            details: serde_json::Value::Null,
            recommendations: Vec::new(),
        }
    }

    /// Attach the analyzer's structured details payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Attach the analyzer's recommendation list.
    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    /// Read a numeric field from the details payload.
    pub fn detail_f64(&self, key: &str) -> Option<f64> {
        self.details.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Read an integer field from the details payload.
    pub fn detail_u64(&self, key: &str) -> Option<u64> {
        self.details.get(key).and_then(serde_json::Value::as_u64)
    }
}

/// Lifecycle state of a phase within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Configured but not yet started.
    #[default]
    Pending,
    /// Analyzer call in flight.
    Running,
    /// Analyzer returned and the report was recorded.
    Completed,
    /// Analyzer threw, or the run was cancelled while this phase was running.
    Failed,
}

impl ProgressStatus {
    /// Check if this status is terminal (no further transitions are legal).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Mutable progress record for one configured phase.
///
/// Owned exclusively by the orchestrator for the duration of a run; external
/// readers only ever see cloned snapshots. Legal transitions are
/// pending -> running -> {completed, failed}; every transition method returns
/// `false` and leaves the record unchanged when the transition is illegal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub phase: AuditPhase,
    pub status: ProgressStatus,
    /// Numeric progress, 0-100.
    pub percent: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Failure cause when status is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseProgress {
    /// Create a pending progress record for a configured phase.
    pub fn new(phase: AuditPhase) -> Self {
        Self {
            phase,
            status: ProgressStatus::Pending,
            percent: 0,
            message: "pending".to_string(),
            started_at: None,
            ended_at: None,
            error: None,
        }
    }

    /// Transition pending -> running.
    pub fn start(&mut self) -> bool {
        if self.status != ProgressStatus::Pending {
            return false;
        }
        self.status = ProgressStatus::Running;
        self.percent = 10;
        self.message = format!("running {} analysis", self.phase);
        self.started_at = Some(Utc::now());
        true
    }

    /// Transition running -> completed.
    pub fn complete(&mut self, message: impl Into<String>) -> bool {
        if self.status != ProgressStatus::Running {
            return false;
        }
        self.status = ProgressStatus::Completed;
        self.percent = 100;
        self.message = message.into();
        self.ended_at = Some(Utc::now());
        true
    }

    /// Transition running -> failed with a cause.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.status != ProgressStatus::Running {
            return false;
        }
        let error = error.into();
        self.status = ProgressStatus::Failed;
        self.message = format!("{} analysis failed", self.phase);
        self.error = Some(error);
        self.ended_at = Some(Utc::now());
        true
    }

    /// Force a running entry to failed in response to a cancellation request.
    ///
    /// Pending and terminal entries are left untouched: cancellation only
    /// affects phases whose analyzer is currently in flight.
    pub fn cancel(&mut self) -> bool {
        if self.status != ProgressStatus::Running {
            return false;
        }
        self.status = ProgressStatus::Failed;
        self.message = "cancelled".to_string();
        self.error = Some("cancelled".to_string());
        self.ended_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // AuditPhase tests
    // =========================================

    #[test]
    fn test_phase_order_is_fixed() {
        assert_eq!(AuditPhase::ALL[0], AuditPhase::CodeQuality);
        assert_eq!(AuditPhase::ALL[5], AuditPhase::Documentation);
        assert_eq!(AuditPhase::ALL.len(), 6);
    }

    #[test]
    fn test_tiers_partition_all_phases() {
        let mut combined: Vec<AuditPhase> = AuditPhase::INDEPENDENT
            .iter()
            .chain(AuditPhase::DEPENDENT.iter())
            .copied()
            .collect();
        combined.sort();
        let mut all = AuditPhase::ALL.to_vec();
        all.sort();
        assert_eq!(combined, all);
    }

    #[test]
    fn test_phase_serializes_to_camel_case() {
        let json = serde_json::to_string(&AuditPhase::CodeQuality).unwrap();
        assert_eq!(json, "\"codeQuality\"");
        let parsed: AuditPhase = serde_json::from_str("\"accessibility\"").unwrap();
        assert_eq!(parsed, AuditPhase::Accessibility);
    }

    #[test]
    fn test_phase_from_str_lenient() {
        assert_eq!(
            "codeQuality".parse::<AuditPhase>().unwrap(),
            AuditPhase::CodeQuality
        );
        assert_eq!(
            "code-quality".parse::<AuditPhase>().unwrap(),
            AuditPhase::CodeQuality
        );
        assert_eq!(
            "SECURITY".parse::<AuditPhase>().unwrap(),
            AuditPhase::Security
        );
        assert!("styling".parse::<AuditPhase>().is_err());
    }

    #[test]
    fn test_phase_map_keys_round_trip() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(AuditPhase::Security, true);
        map.insert(AuditPhase::Testing, false);
        let json = serde_json::to_string(&map).unwrap();
        let parsed: BTreeMap<AuditPhase, bool> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    // =========================================
    // PhaseReport tests
    // =========================================

    #[test]
    fn test_phase_report_builder() {
        let report = PhaseReport::new(AuditPhase::Testing, 85.0, PhaseStatus::Passed, "ok")
            .with_details(serde_json::json!({"coverage": 85.5}))
            .with_recommendations(vec!["Add branch coverage".to_string()]);

        assert_eq!(report.detail_f64("coverage"), Some(85.5));
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.detail_u64("missing").is_none());
    }

    #[test]
    fn test_phase_report_serialization_round_trip() {
        let report = PhaseReport::new(AuditPhase::Security, 70.0, PhaseStatus::Failed, "issues")
            .with_details(serde_json::json!({"criticalIssues": 1, "highIssues": 3}));

        let json = serde_json::to_string(&report).unwrap();
        let parsed: PhaseReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.detail_u64("criticalIssues"), Some(1));
    }

    // =========================================
    // PhaseProgress transition tests
    // =========================================

    #[test]
    fn test_progress_legal_lifecycle() {
        let mut progress = PhaseProgress::new(AuditPhase::Performance);
        assert_eq!(progress.status, ProgressStatus::Pending);
        assert_eq!(progress.percent, 0);

        assert!(progress.start());
        assert_eq!(progress.status, ProgressStatus::Running);
        assert!(progress.started_at.is_some());

        assert!(progress.complete("done"));
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.percent, 100);
        assert!(progress.ended_at.is_some());
    }

    #[test]
    fn test_progress_fail_records_cause() {
        let mut progress = PhaseProgress::new(AuditPhase::Security);
        progress.start();
        assert!(progress.fail("analyzer exploded"));
        assert_eq!(progress.status, ProgressStatus::Failed);
        assert_eq!(progress.error.as_deref(), Some("analyzer exploded"));
    }

    #[test]
    fn test_progress_illegal_transitions_rejected() {
        let mut progress = PhaseProgress::new(AuditPhase::Testing);

        // Cannot complete or fail before starting
        assert!(!progress.complete("nope"));
        assert!(!progress.fail("nope"));
        assert_eq!(progress.status, ProgressStatus::Pending);

        progress.start();
        progress.complete("done");

        // Terminal states accept nothing
        assert!(!progress.start());
        assert!(!progress.fail("late failure"));
        assert!(!progress.cancel());
        assert_eq!(progress.status, ProgressStatus::Completed);
    }

    #[test]
    fn test_progress_cancel_only_hits_running() {
        let mut pending = PhaseProgress::new(AuditPhase::Documentation);
        assert!(!pending.cancel());
        assert_eq!(pending.status, ProgressStatus::Pending);

        let mut running = PhaseProgress::new(AuditPhase::Performance);
        running.start();
        assert!(running.cancel());
        assert_eq!(running.status, ProgressStatus::Failed);
        assert_eq!(running.message, "cancelled");
        assert_eq!(running.error.as_deref(), Some("cancelled"));
    }

    #[test]
    fn test_progress_status_terminal() {
        assert!(!ProgressStatus::Pending.is_terminal());
        assert!(!ProgressStatus::Running.is_terminal());
        assert!(ProgressStatus::Completed.is_terminal());
        assert!(ProgressStatus::Failed.is_terminal());
    }
}
