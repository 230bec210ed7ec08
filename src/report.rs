//! The comprehensive audit report, the pipeline's terminal artifact.
//!
//! A [`ComprehensiveReport`] is created exactly once per run, immutable
//! after construction, and fully self-describing: it embeds the
//! configuration snapshot the run used, so renderers need no side-channel
//! state.

use crate::config::AuditConfig;
use crate::phase::{AuditPhase, PhaseReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Aggregate outcome of a run.
///
/// `Failed` means at least one analyzer threw; `Warning` means every
/// analyzer returned but at least one phase missed its threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    #[default]
    Passed,
    Warning,
    Failed,
}

impl OverallStatus {
    /// Whether a CI gate consuming this report may exit successfully.
    pub fn permits_success_exit(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "PASSED",
            Self::Warning => "WARNING",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// The four-bucket production-readiness classification.
///
/// Variant order is ascending readiness, so comparisons like
/// `level >= ReadinessLevel::Ready` read naturally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ReadinessLevel {
    NotReady,
    NeedsWork,
    Ready,
    Excellent,
}

impl ReadinessLevel {
    pub fn is_deployable(&self) -> bool {
        *self >= Self::Ready
    }
}

impl fmt::Display for ReadinessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotReady => "Not Ready",
            Self::NeedsWork => "Needs Work",
            Self::Ready => "Ready",
            Self::Excellent => "Excellent",
        };
        write!(f, "{}", s)
    }
}

/// A recorded analyzer failure: the phase plus the thrown error, verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseError {
    pub phase: AuditPhase,
    pub message: String,
}

/// The terminal artifact of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Total wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Unweighted arithmetic mean of executed phase scores. The scoring
    /// engine's readiness assessment applies the weighted methodology; this
    /// field is the renderer-facing aggregate.
    pub overall_score: f64,
    pub overall_status: OverallStatus,
    /// Coarse readiness classification. Downstream consumers should prefer
    /// the scoring engine's full assessment.
    pub readiness: ReadinessLevel,
    pub phases_executed: Vec<AuditPhase>,
    pub phases_passed: Vec<AuditPhase>,
    pub phases_failed: Vec<AuditPhase>,
    pub phase_reports: BTreeMap<AuditPhase, PhaseReport>,
    /// Phases whose analyzer threw, with the thrown error.
    pub errors: Vec<PhaseError>,
    /// Union of all phase recommendations, first occurrence order, deduped.
    pub recommendations: Vec<String>,
    /// The configuration snapshot this run used.
    pub config: AuditConfig,
}

impl ComprehensiveReport {
    /// Assemble the report from collected phase results.
    ///
    /// `reports` holds every phase that completed; `errors` every phase
    /// whose analyzer threw. Cancelled in-flight phases appear in neither.
    pub fn assemble(
        config: AuditConfig,
        reports: BTreeMap<AuditPhase, PhaseReport>,
        errors: Vec<PhaseError>,
        execution_time_ms: u64,
    ) -> Self {
        let mut phases_executed: Vec<AuditPhase> = Vec::new();
        let mut phases_passed: Vec<AuditPhase> = Vec::new();
        let mut phases_failed: Vec<AuditPhase> = Vec::new();

        for phase in AuditPhase::ALL {
            if let Some(report) = reports.get(&phase) {
                phases_executed.push(phase);
                if report.status.is_passed() {
                    phases_passed.push(phase);
                } else {
                    phases_failed.push(phase);
                }
            } else if errors.iter().any(|e| e.phase == phase) {
                phases_executed.push(phase);
            }
        }

        let overall_score = if reports.is_empty() {
            0.0
        } else {
            reports.values().map(|r| r.score).sum::<f64>() / reports.len() as f64
        };

        let overall_status = if !errors.is_empty() {
            OverallStatus::Failed
        } else if !phases_failed.is_empty() {
            OverallStatus::Warning
        } else {
            OverallStatus::Passed
        };

        let readiness = classify_readiness(overall_score, phases_failed.len() + errors.len());

        let mut recommendations: Vec<String> = Vec::new();
        for phase in &phases_executed {
            if let Some(report) = reports.get(phase) {
                for rec in &report.recommendations {
                    if !recommendations.contains(rec) {
                        recommendations.push(rec.clone());
                    }
                }
            }
        }

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            execution_time_ms,
            overall_score,
            overall_status,
            readiness,
            phases_executed,
            phases_passed,
            phases_failed,
            phase_reports: reports,
            errors,
            recommendations,
            config,
        }
    }

    /// The report for a phase that completed, if any.
    pub fn phase_report(&self, phase: AuditPhase) -> Option<&PhaseReport> {
        self.phase_reports.get(&phase)
    }

    /// Score of a completed phase, if any.
    pub fn phase_score(&self, phase: AuditPhase) -> Option<f64> {
        self.phase_reports.get(&phase).map(|r| r.score)
    }
}

/// Coarse four-bucket readiness classification from the mean score and the
/// count of phases that either missed their threshold or errored.
fn classify_readiness(overall_score: f64, failed_count: usize) -> ReadinessLevel {
    if overall_score >= 90.0 && failed_count == 0 {
        ReadinessLevel::Excellent
    } else if overall_score >= 80.0 && failed_count <= 1 {
        ReadinessLevel::Ready
    } else if overall_score >= 70.0 {
        ReadinessLevel::NeedsWork
    } else {
        ReadinessLevel::NotReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseStatus;

    fn passing_report(phase: AuditPhase, score: f64) -> PhaseReport {
        PhaseReport::new(phase, score, PhaseStatus::Passed, "ok")
    }

    fn failing_report(phase: AuditPhase, score: f64) -> PhaseReport {
        PhaseReport::new(phase, score, PhaseStatus::Failed, "below threshold")
    }

    #[test]
    fn test_assemble_all_passing() {
        let mut reports = BTreeMap::new();
        for phase in AuditPhase::ALL {
            reports.insert(phase, passing_report(phase, 95.0));
        }

        let report = ComprehensiveReport::assemble(AuditConfig::default(), reports, vec![], 6000);

        assert!((report.overall_score - 95.0).abs() < f64::EPSILON);
        assert_eq!(report.overall_status, OverallStatus::Passed);
        assert_eq!(report.readiness, ReadinessLevel::Excellent);
        assert_eq!(report.phases_executed.len(), 6);
        assert_eq!(report.phases_passed.len(), 6);
        assert!(report.phases_failed.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_assemble_threshold_miss_is_warning() {
        let mut reports = BTreeMap::new();
        reports.insert(
            AuditPhase::Security,
            failing_report(AuditPhase::Security, 60.0),
        );
        reports.insert(
            AuditPhase::Testing,
            passing_report(AuditPhase::Testing, 90.0),
        );

        let report = ComprehensiveReport::assemble(AuditConfig::default(), reports, vec![], 100);

        assert_eq!(report.overall_status, OverallStatus::Warning);
        assert_eq!(report.phases_failed, vec![AuditPhase::Security]);
        assert_eq!(report.phases_passed, vec![AuditPhase::Testing]);
    }

    #[test]
    fn test_assemble_analyzer_error_is_failed() {
        let mut reports = BTreeMap::new();
        reports.insert(
            AuditPhase::Security,
            passing_report(AuditPhase::Security, 90.0),
        );
        let errors = vec![PhaseError {
            phase: AuditPhase::Testing,
            message: "coverage collector crashed".to_string(),
        }];

        let report = ComprehensiveReport::assemble(AuditConfig::default(), reports, errors, 100);

        assert_eq!(report.overall_status, OverallStatus::Failed);
        // Errored phases count as executed but neither passed nor failed
        assert!(report.phases_executed.contains(&AuditPhase::Testing));
        assert!(!report.phases_passed.contains(&AuditPhase::Testing));
        assert!(!report.phases_failed.contains(&AuditPhase::Testing));
    }

    #[test]
    fn test_passed_and_failed_partition_executed() {
        let mut reports = BTreeMap::new();
        reports.insert(
            AuditPhase::CodeQuality,
            passing_report(AuditPhase::CodeQuality, 85.0),
        );
        reports.insert(
            AuditPhase::Performance,
            failing_report(AuditPhase::Performance, 55.0),
        );
        let errors = vec![PhaseError {
            phase: AuditPhase::Documentation,
            message: "boom".to_string(),
        }];

        let report = ComprehensiveReport::assemble(AuditConfig::default(), reports, errors, 100);

        // passed ∩ failed == ∅
        for phase in &report.phases_passed {
            assert!(!report.phases_failed.contains(phase));
        }
        // passed ∪ failed == executed \ errored
        let mut union: Vec<AuditPhase> = report
            .phases_passed
            .iter()
            .chain(report.phases_failed.iter())
            .copied()
            .collect();
        union.sort();
        let mut expected: Vec<AuditPhase> = report
            .phases_executed
            .iter()
            .copied()
            .filter(|p| !report.errors.iter().any(|e| e.phase == *p))
            .collect();
        expected.sort();
        assert_eq!(union, expected);
    }

    #[test]
    fn test_recommendations_are_deduped_in_order() {
        let mut reports = BTreeMap::new();
        reports.insert(
            AuditPhase::CodeQuality,
            passing_report(AuditPhase::CodeQuality, 85.0)
                .with_recommendations(vec!["reduce complexity".into(), "add tests".into()]),
        );
        reports.insert(
            AuditPhase::Testing,
            passing_report(AuditPhase::Testing, 85.0)
                .with_recommendations(vec!["add tests".into(), "cover branches".into()]),
        );

        let report = ComprehensiveReport::assemble(AuditConfig::default(), reports, vec![], 100);

        assert_eq!(
            report.recommendations,
            vec![
                "reduce complexity".to_string(),
                "add tests".to_string(),
                "cover branches".to_string()
            ]
        );
    }

    #[test]
    fn test_coarse_readiness_buckets() {
        assert_eq!(classify_readiness(95.0, 0), ReadinessLevel::Excellent);
        assert_eq!(classify_readiness(95.0, 1), ReadinessLevel::Ready);
        assert_eq!(classify_readiness(85.0, 1), ReadinessLevel::Ready);
        assert_eq!(classify_readiness(85.0, 2), ReadinessLevel::NeedsWork);
        assert_eq!(classify_readiness(75.0, 0), ReadinessLevel::NeedsWork);
        assert_eq!(classify_readiness(65.0, 3), ReadinessLevel::NotReady);
    }

    #[test]
    fn test_readiness_level_ordering() {
        assert!(ReadinessLevel::Excellent > ReadinessLevel::Ready);
        assert!(ReadinessLevel::Ready.is_deployable());
        assert!(!ReadinessLevel::NeedsWork.is_deployable());
    }

    #[test]
    fn test_empty_run_scores_zero() {
        let report =
            ComprehensiveReport::assemble(AuditConfig::default(), BTreeMap::new(), vec![], 0);
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.overall_status, OverallStatus::Passed);
        assert_eq!(report.readiness, ReadinessLevel::NotReady);
    }

    #[test]
    fn test_report_serialization_round_trip() {
        let mut reports = BTreeMap::new();
        reports.insert(
            AuditPhase::Security,
            passing_report(AuditPhase::Security, 90.0),
        );
        let report = ComprehensiveReport::assemble(AuditConfig::default(), reports, vec![], 1234);

        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"overallScore\""));
        assert!(json.contains("\"executionTimeMs\""));
        let parsed: ComprehensiveReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
