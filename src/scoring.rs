//! Weighted scoring and production-readiness assessment.
//!
//! The scoring engine owns the weighting methodology: a weight per phase
//! category, guarded at construction so the weights always sum to 1.0
//! within tolerance. It turns a comprehensive report into a
//! [`ReadinessAssessment`] with an explainable verdict: readiness level,
//! confidence, blockers/warnings/strengths, and a time-to-ready estimate
//! when the codebase is not yet deployable.

use crate::errors::ScoringError;
use crate::phase::{AuditPhase, PhaseReport};
use crate::report::{ComprehensiveReport, ReadinessLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Readiness score penalty per critical security finding.
const CRITICAL_PENALTY: f64 = 25.0;
/// Readiness score penalty per high-severity security finding.
const HIGH_PENALTY: f64 = 10.0;
/// Penalty per percentage point of test coverage below 80.
const COVERAGE_PENALTY_RATE: f64 = 0.5;
/// Penalty per point of security score below 80.
const SECURITY_PENALTY_RATE: f64 = 0.5;
/// Penalty per point of performance score below 70.
const PERFORMANCE_PENALTY_RATE: f64 = 0.3;
/// Penalty per point of code quality score below 70.
const QUALITY_PENALTY_RATE: f64 = 0.3;

/// Runs shorter than this are treated as implausibly fast and reduce
/// confidence in the result.
const MIN_PLAUSIBLE_RUN_MS: u64 = 5_000;

/// Maximum recommendations in an assessment.
const MAX_RECOMMENDATIONS: usize = 10;

/// The full readiness verdict derived from a comprehensive report.
///
/// `score` is the readiness score (penalty-based), distinct from the
/// report's overall score (mean of phase scores).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessAssessment {
    pub level: ReadinessLevel,
    /// Readiness score, 0-100.
    pub score: f64,
    /// Confidence in the verdict, 0-100.
    pub confidence: f64,
    pub blockers: Vec<String>,
    pub warnings: Vec<String>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    /// Human-readable remediation estimate, only for NotReady/NeedsWork.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_to_ready: Option<String>,
}

/// Per-phase line of the scoring breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub phase: AuditPhase,
    pub score: f64,
    pub weight: f64,
    /// This phase's share of the weighted total, after re-normalization.
    pub contribution: f64,
}

/// The weighting methodology laid out per phase so it is independently
/// verifiable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringBreakdown {
    pub entries: Vec<BreakdownEntry>,
    /// Sum of the weights of phases actually present.
    pub weight_sum: f64,
    /// The re-normalized weighted total.
    pub total: f64,
}

/// Readiness factors extracted from a report's phase details.
///
/// `None` means the corresponding phase did not execute; the confidence
/// heuristic accounts for that, not the readiness score.
#[derive(Debug, Clone, Default)]
struct ReadinessFactors {
    critical_findings: u64,
    high_findings: u64,
    coverage: Option<f64>,
    security_score: Option<f64>,
    performance_score: Option<f64>,
    quality_score: Option<f64>,
}

impl ReadinessFactors {
    fn extract(report: &ComprehensiveReport) -> Self {
        let security = report.phase_report(AuditPhase::Security);
        let testing = report.phase_report(AuditPhase::Testing);

        Self {
            critical_findings: security
                .map(|r| r.detail_u64("criticalIssues").unwrap_or(0))
                .unwrap_or(0),
            high_findings: security
                .map(|r| r.detail_u64("highIssues").unwrap_or(0))
                .unwrap_or(0),
            coverage: testing.map(|r| r.detail_f64("coverage").unwrap_or(0.0)),
            security_score: security.map(|r| r.score),
            performance_score: report.phase_score(AuditPhase::Performance),
            quality_score: report.phase_score(AuditPhase::CodeQuality),
        }
    }
}

/// Computes weighted scores and readiness assessments.
#[derive(Debug)]
pub struct ScoringEngine {
    weights: BTreeMap<AuditPhase, f64>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(default_weights()).expect("canonical weights sum to 1.0")
    }
}

/// The canonical phase weights.
pub fn default_weights() -> BTreeMap<AuditPhase, f64> {
    BTreeMap::from([
        (AuditPhase::CodeQuality, 0.20),
        (AuditPhase::Security, 0.25),
        (AuditPhase::Testing, 0.20),
        (AuditPhase::Performance, 0.15),
        (AuditPhase::Accessibility, 0.10),
        (AuditPhase::Documentation, 0.10),
    ])
}

impl ScoringEngine {
    /// Construct with an explicit weight map across the six categories.
    ///
    /// Fails unless every phase has a weight and the weights sum to 1.0
    /// within [`WEIGHT_TOLERANCE`]. The guard exists because a silently
    /// mis-calibrated weight map skews every verdict downstream.
    ///
    /// # Examples
    ///
    /// ```
    /// use greenlight::scoring::{ScoringEngine, default_weights};
    ///
    /// assert!(ScoringEngine::new(default_weights()).is_ok());
    /// ```
    pub fn new(weights: BTreeMap<AuditPhase, f64>) -> Result<Self, ScoringError> {
        for phase in AuditPhase::ALL {
            if !weights.contains_key(&phase) {
                return Err(ScoringError::MissingWeight(phase));
            }
        }
        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ScoringError::InvalidWeightSum { sum });
        }
        Ok(Self { weights })
    }

    /// The weight configured for a phase.
    pub fn weight(&self, phase: AuditPhase) -> f64 {
        self.weights.get(&phase).copied().unwrap_or(0.0)
    }

    /// Weighted average of the available phase scores, re-normalized by the
    /// sum of the weights actually present so a skipped phase does not drag
    /// the score toward zero.
    pub fn overall_score(&self, reports: &BTreeMap<AuditPhase, PhaseReport>) -> f64 {
        let weight_sum: f64 = reports.keys().map(|p| self.weight(*p)).sum();
        if weight_sum == 0.0 {
            return 0.0;
        }
        reports
            .iter()
            .map(|(phase, report)| report.score * self.weight(*phase))
            .sum::<f64>()
            / weight_sum
    }

    /// Per-phase (score, weight, contribution) plus the normalized total.
    pub fn breakdown(&self, reports: &BTreeMap<AuditPhase, PhaseReport>) -> ScoringBreakdown {
        let weight_sum: f64 = reports.keys().map(|p| self.weight(*p)).sum();
        let entries: Vec<BreakdownEntry> = reports
            .iter()
            .map(|(phase, report)| BreakdownEntry {
                phase: *phase,
                score: report.score,
                weight: self.weight(*phase),
                contribution: if weight_sum == 0.0 {
                    0.0
                } else {
                    report.score * self.weight(*phase) / weight_sum
                },
            })
            .collect();
        let total = entries.iter().map(|e| e.contribution).sum();
        ScoringBreakdown {
            entries,
            weight_sum,
            total,
        }
    }

    /// Derive the full production-readiness assessment from a report.
    pub fn assess(&self, report: &ComprehensiveReport) -> ReadinessAssessment {
        let factors = ReadinessFactors::extract(report);

        let score = readiness_score(&factors);
        let level = classify(score, &factors);
        let confidence = confidence(report);
        let blockers = collect_blockers(&factors);
        let warnings = collect_warnings(&factors);
        let strengths = collect_strengths(report, &factors);
        let recommendations = build_recommendations(report, level);
        let estimated_time_to_ready = match level {
            ReadinessLevel::NotReady | ReadinessLevel::NeedsWork => {
                Some(bucket_days(estimate_days(&factors, level)))
            }
            _ => None,
        };

        ReadinessAssessment {
            level,
            score,
            confidence,
            blockers,
            warnings,
            strengths,
            recommendations,
            estimated_time_to_ready,
        }
    }
}

/// Penalty-based readiness score, clamped to [0, 100].
fn readiness_score(factors: &ReadinessFactors) -> f64 {
    let mut score = 100.0;
    score -= CRITICAL_PENALTY * factors.critical_findings as f64;
    score -= HIGH_PENALTY * factors.high_findings as f64;
    if let Some(coverage) = factors.coverage
        && coverage < 80.0
    {
        score -= (80.0 - coverage) * COVERAGE_PENALTY_RATE;
    }
    if let Some(security) = factors.security_score
        && security < 80.0
    {
        score -= (80.0 - security) * SECURITY_PENALTY_RATE;
    }
    if let Some(performance) = factors.performance_score
        && performance < 70.0
    {
        score -= (70.0 - performance) * PERFORMANCE_PENALTY_RATE;
    }
    if let Some(quality) = factors.quality_score
        && quality < 70.0
    {
        score -= (70.0 - quality) * QUALITY_PENALTY_RATE;
    }
    score.clamp(0.0, 100.0)
}

/// Classify the readiness level.
///
/// Any critical finding forces NotReady regardless of score: numeric scores
/// never rescue a critical-severity result.
fn classify(score: f64, factors: &ReadinessFactors) -> ReadinessLevel {
    if factors.critical_findings > 0 {
        return ReadinessLevel::NotReady;
    }
    let coverage = factors.coverage.unwrap_or(0.0);
    let security = factors.security_score.unwrap_or(0.0);
    if score >= 90.0 && coverage >= 85.0 && security >= 85.0 {
        ReadinessLevel::Excellent
    } else if score >= 80.0 && coverage >= 75.0 && security >= 75.0 {
        ReadinessLevel::Ready
    } else if score >= 60.0 {
        ReadinessLevel::NeedsWork
    } else {
        ReadinessLevel::NotReady
    }
}

/// Confidence in the verdict, 0-100.
///
/// Starts from the fraction of the six phases that executed, then drops 10
/// points per orchestration error and 20 points when the run finished
/// implausibly fast, which usually means an analysis pass was skipped.
fn confidence(report: &ComprehensiveReport) -> f64 {
    let executed = report.phases_executed.len() as f64;
    let mut confidence = 100.0 * executed / AuditPhase::ALL.len() as f64;
    confidence -= 10.0 * report.errors.len() as f64;
    if report.execution_time_ms < MIN_PLAUSIBLE_RUN_MS {
        confidence -= 20.0;
    }
    confidence.clamp(0.0, 100.0)
}

fn collect_blockers(factors: &ReadinessFactors) -> Vec<String> {
    let mut blockers = Vec::new();
    if factors.critical_findings > 0 {
        blockers.push(format!(
            "{} critical security finding(s) must be resolved before deployment",
            factors.critical_findings
        ));
    }
    if let Some(coverage) = factors.coverage
        && coverage < 50.0
    {
        blockers.push(format!("Test coverage critically low at {:.0}%", coverage));
    }
    if let Some(security) = factors.security_score
        && security < 50.0
    {
        blockers.push(format!("Security score critically low at {:.0}", security));
    }
    blockers
}

fn collect_warnings(factors: &ReadinessFactors) -> Vec<String> {
    let mut warnings = Vec::new();
    if factors.high_findings > 0 {
        warnings.push(format!(
            "{} high-severity security finding(s) outstanding",
            factors.high_findings
        ));
    }
    if let Some(coverage) = factors.coverage
        && (50.0..80.0).contains(&coverage)
    {
        warnings.push(format!(
            "Test coverage at {:.0}%, below the 80% target",
            coverage
        ));
    }
    if let Some(performance) = factors.performance_score
        && performance < 70.0
    {
        warnings.push(format!("Performance score {:.0} below 70", performance));
    }
    if let Some(quality) = factors.quality_score
        && quality < 70.0
    {
        warnings.push(format!("Code quality score {:.0} below 70", quality));
    }
    warnings
}

fn collect_strengths(report: &ComprehensiveReport, factors: &ReadinessFactors) -> Vec<String> {
    let mut strengths = Vec::new();
    if factors.security_score.is_some() && factors.critical_findings == 0 {
        strengths.push("No critical security findings".to_string());
    }
    if let Some(coverage) = factors.coverage
        && coverage >= 80.0
    {
        strengths.push(format!("Test coverage at {:.0}%", coverage));
    }
    if let Some(security) = factors.security_score
        && security >= 80.0
    {
        strengths.push(format!("Strong security posture ({:.0})", security));
    }
    if let Some(performance) = factors.performance_score
        && performance >= 80.0
    {
        strengths.push(format!("Strong performance profile ({:.0})", performance));
    }
    if let Some(quality) = factors.quality_score
        && quality >= 80.0
    {
        strengths.push(format!("High code quality ({:.0})", quality));
    }
    for (phase, phase_report) in &report.phase_reports {
        if phase_report.score >= 85.0 {
            strengths.push(format!("{} scored {:.0}", phase, phase_report.score));
        }
    }
    strengths
}

/// Fixed guidance per readiness level.
fn level_guidance(level: ReadinessLevel) -> &'static [&'static str] {
    match level {
        ReadinessLevel::NotReady => &[
            "Do not deploy to production until all blockers are resolved",
            "Remediate critical security findings first",
        ],
        ReadinessLevel::NeedsWork => &[
            "Address outstanding warnings before scheduling a release",
            "Raise test coverage toward the 80% target",
        ],
        ReadinessLevel::Ready => &[
            "Resolve remaining warnings during release hardening",
            "Monitor closely after the first production deployment",
        ],
        ReadinessLevel::Excellent => &["Maintain current quality bars in CI"],
    }
}

/// Level guidance first, then up to two recommendations from each failed
/// phase, capped at [`MAX_RECOMMENDATIONS`] total.
fn build_recommendations(report: &ComprehensiveReport, level: ReadinessLevel) -> Vec<String> {
    let mut recommendations: Vec<String> = level_guidance(level)
        .iter()
        .map(|s| s.to_string())
        .collect();

    for phase in &report.phases_failed {
        if let Some(phase_report) = report.phase_report(*phase) {
            for rec in phase_report.recommendations.iter().take(2) {
                if recommendations.len() >= MAX_RECOMMENDATIONS {
                    return recommendations;
                }
                if !recommendations.contains(rec) {
                    recommendations.push(rec.clone());
                }
            }
        }
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// Day-count remediation heuristic.
fn estimate_days(factors: &ReadinessFactors, level: ReadinessLevel) -> u64 {
    let coverage_gap = factors
        .coverage
        .map(|c| (80.0 - c).max(0.0))
        .unwrap_or(0.0);

    let mut days = 2 * factors.high_findings + 3 * (coverage_gap / 10.0).ceil() as u64;
    match level {
        ReadinessLevel::NeedsWork => {
            if factors.performance_score.is_some_and(|p| p < 70.0) {
                days += 5;
            }
        }
        ReadinessLevel::NotReady => {
            days += 5 * factors.critical_findings;
            if factors.coverage.is_some_and(|c| c < 50.0) {
                days += 14;
            }
            if factors.security_score.is_some_and(|s| s < 50.0) {
                days += 21;
            }
        }
        _ => {}
    }
    days
}

/// Bucket a day count into a human-readable range.
fn bucket_days(days: u64) -> String {
    match days {
        0..=7 => "1 week",
        8..=14 => "2 weeks",
        15..=28 => "3-4 weeks",
        29..=56 => "6-8 weeks",
        _ => "2-3 months",
    }
    .to_string()
}
