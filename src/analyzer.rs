//! The phase analyzer contract and registry.
//!
//! Analyzers are external capabilities: one per audit phase, each an
//! asynchronous operation returning a phase-specific result. The pipeline
//! consumes them only through [`PhaseAnalyzer`] and reads a small set of
//! well-known detail fields when normalizing results; everything else in an
//! analyzer's output is opaque.
//!
//! ## Example
//!
//! ```
//! use greenlight::analyzer::{AnalyzerOutput, AnalyzerRegistry, StaticAnalyzer};
//! use greenlight::phase::AuditPhase;
//!
//! let output = AnalyzerOutput::new(92.0, "No vulnerabilities found")
//!     .with_details(serde_json::json!({"criticalIssues": 0, "highIssues": 1}));
//!
//! let mut registry = AnalyzerRegistry::new();
//! registry.register(StaticAnalyzer::new(AuditPhase::Security, output));
//! assert!(registry.contains(AuditPhase::Security));
//! ```

use crate::phase::AuditPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Raw result of one analyzer invocation, before thresholds are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerOutput {
    /// Analyzer score, 0-100.
    pub score: f64,
    /// One-line human summary.
    pub summary: String,
    /// Analyzer-specific structured payload. Well-known fields read by the
    /// pipeline: `criticalIssues` and `highIssues` (security), `coverage`
    /// (testing and documentation), `maxComplexity` (code quality),
    /// `bundleSizeKb` (performance), `contrastRatio` (accessibility).
    #[serde(default)]
    pub details: serde_json::Value,
    /// Ordered remediation suggestions.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl AnalyzerOutput {
    pub fn new(score: f64, summary: impl Into<String>) -> Self {
        Self {
            score,
            summary: summary.into(),
            details: serde_json::Value::Null,
            recommendations: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

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

/// One phase's analysis capability.
///
/// Implementations may run arbitrary internal concurrency; the orchestrator
/// treats the call as opaque and uninterruptible. A returned error is
/// recorded verbatim as the phase's failure cause.
#[async_trait]
pub trait PhaseAnalyzer: Send + Sync {
    /// The phase this analyzer serves.
    fn phase(&self) -> AuditPhase;

    /// Run the analysis.
    async fn analyze(&self) -> Result<AnalyzerOutput>;
}

/// Replays a pre-computed analyzer output.
///
/// This is the bridge between externally-captured analyzer runs and the
/// pipeline: the CLI loads a results file and registers one `StaticAnalyzer`
/// per captured phase. Tests use it to script analyzer behavior.
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    phase: AuditPhase,
    output: AnalyzerOutput,
}

impl StaticAnalyzer {
    pub fn new(phase: AuditPhase, output: AnalyzerOutput) -> Self {
        Self { phase, output }
    }
}

#[async_trait]
impl PhaseAnalyzer for StaticAnalyzer {
    fn phase(&self) -> AuditPhase {
        self.phase
    }

    async fn analyze(&self) -> Result<AnalyzerOutput> {
        Ok(self.output.clone())
    }
}

/// Table of analyzers keyed by phase.
///
/// The orchestrator dispatches through this map and never branches on phase
/// identity itself. Registering a second analyzer for a phase replaces the
/// first.
#[derive(Default, Clone)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<AuditPhase, Arc<dyn PhaseAnalyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an analyzer under its own phase.
    pub fn register(&mut self, analyzer: impl PhaseAnalyzer + 'static) -> &mut Self {
        self.analyzers.insert(analyzer.phase(), Arc::new(analyzer));
        self
    }

    /// Register an already-shared analyzer.
    pub fn register_arc(&mut self, analyzer: Arc<dyn PhaseAnalyzer>) -> &mut Self {
        self.analyzers.insert(analyzer.phase(), analyzer);
        self
    }

    pub fn get(&self, phase: AuditPhase) -> Option<Arc<dyn PhaseAnalyzer>> {
        self.analyzers.get(&phase).cloned()
    }

    pub fn contains(&self, phase: AuditPhase) -> bool {
        self.analyzers.contains_key(&phase)
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Build a registry of [`StaticAnalyzer`]s from a captured results file.
    pub fn from_results(results: ResultsFile) -> Self {
        let mut registry = Self::new();
        for (phase, output) in results.results {
            registry.register(StaticAnalyzer::new(phase, output));
        }
        registry
    }
}

/// A captured set of raw analyzer outputs, one entry per phase.
///
/// This is the JSON document external analyzer runs produce and `greenlight
/// run` consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsFile {
    /// When the outputs were captured, if the producer recorded it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    pub results: BTreeMap<AuditPhase, AnalyzerOutput>,
}

impl ResultsFile {
    /// Load captured results from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results JSON: {}", path.display()))
    }

    /// Save captured results as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize results to JSON")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write results file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_static_analyzer_replays_output() {
        let output = AnalyzerOutput::new(88.0, "ok")
            .with_recommendations(vec!["tighten lint rules".to_string()]);
        let analyzer = StaticAnalyzer::new(AuditPhase::CodeQuality, output.clone());

        assert_eq!(analyzer.phase(), AuditPhase::CodeQuality);
        let result = analyzer.analyze().await.unwrap();
        assert_eq!(result, output);
    }

    #[test]
    fn test_registry_lookup_and_replace() {
        let mut registry = AnalyzerRegistry::new();
        assert!(registry.is_empty());

        registry.register(StaticAnalyzer::new(
            AuditPhase::Security,
            AnalyzerOutput::new(50.0, "first"),
        ));
        registry.register(StaticAnalyzer::new(
            AuditPhase::Security,
            AnalyzerOutput::new(75.0, "second"),
        ));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(AuditPhase::Security));
        assert!(registry.get(AuditPhase::Testing).is_none());
    }

    #[test]
    fn test_analyzer_output_detail_readers() {
        let output = AnalyzerOutput::new(70.0, "issues found")
            .with_details(serde_json::json!({"criticalIssues": 2, "coverage": 63.5}));

        assert_eq!(output.detail_u64("criticalIssues"), Some(2));
        assert_eq!(output.detail_f64("coverage"), Some(63.5));
        assert!(output.detail_u64("bundleSizeKb").is_none());
    }

    #[test]
    fn test_results_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut results = BTreeMap::new();
        results.insert(
            AuditPhase::Testing,
            AnalyzerOutput::new(82.0, "coverage collected")
                .with_details(serde_json::json!({"coverage": 82.0})),
        );
        let file = ResultsFile {
            captured_at: None,
            results,
        };
        file.save(&path).unwrap();

        let loaded = ResultsFile::load(&path).unwrap();
        assert_eq!(loaded.results.len(), 1);
        assert_eq!(
            loaded.results[&AuditPhase::Testing].detail_f64("coverage"),
            Some(82.0)
        );
    }

    #[test]
    fn test_results_file_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "{ invalid").unwrap();

        let err = ResultsFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse results JSON"));
    }

    #[test]
    fn test_registry_from_results() {
        let mut results = BTreeMap::new();
        results.insert(AuditPhase::Security, AnalyzerOutput::new(90.0, "clean"));
        results.insert(AuditPhase::Testing, AnalyzerOutput::new(80.0, "covered"));

        let registry = AnalyzerRegistry::from_results(ResultsFile {
            captured_at: None,
            results,
        });
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(AuditPhase::Security));
        assert!(!registry.contains(AuditPhase::Performance));
    }
}
