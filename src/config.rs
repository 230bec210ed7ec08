//! Audit configuration: defaults, JSON persistence, override layering, and
//! validation.
//!
//! The on-disk format is a JSON document with camelCase keys:
//!
//! ```json
//! {
//!   "phases": { "codeQuality": true, "security": true },
//!   "thresholds": {
//!     "codeQuality": { "minScore": 70.0, "maxComplexity": 10 },
//!     "security": { "maxCriticalIssues": 0, "maxHighIssues": 2, "minScore": 75.0 }
//!   },
//!   "outputFormat": "json",
//!   "outputPath": "audit-report.json",
//!   "parallel": true,
//!   "verbose": false,
//!   "includePatterns": ["**/*"],
//!   "excludePatterns": ["node_modules/**"]
//! }
//! ```
//!
//! `AuditConfig::default()` is the single canonical baseline. Stricter or
//! looser variants are expressed as [`ConfigOverrides`] layers applied on
//! top of it, never as duplicated configurations.

use crate::errors::ConfigError;
use crate::phase::AuditPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Report output format selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Html,
    Both,
}

impl OutputFormat {
    /// Whether a JSON artifact should be written.
    pub fn includes_json(&self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Both => "both",
        };
        write!(f, "{}", s)
    }
}

// =========================================
// Per-category threshold sections
// =========================================

/// Pass bars for the code quality phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeQualityThresholds {
    /// Minimum analyzer score to pass.
    pub min_score: f64,
    /// Maximum acceptable cyclomatic complexity, 1-50.
    pub max_complexity: u32,
}

impl Default for CodeQualityThresholds {
    fn default() -> Self {
        Self {
            min_score: 70.0,
            max_complexity: 10,
        }
    }
}

/// Pass bars for the security phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityThresholds {
    /// Maximum critical-severity findings allowed.
    pub max_critical_issues: u32,
    /// Maximum high-severity findings allowed.
    pub max_high_issues: u32,
    pub min_score: f64,
}

impl Default for SecurityThresholds {
    fn default() -> Self {
        Self {
            max_critical_issues: 0,
            max_high_issues: 2,
            min_score: 75.0,
        }
    }
}

/// Pass bars for the testing phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestingThresholds {
    /// Minimum statement coverage percentage, 0-100.
    pub min_coverage: f64,
}

impl Default for TestingThresholds {
    fn default() -> Self {
        Self { min_coverage: 80.0 }
    }
}

/// Pass bars for the performance phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceThresholds {
    pub min_score: f64,
    /// Maximum shipped bundle size in kilobytes.
    pub max_bundle_size_kb: u32,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            min_score: 70.0,
            max_bundle_size_kb: 512,
        }
    }
}

/// Pass bars for the accessibility phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityThresholds {
    pub min_score: f64,
    /// Minimum WCAG contrast ratio, at least 1.0.
    pub min_contrast_ratio: f64,
}

impl Default for AccessibilityThresholds {
    fn default() -> Self {
        Self {
            min_score: 80.0,
            min_contrast_ratio: 4.5,
        }
    }
}

/// Pass bars for the documentation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentationThresholds {
    /// Minimum documented-symbol coverage percentage, 0-100.
    pub min_coverage: f64,
}

impl Default for DocumentationThresholds {
    fn default() -> Self {
        Self { min_coverage: 60.0 }
    }
}

/// The full thresholds section, one optional entry per phase category.
///
/// Entries are optional in the serde model so the "every enabled phase has a
/// threshold entry" invariant is a real, checkable property of a loaded file
/// rather than something the type system silently papers over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditThresholds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<CodeQualityThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing: Option<TestingThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<DocumentationThresholds>,
}

impl Default for AuditThresholds {
    fn default() -> Self {
        Self {
            code_quality: Some(CodeQualityThresholds::default()),
            security: Some(SecurityThresholds::default()),
            testing: Some(TestingThresholds::default()),
            performance: Some(PerformanceThresholds::default()),
            accessibility: Some(AccessibilityThresholds::default()),
            documentation: Some(DocumentationThresholds::default()),
        }
    }
}

impl AuditThresholds {
    /// Check whether the section for a phase is present.
    pub fn has_entry(&self, phase: AuditPhase) -> bool {
        match phase {
            AuditPhase::CodeQuality => self.code_quality.is_some(),
            AuditPhase::Security => self.security.is_some(),
            AuditPhase::Testing => self.testing.is_some(),
            AuditPhase::Performance => self.performance.is_some(),
            AuditPhase::Accessibility => self.accessibility.is_some(),
            AuditPhase::Documentation => self.documentation.is_some(),
        }
    }
}

// =========================================
// The configuration value object
// =========================================

fn default_phases() -> BTreeMap<AuditPhase, bool> {
    AuditPhase::ALL.iter().map(|p| (*p, true)).collect()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("audit-report.json")
}

fn default_parallel() -> bool {
    true
}

fn default_include_patterns() -> Vec<String> {
    vec!["**/*".to_string()]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "node_modules/**".to_string(),
        "dist/**".to_string(),
        "target/**".to_string(),
    ]
}

/// The audit pipeline configuration.
///
/// Constructed from defaults, optionally overlaid with a loaded file, then
/// optionally overlaid again with caller overrides. Immutable once an
/// orchestration run starts (the orchestrator snapshots it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditConfig {
    /// Which phases run.
    pub phases: BTreeMap<AuditPhase, bool>,
    /// Per-category pass bars.
    pub thresholds: AuditThresholds,
    pub output_format: OutputFormat,
    pub output_path: PathBuf,
    /// Concurrent tiered execution when `true`, fixed-order sequential
    /// otherwise.
    pub parallel: bool,
    pub verbose: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            phases: default_phases(),
            thresholds: AuditThresholds::default(),
            output_format: OutputFormat::default(),
            output_path: default_output_path(),
            parallel: default_parallel(),
            verbose: false,
            include_patterns: default_include_patterns(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: the default configuration is written
    /// out as a template at `path` and returned. Malformed content fails
    /// with a [`ConfigError::Parse`] and is never partially applied.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check whether a phase is enabled.
    pub fn is_enabled(&self, phase: AuditPhase) -> bool {
        self.phases.get(&phase).copied().unwrap_or(false)
    }

    /// All enabled phases in execution order.
    pub fn enabled_phases(&self) -> Vec<AuditPhase> {
        AuditPhase::ALL
            .iter()
            .copied()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }

    /// Produce a new configuration with `overrides` layered on top of
    /// `self`. `self` is not mutated.
    ///
    /// Merge semantics: nested sections merge field-by-field and maps merge
    /// per key; scalars and arrays replace wholesale.
    pub fn apply_overrides(&self, overrides: &ConfigOverrides) -> Self {
        let mut merged = self.clone();

        if let Some(ref phases) = overrides.phases {
            for (phase, enabled) in phases {
                merged.phases.insert(*phase, *enabled);
            }
        }
        if let Some(ref thresholds) = overrides.thresholds {
            thresholds.merge_into(&mut merged.thresholds);
        }
        if let Some(format) = overrides.output_format {
            merged.output_format = format;
        }
        if let Some(ref path) = overrides.output_path {
            merged.output_path = path.clone();
        }
        if let Some(parallel) = overrides.parallel {
            merged.parallel = parallel;
        }
        if let Some(verbose) = overrides.verbose {
            merged.verbose = verbose;
        }
        if let Some(ref patterns) = overrides.include_patterns {
            merged.include_patterns = patterns.clone();
        }
        if let Some(ref patterns) = overrides.exclude_patterns {
            merged.exclude_patterns = patterns.clone();
        }

        merged
    }

    /// Validate the configuration, returning every violated invariant.
    ///
    /// An empty list means valid. All checks run so a single round-trip
    /// surfaces every problem.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for phase in self.enabled_phases() {
            if !self.thresholds.has_entry(phase) {
                violations.push(format!(
                    "Phase '{}' is enabled but has no threshold entry",
                    phase.key()
                ));
            }
        }

        if let Some(ref t) = self.thresholds.code_quality {
            check_percent(&mut violations, "codeQuality.minScore", t.min_score);
            if !(1..=50).contains(&t.max_complexity) {
                violations.push(format!(
                    "codeQuality.maxComplexity must be between 1 and 50, got {}",
                    t.max_complexity
                ));
            }
        }
        if let Some(ref t) = self.thresholds.security {
            check_percent(&mut violations, "security.minScore", t.min_score);
        }
        if let Some(ref t) = self.thresholds.testing {
            check_percent(&mut violations, "testing.minCoverage", t.min_coverage);
        }
        if let Some(ref t) = self.thresholds.performance {
            check_percent(&mut violations, "performance.minScore", t.min_score);
            if t.max_bundle_size_kb == 0 {
                violations.push("performance.maxBundleSizeKb must be greater than 0".to_string());
            }
        }
        if let Some(ref t) = self.thresholds.accessibility {
            check_percent(&mut violations, "accessibility.minScore", t.min_score);
            if t.min_contrast_ratio < 1.0 {
                violations.push(format!(
                    "accessibility.minContrastRatio must be at least 1.0, got {}",
                    t.min_contrast_ratio
                ));
            }
        }
        if let Some(ref t) = self.thresholds.documentation {
            check_percent(&mut violations, "documentation.minCoverage", t.min_coverage);
        }

        for pattern in self.include_patterns.iter().chain(&self.exclude_patterns) {
            if let Err(e) = glob::Pattern::new(pattern) {
                violations.push(format!("Invalid glob pattern '{}': {}", pattern, e));
            }
        }

        violations
    }
}

fn check_percent(violations: &mut Vec<String>, field: &str, value: f64) {
    if !(0.0..=100.0).contains(&value) {
        violations.push(format!(
            "{} must be between 0 and 100, got {}",
            field, value
        ));
    }
}

// =========================================
// Override layers
// =========================================

/// Field-level overrides for [`CodeQualityThresholds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeQualityOverride {
    pub min_score: Option<f64>,
    pub max_complexity: Option<u32>,
}

/// Field-level overrides for [`SecurityThresholds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityOverride {
    pub max_critical_issues: Option<u32>,
    pub max_high_issues: Option<u32>,
    pub min_score: Option<f64>,
}

/// Field-level overrides for [`TestingThresholds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestingOverride {
    pub min_coverage: Option<f64>,
}

/// Field-level overrides for [`PerformanceThresholds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceOverride {
    pub min_score: Option<f64>,
    pub max_bundle_size_kb: Option<u32>,
}

/// Field-level overrides for [`AccessibilityThresholds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityOverride {
    pub min_score: Option<f64>,
    pub min_contrast_ratio: Option<f64>,
}

/// Field-level overrides for [`DocumentationThresholds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentationOverride {
    pub min_coverage: Option<f64>,
}

/// Override layer for the thresholds section.
///
/// Each present category merges field-by-field into the base; a category
/// override on a base with no entry for that category installs the category
/// defaults first, then applies the fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThresholdOverrides {
    pub code_quality: Option<CodeQualityOverride>,
    pub security: Option<SecurityOverride>,
    pub testing: Option<TestingOverride>,
    pub performance: Option<PerformanceOverride>,
    pub accessibility: Option<AccessibilityOverride>,
    pub documentation: Option<DocumentationOverride>,
}

impl ThresholdOverrides {
    fn merge_into(&self, base: &mut AuditThresholds) {
        if let Some(ref o) = self.code_quality {
            let t = base.code_quality.get_or_insert_with(Default::default);
            if let Some(v) = o.min_score {
                t.min_score = v;
            }
            if let Some(v) = o.max_complexity {
                t.max_complexity = v;
            }
        }
        if let Some(ref o) = self.security {
            let t = base.security.get_or_insert_with(Default::default);
            if let Some(v) = o.max_critical_issues {
                t.max_critical_issues = v;
            }
            if let Some(v) = o.max_high_issues {
                t.max_high_issues = v;
            }
            if let Some(v) = o.min_score {
                t.min_score = v;
            }
        }
        if let Some(ref o) = self.testing {
            let t = base.testing.get_or_insert_with(Default::default);
            if let Some(v) = o.min_coverage {
                t.min_coverage = v;
            }
        }
        if let Some(ref o) = self.performance {
            let t = base.performance.get_or_insert_with(Default::default);
            if let Some(v) = o.min_score {
                t.min_score = v;
            }
            if let Some(v) = o.max_bundle_size_kb {
                t.max_bundle_size_kb = v;
            }
        }
        if let Some(ref o) = self.accessibility {
            let t = base.accessibility.get_or_insert_with(Default::default);
            if let Some(v) = o.min_score {
                t.min_score = v;
            }
            if let Some(v) = o.min_contrast_ratio {
                t.min_contrast_ratio = v;
            }
        }
        if let Some(ref o) = self.documentation {
            let t = base.documentation.get_or_insert_with(Default::default);
            if let Some(v) = o.min_coverage {
                t.min_coverage = v;
            }
        }
    }
}

/// A set of overrides to layer over a base configuration.
///
/// Absent fields leave the base untouched. Array-valued fields replace the
/// base arrays wholesale; there is no element-wise merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOverrides {
    pub phases: Option<BTreeMap<AuditPhase, bool>>,
    pub thresholds: Option<ThresholdOverrides>,
    pub output_format: Option<OutputFormat>,
    pub output_path: Option<PathBuf>,
    pub parallel: Option<bool>,
    pub verbose: Option<bool>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// The stricter bars used for production gating, as a layer over the
    /// canonical defaults.
    pub fn production() -> Self {
        Self {
            thresholds: Some(ThresholdOverrides {
                code_quality: Some(CodeQualityOverride {
                    min_score: Some(80.0),
                    ..Default::default()
                }),
                security: Some(SecurityOverride {
                    max_high_issues: Some(0),
                    min_score: Some(85.0),
                    ..Default::default()
                }),
                testing: Some(TestingOverride {
                    min_coverage: Some(85.0),
                }),
                performance: Some(PerformanceOverride {
                    min_score: Some(75.0),
                    ..Default::default()
                }),
                documentation: Some(DocumentationOverride {
                    min_coverage: Some(75.0),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// The relaxed bars used during development, as a layer over the
    /// canonical defaults.
    pub fn development() -> Self {
        Self {
            verbose: Some(true),
            thresholds: Some(ThresholdOverrides {
                code_quality: Some(CodeQualityOverride {
                    min_score: Some(60.0),
                    max_complexity: Some(15),
                }),
                security: Some(SecurityOverride {
                    max_high_issues: Some(5),
                    min_score: Some(60.0),
                    ..Default::default()
                }),
                testing: Some(TestingOverride {
                    min_coverage: Some(50.0),
                }),
                documentation: Some(DocumentationOverride {
                    min_coverage: Some(40.0),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // =========================================
    // Defaults and persistence
    // =========================================

    #[test]
    fn test_default_enables_all_phases_with_thresholds() {
        let config = AuditConfig::default();
        for phase in AuditPhase::ALL {
            assert!(config.is_enabled(phase), "{} should default on", phase);
            assert!(config.thresholds.has_entry(phase));
        }
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_load_missing_file_writes_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");

        let config = AuditConfig::load(&path).unwrap();
        assert_eq!(config, AuditConfig::default());
        assert!(path.exists());

        // The written template loads back identical
        let reloaded = AuditConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AuditConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, r#"{"parallel": false, "verbose": true}"#).unwrap();

        let config = AuditConfig::load(&path).unwrap();
        assert!(!config.parallel);
        assert!(config.verbose);
        assert_eq!(config.thresholds, AuditThresholds::default());
    }

    #[test]
    fn test_wire_format_uses_camel_case_keys() {
        let json = serde_json::to_string(&AuditConfig::default()).unwrap();
        assert!(json.contains("\"outputFormat\""));
        assert!(json.contains("\"excludePatterns\""));
        assert!(json.contains("\"codeQuality\""));
        assert!(json.contains("\"maxCriticalIssues\""));
    }

    // =========================================
    // Override layering
    // =========================================

    #[test]
    fn test_apply_overrides_does_not_mutate_base() {
        let base = AuditConfig::default();
        let snapshot = base.clone();
        let overrides = ConfigOverrides {
            parallel: Some(false),
            ..Default::default()
        };

        let merged = base.apply_overrides(&overrides);
        assert!(!merged.parallel);
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_apply_overrides_merges_phase_map_per_key() {
        let base = AuditConfig::default();
        let mut phases = BTreeMap::new();
        phases.insert(AuditPhase::Accessibility, false);

        let merged = base.apply_overrides(&ConfigOverrides {
            phases: Some(phases),
            ..Default::default()
        });

        assert!(!merged.is_enabled(AuditPhase::Accessibility));
        // Untouched keys keep their base value
        assert!(merged.is_enabled(AuditPhase::Security));
    }

    #[test]
    fn test_apply_overrides_thresholds_field_by_field() {
        let base = AuditConfig::default();
        let merged = base.apply_overrides(&ConfigOverrides {
            thresholds: Some(ThresholdOverrides {
                security: Some(SecurityOverride {
                    max_high_issues: Some(0),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });

        let security = merged.thresholds.security.unwrap();
        assert_eq!(security.max_high_issues, 0);
        // Sibling fields are preserved from the base
        assert_eq!(security.max_critical_issues, 0);
        assert_eq!(security.min_score, 75.0);
    }

    #[test]
    fn test_apply_overrides_arrays_replace_wholesale() {
        let base = AuditConfig::default();
        let merged = base.apply_overrides(&ConfigOverrides {
            exclude_patterns: Some(vec!["vendor/**".to_string()]),
            ..Default::default()
        });

        assert_eq!(merged.exclude_patterns, vec!["vendor/**".to_string()]);
    }

    #[test]
    fn test_production_preset_tightens_baseline() {
        let base = AuditConfig::default();
        let production = base.apply_overrides(&ConfigOverrides::production());

        let base_testing = base.thresholds.testing.as_ref().unwrap();
        let prod_testing = production.thresholds.testing.as_ref().unwrap();
        assert!(prod_testing.min_coverage > base_testing.min_coverage);
        assert_eq!(
            production.thresholds.security.as_ref().unwrap().max_high_issues,
            0
        );
        assert!(production.validate().is_empty());
    }

    #[test]
    fn test_development_preset_loosens_baseline() {
        let base = AuditConfig::default();
        let dev = base.apply_overrides(&ConfigOverrides::development());

        assert!(
            dev.thresholds.testing.as_ref().unwrap().min_coverage
                < base.thresholds.testing.as_ref().unwrap().min_coverage
        );
        assert!(dev.verbose);
        assert!(dev.validate().is_empty());
    }

    // =========================================
    // Validation
    // =========================================

    #[test]
    fn test_validate_reports_all_violations_not_just_first() {
        let mut config = AuditConfig::default();
        config.thresholds.code_quality.as_mut().unwrap().max_complexity = 0;
        config.thresholds.testing.as_mut().unwrap().min_coverage = 150.0;

        let violations = config.validate();
        assert!(violations.len() >= 2, "got: {:?}", violations);
        assert!(violations.iter().any(|v| v.contains("maxComplexity")));
        assert!(violations.iter().any(|v| v.contains("minCoverage")));
    }

    #[test]
    fn test_validate_rejects_missing_threshold_for_enabled_phase() {
        let mut config = AuditConfig::default();
        config.thresholds.security = None;

        let violations = config.validate();
        assert!(violations.iter().any(|v| v.contains("security")));

        // Disabling the phase clears the violation
        config.phases.insert(AuditPhase::Security, false);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_contrast_ratio_and_bundle_size() {
        let mut config = AuditConfig::default();
        config
            .thresholds
            .accessibility
            .as_mut()
            .unwrap()
            .min_contrast_ratio = 0.5;
        config
            .thresholds
            .performance
            .as_mut()
            .unwrap()
            .max_bundle_size_kb = 0;

        let violations = config.validate();
        assert!(violations.iter().any(|v| v.contains("minContrastRatio")));
        assert!(violations.iter().any(|v| v.contains("maxBundleSizeKb")));
    }

    #[test]
    fn test_validate_rejects_bad_glob_patterns() {
        let mut config = AuditConfig::default();
        config.include_patterns = vec!["src/[".to_string()];

        let violations = config.validate();
        assert!(violations.iter().any(|v| v.contains("glob")));
    }

    #[test]
    fn test_output_format_parsing() {
        let parsed: OutputFormat = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(parsed, OutputFormat::Both);
        assert!(parsed.includes_json());
        assert!(!OutputFormat::Html.includes_json());
        assert!(serde_json::from_str::<OutputFormat>("\"xml\"").is_err());
    }
}
