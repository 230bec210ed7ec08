//! Typed error taxonomy for the audit pipeline.
//!
//! Three top-level types cover the three failure domains:
//! - `AuditError` - phase and orchestration failures, tagged with category
//!   and severity
//! - `ConfigError` - configuration loading and validation failures, always
//!   fatal to a run
//! - `ScoringError` - scoring engine construction failures

use crate::phase::AuditPhase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where an error originated: one of the six phase categories, the
/// orchestrator itself, or configuration handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    CodeQuality,
    Security,
    Testing,
    Performance,
    Accessibility,
    Documentation,
    Orchestrator,
    Config,
}

impl From<AuditPhase> for ErrorCategory {
    fn from(phase: AuditPhase) -> Self {
        match phase {
            AuditPhase::CodeQuality => Self::CodeQuality,
            AuditPhase::Security => Self::Security,
            AuditPhase::Testing => Self::Testing,
            AuditPhase::Performance => Self::Performance,
            AuditPhase::Accessibility => Self::Accessibility,
            AuditPhase::Documentation => Self::Documentation,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CodeQuality => "codeQuality",
            Self::Security => "security",
            Self::Testing => "testing",
            Self::Performance => "performance",
            Self::Accessibility => "accessibility",
            Self::Documentation => "documentation",
            Self::Orchestrator => "orchestrator",
            Self::Config => "config",
        };
        write!(f, "{}", s)
    }
}

/// Severity of an error, ordered least to most severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// An error raised during phase execution or orchestration.
///
/// Carries enough context for the report to attribute the failure and for a
/// consumer to act on it without parsing the message.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[error("[{category}/{severity}] {message}")]
pub struct AuditError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
    /// Optional hint on how to remediate the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl AuditError {
    /// An error local to one phase's execution.
    pub fn phase(phase: AuditPhase, message: impl Into<String>) -> Self {
        Self {
            category: phase.into(),
            severity: ErrorSeverity::High,
            message: message.into(),
            remediation: None,
        }
    }

    /// An error in the orchestrator itself. These indicate pipeline bugs or
    /// misconfiguration rather than analyzer failures.
    pub fn orchestrator(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Orchestrator,
            severity: ErrorSeverity::Critical,
            message: message.into(),
            remediation: None,
        }
    }

    /// The marker raised when a phase was cancelled while its analyzer was
    /// in flight. Cancellation is a terminal progress state, not a recorded
    /// run error; callers filter on [`Self::is_cancellation`].
    pub fn cancelled(phase: AuditPhase) -> Self {
        Self {
            category: phase.into(),
            severity: ErrorSeverity::Low,
            message: "cancelled".to_string(),
            remediation: None,
        }
    }

    /// Override the default severity.
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach a remediation hint.
    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation = Some(hint.into());
        self
    }

    pub fn is_cancellation(&self) -> bool {
        self.message == "cancelled"
    }
}

/// Errors from configuration loading and validation.
///
/// Every variant is fatal to a run: there is no partial-configuration mode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {}", violations.join("; "))]
    Invalid { violations: Vec<String> },
}

/// Errors from scoring engine construction.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Phase weights sum to {sum:.3}, expected 1.0 within a 0.01 tolerance")]
    InvalidWeightSum { sum: f64 },

    #[error("Missing weight for phase {0}")]
    MissingWeight(AuditPhase),
}
