use std::fmt;

use serde::{Deserialize, Serialize};

use super::Scope;

/// How much a detection result can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Where a detection result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    /// The host's state snapshot
    Primary,
    /// The last explicitly selected scope
    Secondary,
    /// Hardcoded default
    Fallback,
}

/// Outcome of one scope detection pass. Computed fresh each time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub scope: Scope,
    pub confidence: Confidence,
    pub source: DetectionSource,
}

impl DetectionResult {
    pub fn primary(scope: Scope) -> Self {
        Self {
            scope,
            confidence: Confidence::High,
            source: DetectionSource::Primary,
        }
    }

    pub fn secondary(scope: Scope) -> Self {
        Self {
            scope,
            confidence: Confidence::Medium,
            source: DetectionSource::Secondary,
        }
    }

    pub fn fallback() -> Self {
        Self {
            scope: Scope::DEFAULT,
            confidence: Confidence::Low,
            source: DetectionSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DetectionSource::Fallback
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionSource::Primary => write!(f, "primary"),
            DetectionSource::Secondary => write!(f, "secondary"),
            DetectionSource::Fallback => write!(f, "fallback"),
        }
    }
}
