//! Scope domain - the closed set of execution scopes and detection results

mod detection;

pub use detection::{Confidence, DetectionResult, DetectionSource};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Execution scope a generation request is routed under.
///
/// Each scope may carry its own backend configuration. The set is closed:
/// external input is parsed into one of these variants or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    #[default]
    RealWorld,
    InnerWorld,
    Sanctuary,
}

impl Scope {
    /// Every known scope, in preload order
    pub const ALL: [Scope; 3] = [Scope::RealWorld, Scope::InnerWorld, Scope::Sanctuary];

    /// Scope used when nothing better is known
    pub const DEFAULT: Scope = Scope::RealWorld;

    /// Wire name used in stored documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::RealWorld => "realWorld",
            Scope::InnerWorld => "innerWorld",
            Scope::Sanctuary => "sanctuary",
        }
    }

    /// Human-readable name for operator notifications
    pub fn display_name(&self) -> &'static str {
        match self {
            Scope::RealWorld => "Real World",
            Scope::InnerWorld => "Inner World Instance",
            Scope::Sanctuary => "Sanctuary",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "realWorld" | "real_world" | "real-world" | "real" => Ok(Scope::RealWorld),
            "innerWorld" | "inner_world" | "inner-world" | "inner" => Ok(Scope::InnerWorld),
            "sanctuary" => Ok(Scope::Sanctuary),
            other => Err(DomainError::validation(format!("Unknown scope '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_wire_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Scope::InnerWorld).unwrap();
        assert_eq!(json, "\"innerWorld\"");

        let parsed: Scope = serde_json::from_str("\"sanctuary\"").unwrap();
        assert_eq!(parsed, Scope::Sanctuary);
    }

    #[test]
    fn test_scope_from_str_accepts_aliases() {
        assert_eq!("realWorld".parse::<Scope>().unwrap(), Scope::RealWorld);
        assert_eq!("inner_world".parse::<Scope>().unwrap(), Scope::InnerWorld);
        assert_eq!(" sanctuary ".parse::<Scope>().unwrap(), Scope::Sanctuary);
    }

    #[test]
    fn test_scope_from_str_rejects_unknown() {
        let result = "dungeon".parse::<Scope>();
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_default_scope() {
        assert_eq!(Scope::default(), Scope::DEFAULT);
        assert_eq!(Scope::DEFAULT, Scope::RealWorld);
    }
}
