//! Provenance primitives: data points, evidence classes, jurisdictions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a value was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceClassification {
    /// Confirmed against an authoritative published source.
    Verified,
    /// Supplied by a vendor or partner, not independently checked.
    SourceProvided,
    /// Entered by the caller for their own fleet.
    UserProvided,
    /// Engineering assumption or industry rule of thumb.
    Assumed,
    /// Depends on a program award, eligibility, or enrollment.
    Contingent,
    /// Does not apply to this fleet or jurisdiction.
    NotApplicable,
    /// Unknown provenance.
    Unverified,
}

impl EvidenceClassification {
    /// Strength implied by this classification alone.
    pub fn strength(self) -> EvidenceStrength {
        match self {
            Self::Verified | Self::NotApplicable => EvidenceStrength::High,
            Self::SourceProvided | Self::UserProvided | Self::Assumed => EvidenceStrength::Medium,
            Self::Contingent => EvidenceStrength::Low,
            Self::Unverified => EvidenceStrength::Uncertain,
        }
    }
}

impl fmt::Display for EvidenceClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Verified => "VERIFIED",
            Self::SourceProvided => "SOURCE_PROVIDED",
            Self::UserProvided => "USER_PROVIDED",
            Self::Assumed => "ASSUMED",
            Self::Contingent => "CONTINGENT",
            Self::NotApplicable => "NOT_APPLICABLE",
            Self::Unverified => "UNVERIFIED",
        };
        f.write_str(s)
    }
}

/// Overall confidence tier. Deliberately coarse: there is no numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStrength {
    High,
    Medium,
    Low,
    Uncertain,
}

impl fmt::Display for EvidenceStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Uncertain => "UNCERTAIN",
        };
        f.write_str(s)
    }
}

/// How much a factor moves the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

/// A value together with where it came from.
///
/// Deserializes from either a bare value (`0.15`), which is treated as a
/// caller override, or a full table with classification and source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "DataPointRepr<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct DataPoint<T = f64> {
    pub value: T,
    pub classification: EvidenceClassification,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
}

impl<T> DataPoint<T> {
    pub fn new(value: T, classification: EvidenceClassification, source: impl Into<String>) -> Self {
        Self {
            value,
            classification,
            source: source.into(),
            source_url: None,
            as_of: None,
        }
    }

    pub fn verified(value: T, source: impl Into<String>) -> Self {
        Self::new(value, EvidenceClassification::Verified, source)
    }

    pub fn assumed(value: T, source: impl Into<String>) -> Self {
        Self::new(value, EvidenceClassification::Assumed, source)
    }

    pub fn contingent(value: T, source: impl Into<String>) -> Self {
        Self::new(value, EvidenceClassification::Contingent, source)
    }

    pub fn source_provided(value: T, source: impl Into<String>) -> Self {
        Self::new(value, EvidenceClassification::SourceProvided, source)
    }

    pub fn user(value: T, source: impl Into<String>) -> Self {
        Self::new(value, EvidenceClassification::UserProvided, source)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn as_of(mut self, date: impl Into<String>) -> Self {
        self.as_of = Some(date.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DataPointRepr<T> {
    Bare(T),
    Full {
        value: T,
        classification: EvidenceClassification,
        source: String,
        #[serde(default)]
        source_url: Option<String>,
        #[serde(default)]
        as_of: Option<String>,
    },
}

impl<T> From<DataPointRepr<T>> for DataPoint<T> {
    fn from(repr: DataPointRepr<T>) -> Self {
        match repr {
            DataPointRepr::Bare(value) => DataPoint::user(value, "Caller override"),
            DataPointRepr::Full {
                value,
                classification,
                source,
                source_url,
                as_of,
            } => DataPoint {
                value,
                classification,
                source,
                source_url,
                as_of,
            },
        }
    }
}

/// Geographic or programmatic reach of a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "states", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JurisdictionScope {
    UsAll,
    /// Only the listed state programs (e.g. a low-carbon fuel standard).
    StateSpecific(Vec<String>),
    /// Only utility or ISO territories covering the listed states.
    UtilitySpecific(Vec<String>),
    Federal,
    Global,
}

/// Outcome of gating a value against a fleet's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applicability {
    pub applicable: bool,
    pub reason: String,
}

impl JurisdictionScope {
    pub fn state_specific(states: &[&str]) -> Self {
        Self::StateSpecific(states.iter().map(|s| (*s).to_string()).collect())
    }

    pub fn utility_specific(states: &[&str]) -> Self {
        Self::UtilitySpecific(states.iter().map(|s| (*s).to_string()).collect())
    }

    /// Decides whether a value with this scope applies in `state`.
    ///
    /// State codes compare case-insensitively and ignore surrounding
    /// whitespace. A utility-specific scope with
    /// no listed territory can never be confirmed and is treated as
    /// inapplicable.
    pub fn applies_to(&self, state: &str) -> Applicability {
        let state = state.trim().to_ascii_uppercase();
        match self {
            Self::UsAll | Self::Global => Applicability {
                applicable: true,
                reason: "Available nationwide".into(),
            },
            Self::Federal => Applicability {
                applicable: true,
                reason: "Federal program, subject to award and eligibility".into(),
            },
            Self::StateSpecific(states) => {
                if states.iter().any(|s| s.eq_ignore_ascii_case(&state)) {
                    Applicability {
                        applicable: true,
                        reason: format!("{state} participates in this state program"),
                    }
                } else {
                    Applicability {
                        applicable: false,
                        reason: format!("Only available in: {}", states.join(", ")),
                    }
                }
            }
            Self::UtilitySpecific(states) => {
                if states.is_empty() {
                    Applicability {
                        applicable: false,
                        reason: "Requires verification of a local utility program".into(),
                    }
                } else if states.iter().any(|s| s.eq_ignore_ascii_case(&state)) {
                    Applicability {
                        applicable: true,
                        reason: format!("{state} is served by a participating utility territory"),
                    }
                } else {
                    Applicability {
                        applicable: false,
                        reason: format!(
                            "Only available in utility territories covering: {}",
                            states.join(", ")
                        ),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_maps_to_strength() {
        use EvidenceClassification::*;
        assert_eq!(Verified.strength(), EvidenceStrength::High);
        assert_eq!(NotApplicable.strength(), EvidenceStrength::High);
        assert_eq!(Assumed.strength(), EvidenceStrength::Medium);
        assert_eq!(UserProvided.strength(), EvidenceStrength::Medium);
        assert_eq!(Contingent.strength(), EvidenceStrength::Low);
        assert_eq!(Unverified.strength(), EvidenceStrength::Uncertain);
    }

    #[test]
    fn bare_number_deserializes_as_user_override() {
        let dp: DataPoint = serde_json::from_str("0.15").expect("bare value");
        assert_eq!(dp.value, 0.15);
        assert_eq!(dp.classification, EvidenceClassification::UserProvided);
    }

    #[test]
    fn full_table_keeps_classification() {
        let dp: DataPoint = serde_json::from_str(
            r#"{"value": 3.9, "classification": "VERIFIED", "source": "EIA"}"#,
        )
        .expect("full data point");
        assert_eq!(dp.classification, EvidenceClassification::Verified);
        assert_eq!(dp.source, "EIA");
        assert!(dp.source_url.is_none());
    }

    #[test]
    fn state_scope_gates_by_code() {
        let lcfs = JurisdictionScope::state_specific(&["CA", "OR", "WA"]);
        assert!(lcfs.applies_to("ca").applicable);
        assert!(lcfs.applies_to(" Ca ").applicable);
        let tx = lcfs.applies_to("TX");
        assert!(!tx.applicable);
        assert_eq!(tx.reason, "Only available in: CA, OR, WA");
    }

    #[test]
    fn empty_utility_scope_is_never_applicable() {
        let scope = JurisdictionScope::UtilitySpecific(Vec::new());
        assert!(!scope.applies_to("VA").applicable);
        assert!(JurisdictionScope::Federal.applies_to("TX").applicable);
    }
}
