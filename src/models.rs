//! Core data models for the welfare matcher

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

/// What the user wants from the current turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Match,
    Detail,
    Eligibility,
    Apply,
}

impl Intent {
    /// Follow-up intents survive into the next turn unless reset
    pub fn is_sticky(self) -> bool {
        matches!(self, Intent::Detail | Intent::Eligibility | Intent::Apply)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Match => "match",
            Intent::Detail => "detail",
            Intent::Eligibility => "eligibility",
            Intent::Apply => "apply",
        }
    }
}

/// Period the stated income refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IncomePeriod {
    #[serde(rename = "월")]
    Monthly,
    #[serde(rename = "연")]
    Annual,
}

impl IncomePeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "월" | "월급" | "월소득" => Some(IncomePeriod::Monthly),
            "연" | "연봉" | "연소득" => Some(IncomePeriod::Annual),
            _ => None,
        }
    }
}

//
// ================= Program =================
//

/// One row of the welfare program catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: Option<String>,
    pub program_name: String,
    pub category_primary: Option<String>,
    pub category_secondary: Option<String>,
    pub description: Option<String>,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub income_type: Option<String>,
    /// Loaded and coerced, never consulted by filtering or scoring
    pub income_max: Option<f64>,
    pub residence_required: Option<String>,
    pub employment_status: Option<String>,
    pub special_conditions: Option<String>,
    pub support_type: Option<String>,
    pub support_amount: Option<String>,
    pub support_duration: Option<String>,
    pub how_to_apply: Option<String>,
    pub contact: Option<String>,
    pub difficulty_level: Option<f64>,
    pub source: Option<String>,
}

impl Program {
    /// Primary category used for diversification buckets
    pub fn category_key(&self) -> &str {
        self.category_primary
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("기타")
    }
}

/// Borrow an optional text column as `&str`, empty when absent
pub fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// A candidate program annotated with this turn's priority
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedProgram {
    #[serde(flatten)]
    pub program: Program,
    pub priority: i32,
}

//
// ================= Profile =================
//

/// Structured facts accumulated across one conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub age: Option<u32>,
    /// 만원 units, in the period given by `income_type`
    pub income: Option<f64>,
    pub income_type: Option<IncomePeriod>,
    pub income_scope: Option<String>,
    pub residence: Option<String>,
    pub is_seoul_resident: Option<bool>,
    pub employment_status: Option<String>,
    pub housing_type: Option<String>,
    #[serde(default)]
    pub special_conditions: Vec<String>,
    #[serde(default)]
    pub needs: Vec<String>,
    pub household_size: Option<u32>,
    pub median_percent: Option<i64>,
    pub median_bracket: Option<String>,
}

/// Sparse result of one extraction call
///
/// Only recognized keys survive parsing; unknown scalars are `None`
/// and unknown collections are empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    pub age: Option<u32>,
    pub income: Option<f64>,
    pub income_type: Option<IncomePeriod>,
    pub income_scope: Option<String>,
    pub residence: Option<String>,
    pub is_seoul_resident: Option<bool>,
    pub employment_status: Option<String>,
    pub housing_type: Option<String>,
    #[serde(default)]
    pub special_conditions: Vec<String>,
    #[serde(default)]
    pub needs: Vec<String>,
    pub household_size: Option<u32>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }
}

//
// ================= Turn Result =================
//

/// Everything the surrounding UI needs after one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub intent: Intent,
    pub reply: String,
    pub profile_field_count: usize,
    pub matched_programs: Vec<MatchedProgram>,
    pub show_cards: bool,
    #[serde(default)]
    pub out_of_region: bool,
    #[serde(default)]
    pub catalog_unavailable: bool,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for IncomePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IncomePeriod::Monthly => "월",
            IncomePeriod::Annual => "연",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_stickiness() {
        assert!(!Intent::Match.is_sticky());
        assert!(Intent::Detail.is_sticky());
        assert!(Intent::Eligibility.is_sticky());
        assert!(Intent::Apply.is_sticky());
    }

    #[test]
    fn test_income_period_serde_uses_korean_labels() {
        let json = serde_json::to_string(&IncomePeriod::Annual).unwrap();
        assert_eq!(json, "\"연\"");
        assert_eq!(IncomePeriod::parse(" 월 "), Some(IncomePeriod::Monthly));
        assert_eq!(IncomePeriod::parse("주"), None);
    }

    #[test]
    fn test_category_key_defaults() {
        let mut program = Program::default();
        assert_eq!(program.category_key(), "기타");

        program.category_primary = Some("주거".to_string());
        assert_eq!(program.category_key(), "주거");
    }

    #[test]
    fn test_matched_program_flattens_record() {
        let matched = MatchedProgram {
            program: Program {
                program_name: "청년 월세 지원".to_string(),
                ..Default::default()
            },
            priority: 42,
        };

        let value = serde_json::to_value(&matched).unwrap();
        assert_eq!(value["program_name"], "청년 월세 지원");
        assert_eq!(value["priority"], 42);
    }
}
