//! Profile extraction collaborators
//!
//! An extractor turns the latest user message (with recent history as
//! context) into a sparse `ProfileUpdate`. Failures are returned as errors;
//! the conversation controller decides how to degrade.

use crate::classifier::CATEGORY_VOCABULARY;
use crate::memory::ConversationMessage;
use crate::models::{IncomePeriod, ProfileUpdate};
use crate::region;
use crate::Result;
use async_trait::async_trait;
use regex::Regex;

pub mod gemini;
pub use gemini::GeminiExtractor;

/// Prior messages handed to the extractor as context
pub const EXTRACTION_HISTORY_TURNS: usize = 6;

/// Trait for structured profile extraction (LLM controlled)
#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract(
        &self,
        message: &str,
        history: &[&ConversationMessage],
    ) -> Result<ProfileUpdate>;
}

/// Employment label → phrases that imply it, first hit wins
const EMPLOYMENT_PHRASES: &[(&str, &[&str])] = &[
    ("구직중", &["취준", "취업준비", "취업 준비", "구직", "일자리 찾"]),
    ("무직", &["백수", "무직", "일 안 함", "일 안해"]),
    ("재직", &["회사 다", "직장인", "재직"]),
    ("학생", &["대학생", "학교 다", "학생"]),
    ("프리랜서", &["프리랜서", "알바"]),
];

const HOUSING_TYPES: &[&str] = &["월세", "전세", "자가", "고시원"];

/// Special-condition tag → phrases that imply it
const CONDITION_PHRASES: &[(&str, &[&str])] = &[
    ("청년", &["청년"]),
    ("한부모", &["한부모"]),
    ("장애인", &["장애"]),
    ("신혼부부", &["신혼"]),
    ("다자녀", &["다자녀"]),
    ("다문화", &["다문화"]),
];

const SINGLE_HOUSEHOLD_PHRASES: &[&str] = &["혼자 살", "혼자 사", "1인 가구", "자취"];

lazy_static::lazy_static! {
    static ref AGE_RE: Regex = Regex::new(r"(\d{1,3})\s*(?:살|세)").unwrap();
    static ref INCOME_RE: Regex =
        Regex::new(r"(월|연)\s*(?:소득|수입|급여|봉)?\s*(?:은|이|는)?\s*(\d[\d,]*)\s*만\s*원").unwrap();
    static ref HOUSEHOLD_RE: Regex = Regex::new(r"(\d{1,2})\s*(?:인\s*가구|명이서|식구)").unwrap();
}

/// Rule-based extractor for development & testing
/// Keeps the conversation functional without an LLM dependency
pub struct MockExtractor;

#[async_trait]
impl ProfileExtractor for MockExtractor {
    async fn extract(
        &self,
        message: &str,
        _history: &[&ConversationMessage],
    ) -> Result<ProfileUpdate> {
        Ok(extract_by_keywords(message))
    }
}

/// Keyword and pattern extraction over a single message
pub fn extract_by_keywords(message: &str) -> ProfileUpdate {
    let mut update = ProfileUpdate {
        age: AGE_RE
            .captures(message)
            .and_then(|cap| cap[1].parse::<u32>().ok())
            .filter(|age| *age > 0),
        residence: region::find_region_mention(message).map(str::to_string),
        employment_status: first_label(message, EMPLOYMENT_PHRASES),
        housing_type: HOUSING_TYPES
            .iter()
            .find(|housing| message.contains(*housing))
            .map(|housing| housing.to_string()),
        special_conditions: CONDITION_PHRASES
            .iter()
            .filter(|(_, phrases)| phrases.iter().any(|p| message.contains(p)))
            .map(|(tag, _)| tag.to_string())
            .collect(),
        needs: CATEGORY_VOCABULARY
            .iter()
            .filter(|category| message.contains(*category))
            .map(|category| category.to_string())
            .collect(),
        ..Default::default()
    };

    if let Some(cap) = INCOME_RE.captures(message) {
        update.income = cap[2].replace(',', "").parse::<f64>().ok();
        update.income_type = IncomePeriod::parse(&cap[1]);
    } else if update.employment_status.as_deref() == Some("무직") {
        update.income = Some(0.0);
    }

    update.household_size = HOUSEHOLD_RE
        .captures(message)
        .and_then(|cap| cap[1].parse::<u32>().ok())
        .filter(|size| *size > 0)
        .or_else(|| {
            SINGLE_HOUSEHOLD_PHRASES
                .iter()
                .any(|p| message.contains(p))
                .then_some(1)
        });

    update
}

fn first_label(message: &str, table: &[(&str, &[&str])]) -> Option<String> {
    table
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| message.contains(p)))
        .map(|(label, _)| label.to_string())
}
