//! Priority scoring
//!
//! A hand-tuned additive point system. Higher is better and scores may go
//! negative. Every rule reads only the program row, the profile and the
//! categories inferred once per turn.

use crate::models::{text, Program, UserProfile};
use regex::Regex;

pub const CATEGORY_PRIMARY_HIT: i32 = 20;
pub const CATEGORY_TEXT_HIT: i32 = 10;

pub const YOUTH_BONUS: i32 = 30;
pub const YOUTH_BONUS_NEWLYWED: i32 = 10;
pub const NEWLYWED_BONUS: i32 = 60;
pub const NEWLYWED_YOUTH_ONLY_PENALTY: i32 = -10;

pub const TENURE_EXACT: i32 = 40;
pub const TENURE_MIXED: i32 = 25;
pub const TENURE_OPPOSITE: i32 = -50;
pub const TENURE_RENTAL: i32 = 10;

pub const EMPLOYMENT_KEYWORD_BONUS: i32 = 20;
pub const CORE_KEYWORD_BONUS: i32 = 10;

/// Support amount tiers in 만원, highest first
const AMOUNT_TIERS: &[(u64, i32)] = &[(100, 25), (50, 15), (10, 5)];

const EMPLOYMENT_NAME_KEYWORDS: &[&str] = &["취업", "일자리", "자립"];
const SAVINGS_NAME_KEYWORDS: &[&str] = &["청년통장", "저축"];
const CORE_NAME_KEYWORDS: &[&str] = &["자립", "통장", "지원금", "수당", "월세"];

/// Profile statuses that trigger the employment keyword rule
const JOBLESS_STATUSES: &[&str] = &["구직", "무직"];

/// Statuses that make jobs relevant during category inference
const JOB_SEEKING_STATUSES: &[&str] = &["구직중", "무직"];

/// Housing types with a dedicated category tag
const HOUSING_TAGS: &[&str] = &["전세", "월세", "고시원"];

/// Monthly income (만원) under which living and finance support matter
const LOW_INCOME_THRESHOLD: f64 = 300.0;

const YOUTH_AGE_RANGE: std::ops::RangeInclusive<u32> = 19..=39;
const YOUTH_DEFAULT_CATEGORIES: &[&str] = &["주거", "일자리", "생활"];

lazy_static::lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"(\d+)만원").unwrap();
}

/// Category tags relevant to this profile, computed once per turn
///
/// Order follows the rules below; a tag may appear twice and then counts
/// twice during scoring.
pub fn infer_categories(profile: &UserProfile) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();

    let housing = text(&profile.housing_type).trim();
    if !housing.is_empty() {
        categories.push("주거".to_string());
        if HOUSING_TAGS.contains(&housing) {
            categories.push(housing.to_string());
        }
    }

    let employment = text(&profile.employment_status);
    if JOB_SEEKING_STATUSES.contains(&employment) {
        categories.push("일자리".to_string());
    }

    if profile.income.is_some_and(|income| income < LOW_INCOME_THRESHOLD) {
        categories.push("생활".to_string());
        categories.push("금융".to_string());
    }

    if profile
        .special_conditions
        .iter()
        .any(|s| s == "한부모" || s == "장애인")
    {
        categories.push("생활".to_string());
    }

    for need in &profile.needs {
        if !categories.contains(need) {
            categories.push(need.clone());
        }
    }

    if categories.is_empty() {
        if let Some(age) = profile.age {
            if YOUTH_AGE_RANGE.contains(&age) {
                categories = YOUTH_DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
            }
        }
    }

    categories
}

/// Largest "<n>만원" amount mentioned in the text
pub fn max_amount(support_amount: &str) -> Option<u64> {
    AMOUNT_RE
        .captures_iter(support_amount)
        .filter_map(|cap| cap[1].parse::<u64>().ok())
        .max()
}

/// Heuristic relevance of one program for this profile
pub fn score_program(program: &Program, profile: &UserProfile, categories: &[String]) -> i32 {
    let category = text(&program.category_primary).to_lowercase();
    let description = text(&program.description).to_lowercase();
    let name = program.program_name.to_lowercase();
    let row_special = text(&program.special_conditions).to_lowercase();

    let is_newlywed = profile.is_newlywed();
    let mut score = 0;

    for cat in categories {
        if category.contains(cat.as_str()) {
            score += CATEGORY_PRIMARY_HIT;
        }
        if description.contains(cat.as_str()) || name.contains(cat.as_str()) {
            score += CATEGORY_TEXT_HIT;
        }
    }

    if name.contains("청년") {
        score += if is_newlywed { YOUTH_BONUS_NEWLYWED } else { YOUTH_BONUS };
    }

    if is_newlywed {
        if name.contains("신혼") || description.contains("신혼") || row_special.contains("신혼") {
            score += NEWLYWED_BONUS;
        }
        if name.contains("청년") && !name.contains("신혼") && !description.contains("신혼") {
            score += NEWLYWED_YOUTH_ONLY_PENALTY;
        }
    }

    if let Some(amount) = max_amount(&text(&program.support_amount).to_lowercase()) {
        if let Some((_, bonus)) = AMOUNT_TIERS.iter().find(|(floor, _)| amount >= *floor) {
            score += bonus;
        }
    }

    score += tenure_adjustment(
        text(&profile.housing_type).trim(),
        text(&program.category_secondary).trim(),
    );

    let employment = text(&profile.employment_status);
    if JOBLESS_STATUSES.contains(&employment) {
        if EMPLOYMENT_NAME_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            score += EMPLOYMENT_KEYWORD_BONUS;
        }
        if SAVINGS_NAME_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            score += EMPLOYMENT_KEYWORD_BONUS;
        }
    }

    score += CORE_NAME_KEYWORDS
        .iter()
        .filter(|kw| name.contains(*kw))
        .count() as i32
        * CORE_KEYWORD_BONUS;

    score
}

/// Fit between the user's rental tenure and the program subtype
fn tenure_adjustment(housing: &str, subtype: &str) -> i32 {
    let opposite = match housing {
        "월세" => "전세",
        "전세" => "월세",
        _ => return 0,
    };

    if subtype == housing {
        TENURE_EXACT
    } else if subtype == "전월세" {
        TENURE_MIXED
    } else if subtype == opposite {
        TENURE_OPPOSITE
    } else if subtype == "임대" {
        TENURE_RENTAL
    } else {
        0
    }
}
