//! Matching engine
//!
//! PROFILE + CATALOG → FILTER → PRE-FILTER → SCORE → SELECT
//!
//! Everything here is pure over its inputs. The catalog is never mutated;
//! selected rows are cloned into `MatchedProgram`s.

pub mod filter;
pub mod scoring;
pub mod selector;

pub use filter::filter_candidates;
pub use scoring::{infer_categories, score_program};
pub use selector::{select_diversified, MAX_PER_CATEGORY, MAX_RESULTS};

use crate::models::{text, MatchedProgram, Program, UserProfile};
use std::collections::HashSet;
use tracing::debug;

/// Pre-filters applied after eligibility and before scoring
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// Program names already recommended in this conversation
    pub exclude_names: HashSet<String>,
    /// Single category the user explicitly asked for
    pub requested_category: Option<String>,
}

/// Rank the catalog for a profile
pub fn match_programs(
    profile: &UserProfile,
    catalog: &[Program],
    options: &MatchOptions,
) -> Vec<MatchedProgram> {
    if catalog.is_empty() {
        return Vec::new();
    }

    let mut candidates = filter_candidates(profile, catalog);

    if !options.exclude_names.is_empty() {
        candidates.retain(|p| !options.exclude_names.contains(&p.program_name));
        debug!(remaining = candidates.len(), "Already recommended programs excluded");
    }

    if let Some(requested) = options.requested_category.as_deref() {
        candidates.retain(|p| text(&p.category_primary).contains(requested));
        debug!(requested, remaining = candidates.len(), "Restricted to requested category");
    }

    let categories = infer_categories(profile);
    debug!(?categories, candidates = candidates.len(), "Scoring candidates");

    let scored: Vec<MatchedProgram> = candidates
        .into_iter()
        .map(|program| MatchedProgram {
            priority: score_program(program, profile, &categories),
            program: program.clone(),
        })
        .collect();

    let selected = select_diversified(scored);
    debug!(selected = selected.len(), "Diversified selection complete");

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, category: &str) -> Program {
        Program {
            program_name: name.to_string(),
            category_primary: Some(category.to_string()),
            ..Default::default()
        }
    }

    fn catalog() -> Vec<Program> {
        let mut rent = program("청년 월세 지원", "주거");
        rent.category_secondary = Some("월세".to_string());
        rent.support_amount = Some("월 20만원".to_string());
        rent.age_min = Some(19.0);
        rent.age_max = Some(39.0);

        let mut deposit = program("청년 전세 보증금 지원", "주거");
        deposit.category_secondary = Some("전세".to_string());

        let mut single_parent = program("한부모 아동양육비", "생활");
        single_parent.special_conditions = Some("한부모".to_string());

        let mut jobs = program("청년 일자리 도약", "일자리");
        jobs.support_amount = Some("최대 300만원".to_string());

        vec![rent, deposit, single_parent, jobs, program("문화누리카드", "문화")]
    }

    fn renter() -> UserProfile {
        UserProfile {
            age: Some(27),
            housing_type: Some("월세".to_string()),
            employment_status: Some("구직중".to_string()),
            residence: Some("서울 강남구".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_rent_program_ranks_first() {
        let matched = match_programs(&renter(), &catalog(), &MatchOptions::default());

        assert_eq!(matched[0].program.program_name, "청년 월세 지원");
        assert!(matched.iter().all(|m| m.program.program_name != "한부모 아동양육비"));
        assert!(matched.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_exclusion_of_already_recommended() {
        let options = MatchOptions {
            exclude_names: HashSet::from(["청년 월세 지원".to_string()]),
            ..Default::default()
        };

        let matched = match_programs(&renter(), &catalog(), &options);
        assert!(matched.iter().all(|m| m.program.program_name != "청년 월세 지원"));
        assert!(!matched.is_empty());
    }

    #[test]
    fn test_requested_category_restricts() {
        let options = MatchOptions {
            requested_category: Some("일자리".to_string()),
            ..Default::default()
        };

        let matched = match_programs(&renter(), &catalog(), &options);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].program.program_name, "청년 일자리 도약");
    }

    #[test]
    fn test_requested_category_without_programs_is_empty() {
        let options = MatchOptions {
            requested_category: Some("돌봄".to_string()),
            ..Default::default()
        };

        assert!(match_programs(&renter(), &catalog(), &options).is_empty());

        let housing_only = vec![program("청년 월세 지원", "주거")];
        assert!(match_programs(&renter(), &housing_only, &options).is_empty());
    }

    #[test]
    fn test_single_category_catalog_is_capped() {
        let catalog: Vec<Program> = (0..5)
            .map(|i| {
                let mut p = program(&format!("청년 주거 {}", i), "주거");
                p.support_amount = Some(format!("{}만원", 100 + i));
                p
            })
            .collect();

        let matched = match_programs(&renter(), &catalog, &MatchOptions::default());
        assert_eq!(matched.len(), MAX_PER_CATEGORY);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(match_programs(&renter(), &[], &MatchOptions::default()).is_empty());
    }
}
