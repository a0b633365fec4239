//! Eligibility filter
//!
//! Hard constraints applied to the whole catalog. Each stage runs only when
//! the profile carries the field it needs, so a sparse profile narrows less.

use crate::models::{text, Program, UserProfile};
use crate::region::{RegionGate, REGION_NAME};
use tracing::{debug, trace};

/// Special conditions that restrict a program to people who have them
pub const RESTRICTED_CONDITIONS: &[&str] = &["신혼", "한부모", "장애", "다자녀", "다문화"];

/// Requirement texts meaning "open to everyone"
const NO_CONDITION: &[&str] = &["", "없음"];
const NO_EMPLOYMENT_RESTRICTION: &[&str] = &["", "제한없음"];

/// Employment status → requirement keywords that positively match it
const EMPLOYMENT_COMPATIBILITY: &[(&str, &[&str])] = &[
    ("구직중", &["구직중"]),
    ("재직", &["재직", "근로"]),
    ("학생", &["학생"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmploymentFit {
    Unrestricted,
    Compatible,
    Unmatched,
}

/// Run every applicable stage over the catalog
pub fn filter_candidates<'a>(profile: &UserProfile, catalog: &'a [Program]) -> Vec<&'a Program> {
    let mut candidates: Vec<&Program> = catalog.iter().collect();

    if let Some(age) = profile.age {
        candidates.retain(|p| passes_age(p, age));
        debug!(age, remaining = candidates.len(), "Age filter applied");
    }

    candidates.retain(|p| passes_special_conditions(p, profile));
    debug!(remaining = candidates.len(), "Special-condition filter applied");

    if RegionGate::is_out_of_area(profile) {
        candidates.retain(|p| !requires_region(p));
        debug!(remaining = candidates.len(), "Region filter applied");
    }

    if let Some(status) = profile.employment_status.as_deref() {
        candidates.retain(|p| passes_employment(p, status));
    }

    candidates
}

pub fn passes_age(program: &Program, age: u32) -> bool {
    let age = f64::from(age);
    program.age_min.map_or(true, |min| min <= age) && program.age_max.map_or(true, |max| max >= age)
}

/// Every restricted tag in the requirement must be held by the user
pub fn passes_special_conditions(program: &Program, profile: &UserProfile) -> bool {
    let requirement = text(&program.special_conditions).trim();
    if NO_CONDITION.contains(&requirement) {
        return true;
    }

    let requirement = requirement.to_lowercase();
    RESTRICTED_CONDITIONS
        .iter()
        .filter(|tag| requirement.contains(*tag))
        .all(|tag| profile.has_special_condition(tag))
}

/// Program is limited to residents of the service region
pub fn requires_region(program: &Program) -> bool {
    text(&program.residence_required).contains(REGION_NAME)
}

pub fn employment_fit(program: &Program, status: &str) -> EmploymentFit {
    let requirement = text(&program.employment_status).trim();
    if NO_EMPLOYMENT_RESTRICTION.contains(&requirement) {
        return EmploymentFit::Unrestricted;
    }

    let compatible = EMPLOYMENT_COMPATIBILITY
        .iter()
        .filter(|(profile_status, _)| *profile_status == status)
        .any(|(_, keywords)| keywords.iter().any(|kw| requirement.contains(kw)));

    if compatible {
        EmploymentFit::Compatible
    } else {
        EmploymentFit::Unmatched
    }
}

/// Employment never excludes a program, unmatched requirements included
pub fn passes_employment(program: &Program, status: &str) -> bool {
    if employment_fit(program, status) == EmploymentFit::Unmatched {
        trace!(
            program = %program.program_name,
            status,
            "Employment requirement unmatched, program kept"
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str) -> Program {
        Program {
            program_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_age_bounds() {
        let mut p = program("청년수당");
        p.age_min = Some(19.0);
        p.age_max = Some(34.0);

        assert!(passes_age(&p, 19));
        assert!(passes_age(&p, 34));
        assert!(!passes_age(&p, 18));
        assert!(!passes_age(&p, 35));
    }

    #[test]
    fn test_unbounded_age_always_passes() {
        let p = program("긴급복지");
        for age in [1, 27, 64, 99] {
            assert!(passes_age(&p, age));
        }
    }

    #[test]
    fn test_special_condition_requires_matching_tag() {
        let mut p = program("한부모가족 아동양육비");
        p.special_conditions = Some("한부모가족".to_string());

        let profile = UserProfile {
            special_conditions: vec!["청년".to_string()],
            ..Default::default()
        };
        assert!(!passes_special_conditions(&p, &profile));

        let profile = UserProfile {
            special_conditions: vec!["한부모".to_string()],
            ..Default::default()
        };
        assert!(passes_special_conditions(&p, &profile));
    }

    #[test]
    fn test_multiple_tags_are_anded() {
        let mut p = program("다자녀 신혼부부 주택");
        p.special_conditions = Some("신혼부부, 다자녀".to_string());

        let only_newlywed = UserProfile {
            special_conditions: vec!["신혼부부".to_string()],
            ..Default::default()
        };
        assert!(!passes_special_conditions(&p, &only_newlywed));

        let both = UserProfile {
            special_conditions: vec!["신혼부부".to_string(), "다자녀".to_string()],
            ..Default::default()
        };
        assert!(passes_special_conditions(&p, &both));
    }

    #[test]
    fn test_multicultural_tag() {
        let mut family = program("다문화가족 방문교육");
        family.special_conditions = Some("다문화".to_string());
        let catalog = vec![family, program("청년수당")];

        let without = UserProfile {
            special_conditions: vec!["청년".to_string()],
            ..Default::default()
        };
        assert!(!passes_special_conditions(&catalog[0], &without));
        let names: Vec<&str> = filter_candidates(&without, &catalog)
            .iter()
            .map(|p| p.program_name.as_str())
            .collect();
        assert_eq!(names, vec!["청년수당"]);

        let with = UserProfile {
            special_conditions: vec!["다문화가정".to_string()],
            ..Default::default()
        };
        assert!(passes_special_conditions(&catalog[0], &with));
        assert_eq!(filter_candidates(&with, &catalog).len(), 2);
    }

    #[test]
    fn test_open_conditions_pass() {
        let profile = UserProfile::default();
        let mut p = program("청년수당");
        assert!(passes_special_conditions(&p, &profile));

        p.special_conditions = Some("없음".to_string());
        assert!(passes_special_conditions(&p, &profile));

        p.special_conditions = Some("청년".to_string());
        assert!(passes_special_conditions(&p, &profile));
    }

    #[test]
    fn test_region_filter_only_for_out_of_region_profiles() {
        let mut seoul_only = program("서울 청년수당");
        seoul_only.residence_required = Some("서울시 거주".to_string());
        let open = program("전국 주거급여");
        let catalog = vec![seoul_only, open];

        let busan = UserProfile {
            residence: Some("부산".to_string()),
            ..Default::default()
        };
        let names: Vec<_> = filter_candidates(&busan, &catalog)
            .iter()
            .map(|p| p.program_name.as_str())
            .collect();
        assert_eq!(names, vec!["전국 주거급여"]);

        let seoul = UserProfile {
            residence: Some("서울 강남구".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_candidates(&seoul, &catalog).len(), 2);
    }

    #[test]
    fn test_employment_is_permissive() {
        let mut p = program("재직청년 지원");
        p.employment_status = Some("재직".to_string());

        assert_eq!(employment_fit(&p, "재직"), EmploymentFit::Compatible);
        assert_eq!(employment_fit(&p, "구직중"), EmploymentFit::Unmatched);
        assert!(passes_employment(&p, "구직중"));

        p.employment_status = Some("제한없음".to_string());
        assert_eq!(employment_fit(&p, "학생"), EmploymentFit::Unrestricted);

        p.employment_status = Some("근로자".to_string());
        assert_eq!(employment_fit(&p, "재직"), EmploymentFit::Compatible);
    }

    #[test]
    fn test_adding_fields_never_widens() {
        let mut young = program("청년 지원");
        young.age_min = Some(19.0);
        young.age_max = Some(39.0);
        let mut seoul_only = program("서울 주거");
        seoul_only.residence_required = Some("서울".to_string());
        let mut newlywed = program("신혼부부 전세");
        newlywed.special_conditions = Some("신혼부부".to_string());
        let catalog = vec![young, seoul_only, newlywed, program("기본")];

        let mut profile = UserProfile::default();
        let mut previous = filter_candidates(&profile, &catalog).len();

        profile.age = Some(45);
        let after_age = filter_candidates(&profile, &catalog).len();
        assert!(after_age <= previous);
        previous = after_age;

        profile.residence = Some("대전".to_string());
        let after_region = filter_candidates(&profile, &catalog).len();
        assert!(after_region <= previous);
        previous = after_region;

        profile.employment_status = Some("재직".to_string());
        assert!(filter_candidates(&profile, &catalog).len() <= previous);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(filter_candidates(&UserProfile::default(), &[]).is_empty());
    }
}
