//! Diversified top-N selection

use crate::models::MatchedProgram;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Maximum programs returned per turn
pub const MAX_RESULTS: usize = 10;

/// Maximum programs admitted from one primary category
pub const MAX_PER_CATEGORY: usize = 2;

/// Priority descending, then easier programs first; missing difficulty last
pub fn rank_order(a: &MatchedProgram, b: &MatchedProgram) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| {
        match (a.program.difficulty_level, b.program.difficulty_level) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}

/// Sort, then greedily admit rows while their category has room
pub fn select_diversified(mut candidates: Vec<MatchedProgram>) -> Vec<MatchedProgram> {
    candidates.sort_by(rank_order);

    let mut admitted_per_category: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(MAX_RESULTS.min(candidates.len()));

    for candidate in candidates {
        if selected.len() >= MAX_RESULTS {
            break;
        }

        let admitted = admitted_per_category
            .entry(candidate.program.category_key().to_string())
            .or_insert(0);

        if *admitted < MAX_PER_CATEGORY {
            *admitted += 1;
            selected.push(candidate);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Program;

    fn candidate(name: &str, category: &str, priority: i32, difficulty: Option<f64>) -> MatchedProgram {
        MatchedProgram {
            program: Program {
                program_name: name.to_string(),
                category_primary: Some(category.to_string()),
                difficulty_level: difficulty,
                ..Default::default()
            },
            priority,
        }
    }

    fn names(selected: &[MatchedProgram]) -> Vec<&str> {
        selected.iter().map(|m| m.program.program_name.as_str()).collect()
    }

    #[test]
    fn test_category_cap() {
        let mut candidates: Vec<_> = (0..5)
            .map(|i| candidate(&format!("주거{}", i), "주거", 100 - i, None))
            .collect();
        candidates.push(candidate("일자리0", "일자리", 10, None));

        let selected = select_diversified(candidates);
        assert_eq!(names(&selected), vec!["주거0", "주거1", "일자리0"]);
    }

    #[test]
    fn test_total_cap() {
        let candidates: Vec<_> = (0..30)
            .map(|i| candidate(&format!("p{}", i), &format!("cat{}", i % 8), i, None))
            .collect();

        let selected = select_diversified(candidates);
        assert_eq!(selected.len(), MAX_RESULTS);

        let mut per_category: HashMap<&str, usize> = HashMap::new();
        for m in &selected {
            *per_category.entry(m.program.category_key()).or_default() += 1;
        }
        assert!(per_category.values().all(|count| *count <= MAX_PER_CATEGORY));
        assert!(selected.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_difficulty_breaks_ties() {
        let candidates = vec![
            candidate("hard", "a", 50, Some(3.0)),
            candidate("unknown", "b", 50, None),
            candidate("easy", "c", 50, Some(1.0)),
            candidate("best", "d", 60, Some(5.0)),
        ];

        let selected = select_diversified(candidates);
        assert_eq!(names(&selected), vec!["best", "easy", "hard", "unknown"]);
    }

    #[test]
    fn test_missing_category_shares_default_bucket() {
        let mut a = candidate("a", "", 3, None);
        a.program.category_primary = None;
        let b = candidate("b", "", 2, None);
        let c = candidate("c", "기타", 1, None);

        let selected = select_diversified(vec![a, b, c]);
        assert_eq!(names(&selected), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_diversified(Vec::new()).is_empty());
    }
}
