//! Intent Classifier
//!
//! Maps a raw chat message (plus the previous turn's intent) to one of:
//! - Match: find programs for the user's situation
//! - Detail: explain one program in depth
//! - Eligibility: judge whether the user qualifies
//! - Apply: walk through the application procedure
//!
//! Keyword families are literal phrases matched as substrings of the
//! trimmed message. Family order is fixed: apply, detail, eligibility.

use crate::models::Intent;

/// Keyword families, checked in priority order
const APPLY_KEYWORDS: &[&str] = &[
    "신청 방법",
    "어떻게 신청",
    "어디서 신청",
    "신청하려면",
    "신청 절차",
    "서류 뭐 필요",
    "준비 서류",
];

const DETAIL_KEYWORDS: &[&str] = &[
    "자세히 알려줘",
    "자세히 설명",
    "자세히 알고 싶",
    "조건 좀 자세히",
    "좀 더",
];

const ELIGIBILITY_KEYWORDS: &[&str] = &[
    "신청 가능",
    "신청할 수 있",
    "받을 수 있",
    "해당돼",
    "해당되",
    "대상인가",
    "대상이야",
    "지원 가능",
    "자격이 되",
    "대상",
    "자격",
];

/// Phrases that drop a sticky follow-up intent back to matching
const RESET_KEYWORDS: &[&str] = &["다른 복지", "다른 제도", "처음부터"];

/// Phrases asking for programs beyond the ones already shown
const OTHER_REQUEST_KEYWORDS: &[&str] = &[
    "다른",
    "다른거",
    "다른 복지",
    "더 받을 수 있는 거",
    "더 받을 수 있는거",
    "더 받을 수 있는 게",
    "더 없나",
    "추가로 받을 수",
];

/// Category vocabulary a user can ask for explicitly
pub const CATEGORY_VOCABULARY: &[&str] = &[
    "주거", "일자리", "생활", "금융", "교육", "건강", "문화", "돌봄",
];

/// Ordered keyword families; first family with a hit wins
const FAMILIES: &[(Intent, &[&str])] = &[
    (Intent::Apply, APPLY_KEYWORDS),
    (Intent::Detail, DETAIL_KEYWORDS),
    (Intent::Eligibility, ELIGIBILITY_KEYWORDS),
];

/// Intent classifier
pub struct IntentClassifier;

impl IntentClassifier {
    /// Classify a message given the previous turn's intent
    pub fn classify(message: &str, last_intent: Option<Intent>) -> Intent {
        let text = message.trim();

        for (intent, keywords) in FAMILIES {
            if contains_any(text, keywords) {
                return *intent;
            }
        }

        match last_intent {
            Some(previous) if previous.is_sticky() => {
                if contains_any(text, RESET_KEYWORDS) {
                    Intent::Match
                } else {
                    previous
                }
            }
            _ => Intent::Match,
        }
    }

    /// Whether the user is asking for programs not yet recommended
    pub fn is_other_request(message: &str) -> bool {
        contains_any(message, OTHER_REQUEST_KEYWORDS)
    }

    /// Category the user explicitly asked for; the latest mention wins
    pub fn requested_category(message: &str) -> Option<&'static str> {
        CATEGORY_VOCABULARY
            .iter()
            .filter_map(|category| message.rfind(category).map(|pos| (pos, *category)))
            .max_by_key(|(pos, _)| *pos)
            .map(|(_, category)| category)
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_questions() {
        let cases = vec![
            "신청 방법 알려줘",
            "이거 어떻게 신청해?",
            "준비 서류가 뭐예요",
        ];

        for c in cases {
            assert_eq!(IntentClassifier::classify(c, None), Intent::Apply, "{}", c);
        }
    }

    #[test]
    fn test_detail_questions() {
        assert_eq!(
            IntentClassifier::classify("청년 월세 지원 자세히 알려줘", None),
            Intent::Detail
        );
        assert_eq!(
            IntentClassifier::classify("좀 더 설명해줄래?", Some(Intent::Match)),
            Intent::Detail
        );
    }

    #[test]
    fn test_eligibility_question() {
        assert_eq!(
            IntentClassifier::classify("이거 신청 가능해?", None),
            Intent::Eligibility
        );
    }

    #[test]
    fn test_family_order_prefers_apply() {
        // "신청하려면" is apply, "자격" is eligibility
        assert_eq!(
            IntentClassifier::classify("자격 되면 신청하려면 뭐 해야 돼?", None),
            Intent::Apply
        );
    }

    #[test]
    fn test_sticky_follow_up() {
        assert_eq!(
            IntentClassifier::classify("그럼 기간은 얼마나 돼?", Some(Intent::Detail)),
            Intent::Detail
        );
        assert_eq!(
            IntentClassifier::classify("그렇구나", Some(Intent::Apply)),
            Intent::Apply
        );
    }

    #[test]
    fn test_reset_phrase_overrides_stickiness() {
        assert_eq!(
            IntentClassifier::classify("다른 복지 알려줘", Some(Intent::Detail)),
            Intent::Match
        );
        assert_eq!(
            IntentClassifier::classify("처음부터 다시 할게요", Some(Intent::Eligibility)),
            Intent::Match
        );
    }

    #[test]
    fn test_default_is_match() {
        assert_eq!(
            IntentClassifier::classify("27살이고 월세 살고 있어요", None),
            Intent::Match
        );
        assert_eq!(
            IntentClassifier::classify("  ", Some(Intent::Match)),
            Intent::Match
        );
    }

    #[test]
    fn test_other_request_detection() {
        assert!(IntentClassifier::is_other_request("다른 것도 있어?"));
        assert!(IntentClassifier::is_other_request("더 없나요"));
        assert!(!IntentClassifier::is_other_request("월세 지원 알려줘"));
    }

    #[test]
    fn test_requested_category_takes_latest_mention() {
        assert_eq!(
            IntentClassifier::requested_category("주거 말고 일자리 쪽으로"),
            Some("일자리")
        );
        assert_eq!(IntentClassifier::requested_category("금융 지원 있어?"), Some("금융"));
        assert_eq!(IntentClassifier::requested_category("안녕하세요"), None);
    }
}
