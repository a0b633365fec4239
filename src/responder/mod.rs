//! Reply generation collaborators
//!
//! A generator receives the classified intent, the merged profile and the
//! programs relevant to this turn, and writes the assistant's reply.

use crate::memory::ConversationMessage;
use crate::models::{text, Intent, MatchedProgram, UserProfile};
use crate::Result;
use async_trait::async_trait;
use std::fmt;

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiResponder;

/// Prior messages handed to the generator as context
pub const GENERATION_HISTORY_TURNS: usize = 4;

/// Mode tag prefixed to the generation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTag {
    Match,
    /// Matching turn whose cards are already on screen
    MatchCard,
    Detail,
    Eligibility,
    Apply,
}

impl ModeTag {
    pub fn for_turn(intent: Intent, has_programs: bool) -> Self {
        match intent {
            Intent::Apply => ModeTag::Apply,
            Intent::Detail => ModeTag::Detail,
            Intent::Eligibility => ModeTag::Eligibility,
            Intent::Match if has_programs => ModeTag::MatchCard,
            Intent::Match => ModeTag::Match,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModeTag::Match => "[MATCH_MODE]",
            ModeTag::MatchCard => "[MATCH_CARD_MODE]",
            ModeTag::Detail => "[DETAIL_MODE]",
            ModeTag::Eligibility => "[ELIGIBILITY_MODE]",
            ModeTag::Apply => "[APPLY_MODE]",
        }
    }
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a generator needs for one turn
#[derive(Debug, Clone, Copy)]
pub struct ReplyRequest<'a> {
    pub message: &'a str,
    pub intent: Intent,
    pub profile: &'a UserProfile,
    /// This turn's matches, or the previous turn's when no new match ran
    pub programs: &'a [MatchedProgram],
    pub history: &'a [&'a ConversationMessage],
}

/// Trait for reply generation (LLM controlled)
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, request: &ReplyRequest<'_>) -> Result<String>;
}

/// Reply used when generation fails; the turn still completes
pub fn fallback_reply(error: impl fmt::Display) -> String {
    format!("죄송해요, 응답 생성 중 오류가 발생했어요: {}", error)
}

/// Template responder for development & testing
/// Keeps the conversation functional without an LLM dependency
pub struct MockResponder;

#[async_trait]
impl ReplyGenerator for MockResponder {
    async fn generate(&self, request: &ReplyRequest<'_>) -> Result<String> {
        Ok(template_reply(request))
    }
}

fn template_reply(request: &ReplyRequest<'_>) -> String {
    let mode = ModeTag::for_turn(request.intent, !request.programs.is_empty());

    match mode {
        ModeTag::Match => {
            let missing = request.profile.missing_core_fields();
            let asked: Vec<&str> = missing.into_iter().take(3).collect();
            if asked.is_empty() {
                "말씀해 주신 상황에 맞는 복지를 찾고 있어요. 필요한 지원 분야가 있으면 알려주세요.".to_string()
            } else {
                format!(
                    "상황을 알려주셔서 감사해요. 더 정확한 추천을 위해 {}을(를) 알려주시겠어요?",
                    asked.join(", ")
                )
            }
        }
        ModeTag::MatchCard => {
            let names: Vec<&str> = request
                .programs
                .iter()
                .take(3)
                .map(|m| m.program.program_name.as_str())
                .collect();
            format!(
                "지금 조건으로 {} 등을 추천드려요. 아래 카드에서 자세한 내용 확인해 보세요.\n궁금한 복지가 있으면 '{} 자세히 알려줘'라고 말씀해 주세요.",
                names.join(", "),
                names.first().copied().unwrap_or("○○")
            )
        }
        ModeTag::Detail | ModeTag::Eligibility | ModeTag::Apply => {
            let Some(target) = focus_program(request) else {
                return "어떤 복지가 궁금하신지 이름을 말씀해 주시면 안내해 드릴게요.".to_string();
            };
            let program = &target.program;
            match mode {
                ModeTag::Apply => format!(
                    "{} 신청 방법: {}\n문의: {}",
                    program.program_name,
                    or_unknown(text(&program.how_to_apply)),
                    or_unknown(text(&program.contact)),
                ),
                ModeTag::Eligibility => format!(
                    "{}의 대상 조건은 연령 {}, 특수조건 {}입니다. 현재 정보 기준으로 조건을 함께 확인해 보세요.",
                    program.program_name,
                    age_range(program.age_min, program.age_max),
                    or_unknown(text(&program.special_conditions)),
                ),
                _ => format!(
                    "{}: {}\n지원내용: {}",
                    program.program_name,
                    or_unknown(text(&program.description)),
                    or_unknown(text(&program.support_amount)),
                ),
            }
        }
    }
}

/// Program named in the message, else the top-ranked one
fn focus_program<'a>(request: &ReplyRequest<'a>) -> Option<&'a MatchedProgram> {
    request
        .programs
        .iter()
        .find(|m| request.message.contains(m.program.program_name.as_str()))
        .or_else(|| request.programs.first())
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "확인 필요"
    } else {
        value
    }
}

fn age_range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{}~{}세", min, max),
        (Some(min), None) => format!("{}세 이상", min),
        (None, Some(max)) => format!("{}세 이하", max),
        (None, None) => "제한 없음".to_string(),
    }
}
