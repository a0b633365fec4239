//! Generation prompt construction
//!
//! The user-side prompt is a mode tag followed by two steering
//! instructions, the raw message, the profile as JSON and a short summary
//! of the top matched programs.

use super::{ModeTag, ReplyRequest};
use crate::models::{text, Intent, MatchedProgram};
use crate::profile::MIN_CORE_FIELDS_FOR_MATCH;

/// Programs summarized for the model
pub const PROMPT_PROGRAM_LIMIT: usize = 5;

pub const NO_PROGRAMS_TEXT: &str = "추천을 드리기 위해서는 추가 정보가 필요합니다.";

pub const SYSTEM_PROMPT: &str = r#"당신은 서울시 복지 상담사 '나침반'입니다.

## 중요: 서울시 전용 서비스
- 이 서비스는 서울시 복지 전용 챗봇입니다.
- 서울 외 지역(부산, 인천, 대구, 경기도 등) 복지는 절대 추천하지 마세요.
- 서울 외 지역 사용자에게는 복지로(bokjiro.go.kr) 안내만 하세요.

"해당되는 복지 프로그램이 없습니다", "매칭되는 프로그램이 없습니다"라는 표현은 절대 쓰지 마세요.
정보가 부족하거나 조건이 완전히 일치하지 않더라도 가능성이 있는 방향을 먼저 보여주고,
더 정확한 매칭에 필요한 정보를 2~3가지 질문으로 요청하세요.

## 당신의 역할
- 사용자의 상황에 공감하고,
- 지금 조건으로 왜 복지 혜택 가능성이 있는지 설명하고,
- 화면에 따로 표시되는 복지 카드를 자연스럽게 보도록 안내합니다.
- 복지 카드는 별도로 렌더링되므로 카드 섹션이나 "자세히보기" 버튼 문구를 직접 만들지 마세요.

## 답변 모드

### [MATCH_CARD_MODE] 카드가 이미 표시되는 매칭
- 새로운 정보 수집 질문을 하지 마세요.
- 왜 이런 복지들이 추천되었는지 간단히 설명하고 "아래 카드에서 자세한 내용 확인해 보세요."라고 안내하세요.
- "궁금한 복지가 있으면 '○○ 자세히 알려줘'라고 말씀해 주세요."처럼 다음 행동만 제안하세요.

### [MATCH_MODE] 정보 수집 단계
1. 공감 (예: "취준 중에 월세까지 부담하시면 정말 빠듯하실 것 같아요")
2. 부족한 정보 2~3개 질문 (나이 / 거주지 / 고용 상태 / 주거 형태 / 소득)
3. 구체적인 제도 이름 남발은 피하고 어떤 방향의 복지가 가능한지만 설명
4. 정보가 충분해지면 카드가 표시될 수 있음을 안내

### [DETAIL_MODE] 특정 복지 설명
- 사용자가 묻는 복지 1개에 대해 대상, 혜택, 유의사항, 대략적인 신청 흐름을 사람 말처럼 설명하세요.
- 카드로 떠넘기지 말고 짧은 문단과 불릿으로 핵심을 직접 설명하세요.
- 마지막에는 다음 행동을 제안하세요.

### [ELIGIBILITY_MODE] 신청 가능 여부
1. 결론 먼저 말하기
2. 조건 비교
3. 추가 확인이 필요한 조건 안내
4. 다음 행동 제안

### [APPLY_MODE] 신청 방법
1. 준비 서류
2. 신청 경로
3. 신청 절차
4. 처리 기간
5. 주의사항

## 필수 정보 수집 ([MATCH_MODE]에서만 적용)
나이, 거주지, 고용 상태, 주거 형태, 소득 수준을 차례로 파악하세요.
전화번호, 주소, 주민등록번호 등 민감 정보는 절대 묻지 마세요."#;

const CARDS_SHOWN_INSTRUCTION: &str = "(이미 복지 카드가 제공되었으므로 추가 질문을 하지 말고, 보여준 카드 중심으로 안내만 이어가세요.\n\"더 많은 정보를 드리기 위해 질문 드릴게요\" 같은 문장은 사용하지 마세요.)";

const COLLECTING_INSTRUCTION: &str = "(아직 복지 카드가 제공되지 않았거나 정보 수집 단계입니다.\n지원 가능성 판단을 위해 2~3가지 질문을 자연스럽게 던지세요.\n전화번호/주소/주민등록번호 등 민감 정보는 절대 묻지 마세요.)";

const SPARSE_PROFILE_INSTRUCTION: &str = "지금은 핵심 정보(나이, 거주지, 고용 상태, 주거 형태, 소득) 중 3개 미만만 파악된 상태입니다.\n- 구체적인 복지 이름은 언급하지 마세요.\n- \"주거비를 도와주는 청년 지원\"처럼 포괄적인 방향만 이야기하세요.\n- 부족한 정보를 2~3가지 질문으로 물어보는 데 집중하세요.";

const NAMED_PROGRAMS_INSTRUCTION: &str = "핵심 정보가 어느 정도 수집된 상태이므로, 상황에 맞는 복지 프로그램 이름을 1~3개까지 구체적으로 언급해도 좋습니다.";

const MODE_GUIDE: &str = "위 정보를 바탕으로, 현재 모드에 맞게 답변하세요.
- [MATCH_CARD_MODE]: 추가 질문 없이 요약과 카드 안내만 합니다.
- [MATCH_MODE]: 상위 3개 정도를 자연스럽게 추천하고, 부족한 정보가 있다면 1~2개 질문합니다.
- [DETAIL_MODE]: 특정 복지 1개의 조건/혜택/유의사항을 설명합니다.
- [ELIGIBILITY_MODE]: 복지 1개의 신청 가능 여부를 조건 비교 중심으로 설명합니다.
- [APPLY_MODE]: 복지 1개의 신청 방법을 단계별로 안내합니다.";

pub fn extra_instruction(request: &ReplyRequest<'_>) -> &'static str {
    if request.intent == Intent::Match && !request.programs.is_empty() {
        CARDS_SHOWN_INSTRUCTION
    } else {
        COLLECTING_INSTRUCTION
    }
}

pub fn detail_level_instruction(request: &ReplyRequest<'_>) -> &'static str {
    if request.intent == Intent::Match
        && request.profile.core_field_count() < MIN_CORE_FIELDS_FOR_MATCH
    {
        SPARSE_PROFILE_INSTRUCTION
    } else {
        NAMED_PROGRAMS_INSTRUCTION
    }
}

/// Bullet summary of the top programs, or the fixed "need more info" text
pub fn summarize_programs(programs: &[MatchedProgram]) -> String {
    if programs.is_empty() {
        return NO_PROGRAMS_TEXT.to_string();
    }

    programs
        .iter()
        .take(PROMPT_PROGRAM_LIMIT)
        .map(|matched| {
            let program = &matched.program;
            format!(
                "- **{}** ({})\n  - 지원내용: {}\n  - 신청방법: {}\n  - 난이도: {}\n",
                program.program_name,
                program.category_key(),
                or_default(text(&program.support_amount), "상세 내용 확인 필요"),
                or_default(text(&program.how_to_apply), "홈페이지 확인"),
                difficulty_stars(program.difficulty_level),
            )
        })
        .collect()
}

/// One star per whole difficulty point; "보통" when unknown
pub fn difficulty_stars(level: Option<f64>) -> String {
    match level {
        Some(level) => "★".repeat(level.trunc().max(0.0) as usize),
        None => "보통".to_string(),
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Full user-side prompt for one generation call
pub fn build_user_prompt(request: &ReplyRequest<'_>) -> String {
    let mode = ModeTag::for_turn(request.intent, !request.programs.is_empty());
    let profile_json =
        serde_json::to_string(request.profile).unwrap_or_else(|_| "{}".to_string());

    format!(
        "{}\n{}\n{}\n\n사용자 메시지: {}\n추출된 사용자 정보: {}\n매칭된 복지 프로그램:\n{}\n\n{}",
        mode.as_str(),
        extra_instruction(request),
        detail_level_instruction(request),
        request.message,
        profile_json,
        summarize_programs(request.programs),
        MODE_GUIDE,
    )
}
