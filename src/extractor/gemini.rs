//! Gemini-powered profile extraction

use super::{ProfileExtractor, EXTRACTION_HISTORY_TURNS};
use crate::gemini::{conversation_turns, GeminiClient, LlmRequest};
use crate::memory::ConversationMessage;
use crate::models::ProfileUpdate;
use crate::profile::parse_extraction;
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

const TEMPERATURE: f32 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = r#"당신은 사용자의 메시지에서 복지 매칭에 필요한 정보를 추출하는 AI입니다.

다음 키를 가진 JSON 객체 하나만 출력하세요:
- age: 나이 (숫자, 없으면 null)
- income: 소득 (숫자, 만원 단위, 없으면 null). "백수", "무직"이면 0
- income_type: "월" 또는 "연" (없으면 null)
- income_scope: 소득 기준 ("개인" 또는 "부부합산", 없으면 null)
- residence: 거주지역 (예: "서울", "서울 강남구", 없으면 null)
- is_seoul_resident: 서울 거주 여부가 분명하면 true/false, 모르면 null
- employment_status: 고용상태, 다음 규칙으로 정규화
  * "취준생", "취업준비", "구직중", "일자리 찾는 중" → "구직중"
  * "백수", "무직", "일 안 함" → "무직"
  * "회사 다님", "직장인", "재직중" → "재직"
  * "대학생", "학교 다님" → "학생"
  * "프리랜서", "알바" → "프리랜서"
- housing_type: 주거형태 ("월세", "전세", "자가", "고시원", 없으면 null)
- special_conditions: 특수조건 목록 (예: ["청년", "한부모", "장애인"], 없으면 [])
- needs: 필요한 지원 종류 (예: ["주거", "생활비", "취업"], 없으면 [])
- household_size: 함께 사는 가구원 수 (숫자, 없으면 null)
  * "저 혼자 살아요" → 1
  * "배우자랑 둘이 살아요" → 2
  * "아이 둘 있어요" → 4 (부부+아이2)

대화 맥락을 고려하여 이전에 언급된 정보도 포함하세요.
반드시 유효한 JSON만 출력하세요. 설명, 인사말, 마크다운 코드블록(```) 없이 순수 JSON만 출력하세요."#;

pub struct GeminiExtractor {
    client: GeminiClient,
}

impl GeminiExtractor {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(api_key, model)?,
        })
    }

    fn build_request(message: &str, history: &[&ConversationMessage]) -> LlmRequest {
        let skip = history.len().saturating_sub(EXTRACTION_HISTORY_TURNS);

        LlmRequest {
            system: SYSTEM_PROMPT.to_string(),
            turns: conversation_turns(&history[skip..], message.to_string()),
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

#[async_trait]
impl ProfileExtractor for GeminiExtractor {
    async fn extract(
        &self,
        message: &str,
        history: &[&ConversationMessage],
    ) -> Result<ProfileUpdate> {
        let request = Self::build_request(message, history);
        let raw = self.client.generate(&request).await?;

        debug!(model = %self.client.model(), "Extraction output received");

        parse_extraction(&raw)
    }
}
