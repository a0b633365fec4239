//! Gemini-powered reply generation

use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use super::{ReplyGenerator, ReplyRequest, GENERATION_HISTORY_TURNS};
use crate::gemini::{conversation_turns, GeminiClient, LlmRequest};
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1000;

pub struct GeminiResponder {
    client: GeminiClient,
}

impl GeminiResponder {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(api_key, model)?,
        })
    }

    fn build_request(request: &ReplyRequest<'_>) -> LlmRequest {
        let skip = request.history.len().saturating_sub(GENERATION_HISTORY_TURNS);

        LlmRequest {
            system: SYSTEM_PROMPT.to_string(),
            turns: conversation_turns(&request.history[skip..], build_user_prompt(request)),
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

#[async_trait]
impl ReplyGenerator for GeminiResponder {
    async fn generate(&self, request: &ReplyRequest<'_>) -> Result<String> {
        let llm_request = Self::build_request(request);

        debug!(
            model = %self.client.model(),
            intent = %request.intent,
            programs = request.programs.len(),
            "Generating reply"
        );

        self.client.generate(&llm_request).await
    }
}
