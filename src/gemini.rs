//! Gemini API client shared by profile extraction and reply generation
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::CompassError;
use crate::memory::{ConversationMessage, MessageRole};
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model for both collaborators
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Speaker of one prior conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One generation call: system instruction plus ordered turns
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub turns: Vec<(TurnRole, String)>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CompassError::LlmError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one generation and return the first candidate's text
    pub async fn generate(&self, request: &LlmRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(CompassError::LlmError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/{}:generateContent", BASE_URL, self.model);
        let body = build_request(request);

        debug!(model = %self.model, turns = body.contents.len(), "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                CompassError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(CompassError::LlmError(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            CompassError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        first_text(gemini_response)
    }
}

/// Prior turns followed by the new user message
///
/// Gemini expects the conversation to open with a user turn, so leading
/// assistant turns (the welcome message) are skipped.
pub fn conversation_turns(history: &[&ConversationMessage], latest: String) -> Vec<(TurnRole, String)> {
    history
        .iter()
        .skip_while(|m| m.role == MessageRole::Assistant)
        .map(|m| {
            let role = match m.role {
                MessageRole::User => TurnRole::User,
                MessageRole::Assistant => TurnRole::Model,
            };
            (role, m.content.clone())
        })
        .chain(std::iter::once((TurnRole::User, latest)))
        .collect()
}

fn build_request(request: &LlmRequest) -> GeminiRequest {
    GeminiRequest {
        contents: request
            .turns
            .iter()
            .map(|(role, text)| Content {
                role: Some(role.as_str().to_string()),
                parts: vec![Part { text: text.clone() }],
            })
            .collect(),
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: request.system.clone(),
            }],
        },
    }
}

fn first_text(response: GeminiResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CompassError::LlmError("No response from Gemini API".to_string()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(CompassError::LlmError(
            "Empty response from Gemini".to_string(),
        ));
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
