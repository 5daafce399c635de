//! Gemini-backed classifier.
//!
//! Sends the text as the only user message together with the moderation
//! policy, the response schema and a low temperature, then parses the
//! structured reply. No retries.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::policy::{response_schema, SYSTEM_INSTRUCTION};
use super::{ClassificationResult, ClassifyError, ContentClassifier};
use crate::config::{ClientConfig, TEMPERATURE};

/// Longest error body snippet kept in a service error.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: [UserContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserContent<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Classifier backed by the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GeminiClassifier {
    /// Creates a classifier from the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("GuardME/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn build_request<'a>(&self, text: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: [TextPart {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: [UserContent {
                role: "user",
                parts: [TextPart { text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
                temperature: TEMPERATURE,
            },
        }
    }

    /// Parses the body of a successful reply into a verdict.
    fn parse_reply(body: &str) -> Result<ClassificationResult, ClassifyError> {
        let reply: GenerateContentResponse = serde_json::from_str(body)?;
        let text = reply
            .text()
            .ok_or_else(|| ClassifyError::Service("no response received".to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ContentClassifier for GeminiClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        if text.trim().is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let start = Instant::now();
        debug!(
            model = %self.config.model,
            text_len = text.len(),
            "Sending classification request"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.build_request(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(%status, "Classification service returned an error");
            return Err(ClassifyError::Service(format!("HTTP {}: {}", status, snippet)));
        }

        let result = Self::parse_reply(&body)?;

        info!(
            action = %result.action,
            risk_score = %result.risk_score,
            category = %result.primary_category,
            latency_ms = start.elapsed().as_millis() as u64,
            "Classification complete"
        );

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
