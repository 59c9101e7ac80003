//! Gemini API Provider
//!
//! Generation provider over the Gemini REST API: blocking `generateContent`
//! calls for planning and page writing, `streamGenerateContent` (SSE) for
//! chat. Transient failures on the blocking calls retry with backoff; the
//! chat stream is finite and never restarted - a new call re-issues the
//! full request.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use futures::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    ChatRequest, ChunkStream, ContentRequest, GenerationProvider, PlanRequest, PlannedSection,
    ProviderConfig,
};
use crate::ai::prompt;
use crate::ai::sanitize::starts_with_user;
use crate::ai::validation::parse_planned_sections;
use crate::constants::network;
use crate::types::{ChatRole, DocloomError, GenerationPhase, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini provider with secure API key handling
pub struct GeminiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                DocloomError::Config(
                    "Gemini API key not found. Set GEMINI_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            client,
        })
    }

    /// One blocking generation call, retried on transient failures.
    async fn generate(&self, phase: GenerationPhase, body: GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, self.model
        );

        let send = || async {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", self.api_key.expose_secret())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                // Promote to an HTTP error so the backoff retries it
                if let Err(e) = response.error_for_status_ref() {
                    return Err(DocloomError::Http(e));
                }
            }
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(DocloomError::generation(
                    phase,
                    format!("API error ({}): {}", status, detail),
                ));
            }

            Ok(response.json::<GenerateResponse>().await?)
        };

        let response = send
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(network::BASE_DELAY_MS))
                    .with_max_delay(Duration::from_secs(network::MAX_DELAY_SECS))
                    .with_max_times(network::MAX_TRANSIENT_RETRIES),
            )
            .when(DocloomError::is_transient)
            .notify(|err, dur| {
                warn!(error = %err, wait_ms = dur.as_millis(), "Gemini request retrying");
            })
            .await
            .map_err(|e| match e {
                e @ DocloomError::Generation { .. } => e,
                other => DocloomError::generation(phase, other.to_string()),
            })?;

        extract_text(&response)
            .ok_or_else(|| DocloomError::generation(phase, "no candidates in response"))
    }

    fn single_turn(&self, text: String) -> GenerateRequest {
        GenerateRequest {
            contents: vec![WireContent::user(text)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
            }),
        }
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn plan_structure(&self, request: &PlanRequest) -> Result<Vec<PlannedSection>> {
        info!(repo = %request.repo_name, model = %self.model, "Planning documentation structure");

        let body = self.single_turn(prompt::plan_prompt(request));
        let text = self.generate(GenerationPhase::Plan, body).await?;

        debug!("Received plan response, parsing sections");
        parse_planned_sections(&text)
    }

    async fn page_content(&self, request: &ContentRequest) -> Result<String> {
        info!(title = %request.title, model = %self.model, "Generating page content");

        let body = self.single_turn(prompt::content_prompt(request));
        self.generate(GenerationPhase::Content, body).await
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        if !starts_with_user(&request.history) {
            return Err(DocloomError::InvalidHistory(
                "history must start with a user turn".to_string(),
            ));
        }

        let mut contents: Vec<WireContent> = request
            .history
            .iter()
            .map(|turn| WireContent {
                role: Some(
                    match turn.role {
                        ChatRole::User => "user",
                        ChatRole::Model => "model",
                    }
                    .to_string(),
                ),
                parts: vec![WirePart {
                    text: turn.text.clone(),
                }],
            })
            .collect();
        contents.push(WireContent::user(request.query));

        let body = GenerateRequest {
            contents,
            system_instruction: Some(WireContent {
                role: None,
                parts: vec![WirePart {
                    text: prompt::chat_instruction(&request.context),
                }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
            }),
        };

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DocloomError::generation(
                GenerationPhase::Chat,
                format!("API error ({}): {}", status, detail),
            ));
        }

        debug!("Chat stream opened");
        Ok(sse_chunk_stream(response))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// =============================================================================
// SSE Stream Decoding
// =============================================================================

type ByteStream =
    Pin<Box<dyn Stream<Item = std::result::Result<Vec<u8>, reqwest::Error>> + Send>>;

struct SseState {
    inner: ByteStream,
    buffer: String,
    pending: VecDeque<String>,
}

/// Turn an SSE response body into a stream of text chunks.
///
/// Dropping the returned stream abandons the response; partial output
/// already yielded is not rolled back.
fn sse_chunk_stream(response: reqwest::Response) -> ChunkStream {
    let state = SseState {
        inner: Box::pin(response.bytes_stream().map(|r| r.map(|b| b.to_vec()))),
        buffer: String::new(),
        pending: VecDeque::new(),
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                    while let Some(pos) = state.buffer.find('\n') {
                        let line: String = state.buffer.drain(..=pos).collect();
                        if let Some(text) = decode_sse_line(line.trim_end()) {
                            state.pending.push_back(text);
                        }
                    }
                }
                Some(Err(e)) => return Some((Err(DocloomError::Http(e)), state)),
                None => {
                    // Flush a trailing line that arrived without a newline
                    let leftover = std::mem::take(&mut state.buffer);
                    if let Some(text) = decode_sse_line(leftover.trim()) {
                        return Some((Ok(text), state));
                    }
                    return None;
                }
            }
        }
    }))
}

/// Decode one SSE line into its text payload, if any.
fn decode_sse_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data:")?.trim_start();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let value: GenerateResponse = serde_json::from_str(payload).ok()?;
    extract_text(&value).filter(|t| !t.is_empty())
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: &GenerateResponse) -> Option<String> {
    let candidate = response.candidates.as_ref()?.first()?;
    let parts = &candidate.content.as_ref()?.parts;
    if parts.is_empty() {
        return None;
    }
    Some(
        parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .concat(),
    )
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<WireContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl WireContent {
    fn user(text: String) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![WirePart { text }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatTurn;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(ProviderConfig {
            api_key: Some("test-key".to_string()),
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&response).as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_extract_text_handles_empty_response() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(extract_text(&response), None);

        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(&response), None);
    }

    #[test]
    fn test_decode_sse_line() {
        let line = r#"data: {"candidates": [{"content": {"parts": [{"text": "chunk"}]}}]}"#;
        assert_eq!(decode_sse_line(line).as_deref(), Some("chunk"));

        assert_eq!(decode_sse_line("data: [DONE]"), None);
        assert_eq!(decode_sse_line("data:"), None);
        assert_eq!(decode_sse_line(": keep-alive comment"), None);
        assert_eq!(decode_sse_line("event: ping"), None);
        assert_eq!(decode_sse_line("data: not json"), None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let debug = format!("{:?}", provider());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-key"));
    }

    #[tokio::test]
    async fn test_chat_stream_rejects_model_led_history() {
        let request = ChatRequest {
            history: vec![ChatTurn::model("greeting"), ChatTurn::user("q")],
            context: String::new(),
            query: "question".to_string(),
        };

        let err = match provider().chat_stream(request).await {
            Ok(_) => panic!("expected chat_stream to reject model-led history"),
            Err(e) => e,
        };
        assert!(matches!(err, DocloomError::InvalidHistory(_)));
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateRequest {
            contents: vec![WireContent::user("hi".to_string())],
            system_instruction: Some(WireContent {
                role: None,
                parts: vec![WirePart {
                    text: "ground".to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig { temperature: 0.0 }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "ground");
        assert!(json["generationConfig"]["temperature"].is_number());
    }
}
