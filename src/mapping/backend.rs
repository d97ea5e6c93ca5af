use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::mapping::mapping_model::{MappingRequest, MappingResponse};

/// Why one mapping call produced no usable response.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("collaborator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("collaborator returned no content")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("collaborator reported an error: {0}")]
    Rejected(String),
}

/// The external mapping collaborator: decides which value goes where.
pub trait MappingBackend {
    fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse, MappingError>;
}

// ============================================================================
// Prompt
// ============================================================================

const MAPPING_INSTRUCTIONS: &str = r#"You are a field-mapping engine. Map each form field to a value from the dataset.

Return ONLY a JSON object of this shape:
{
  "mappedFields": [
    {
      "fieldKey": "<key from FORM FIELDS>",
      "label": "<label from FORM FIELDS>",
      "value": "<value, generated document text, or null>",
      "valueKind": "text" | "document",
      "confidence": 0.0-1.0,
      "reasoning": "<one sentence>",
      "locatorHint": "<CSS selector using id, name or aria-label>"
    }
  ],
  "missingFields": [
    { "label": "<label from FORM FIELDS>", "reason": "<why it could not be mapped>" }
  ]
}

Rules:
1. Match fields by meaning, not only by exact label text.
2. Text fields get the dataset value, reduced to the portion the field asks for.
3. File-upload fields get the full document content as plain text ("valueKind": "document"), never a path.
4. Dates, phone numbers and identifiers must use the format the field expects.
5. When the dataset lacks the information, set "value" to null and list the field in "missingFields".
6. Never invent data."#;

pub fn build_prompt(request: &MappingRequest) -> Result<String, MappingError> {
    let fields = serde_json::to_string_pretty(&request.fields)
        .map_err(|e| MappingError::Malformed(format!("cannot serialize fields: {}", e)))?;
    let dataset = serde_json::to_string_pretty(&request.dataset)
        .map_err(|e| MappingError::Malformed(format!("cannot serialize dataset: {}", e)))?;

    Ok(format!(
        "{}\n\nFORM FIELDS:\n{}\n\nDATASET:\n{}\n\nRespond with a single JSON object starting with {{ and ending with }}.",
        MAPPING_INSTRUCTIONS, fields, dataset
    ))
}

/// Pull the JSON object out of model output that may be wrapped in
/// markdown fences or surrounded by prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last < first {
        return None;
    }
    Some(&text[first..=last])
}

pub fn parse_mapping_text(text: &str) -> Result<MappingResponse, MappingError> {
    let body = extract_json_object(text)
        .ok_or_else(|| MappingError::Malformed("no JSON object in response".into()))?;
    serde_json::from_str(body).map_err(|e| MappingError::Malformed(e.to_string()))
}

// ============================================================================
// HTTP chat-completion backend
// ============================================================================

/// Mapping collaborator reached over an OpenAI-compatible chat-completions API.
pub struct HttpMappingBackend {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl HttpMappingBackend {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, MappingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MappingError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
            temperature: 0.1,
            max_tokens: 4096,
            client,
        })
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completion reply. Ollama-style `message`/`response` shapes are
/// accepted as well.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .or(self.message.map(|m| m.content))
            .or(self.response)
            .filter(|t| !t.trim().is_empty())
    }
}

impl MappingBackend for HttpMappingBackend {
    fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse, MappingError> {
        let prompt = build_prompt(request)?;
        debug!(prompt_chars = prompt.len(), fields = request.fields.len(), "sending mapping request");

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "You map form fields to dataset values. Always respond with valid JSON only.".into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut call = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .map_err(|e| MappingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MappingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .map_err(|e| MappingError::Malformed(e.to_string()))?;
        let text = reply.into_text().ok_or(MappingError::EmptyResponse)?;

        info!(
            characters = text.len(),
            estimated_tokens = text.len().div_ceil(4),
            "mapping response received"
        );

        parse_mapping_text(&text)
    }
}

/// Read a JSON dataset value, tolerating a top-level `{"dataset": ...}` wrapper.
pub fn unwrap_dataset(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("dataset") => {
            map.remove("dataset").unwrap_or(Value::Null)
        }
        other => other,
    }
}
