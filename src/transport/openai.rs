//! OpenAI-compatible Chat Completions streaming transport.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::BatonConfig;
use crate::error::BatonError;
use crate::types::{CompletionDelta, FinishReason, ToolCallDelta, ToolChoice};

use super::http::{bearer_headers, parse_sse_line, shared_client, status_to_error, SseFrame};
use super::{CompletionRequest, CompletionTransport, DeltaStream};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Streams completions from `{base_url}/chat/completions`.
pub struct OpenAiTransport {
    api_key: String,
    base_url: String,
}

impl OpenAiTransport {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Build from the `openai` credentials in `config`.
    pub fn from_config(config: &BatonConfig) -> Result<Self, BatonError> {
        let api_key = config
            .get_api_key("openai")
            .ok_or_else(|| BatonError::Authentication("Missing OPENAI_API_KEY".into()))?;
        Ok(Self::new(api_key, config.get_base_url("openai")))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn build_request_body(
        &self,
        request: &CompletionRequest,
    ) -> Result<Value, BatonError> {
        let mut body = json!({
            "model": request.model,
            "messages": serde_json::to_value(&request.messages)?,
            "stream": true,
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters.schema,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["parallel_tool_calls"] = Value::Bool(request.parallel_tool_calls);
            if let Some(ref choice) = request.tool_choice {
                body["tool_choice"] = tool_choice_to_openai(choice);
            }
        }

        Ok(body)
    }
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<DeltaStream, BatonError> {
        let body = self.build_request_body(request)?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "OpenAI stream"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(BatonError::Network(e));
                        break;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim();

                    match parse_sse_line(line) {
                        None => continue,
                        Some(SseFrame::Done) => break 'read,
                        Some(SseFrame::Data(data)) => match decode_chunk(data) {
                            Ok(Some(delta)) => {
                                let finished = delta.is_finished();
                                yield Ok(delta);
                                if finished {
                                    break 'read;
                                }
                            }
                            Ok(None) => {}
                            Err(err) => {
                                yield Err(err);
                                break 'read;
                            }
                        },
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn tool_choice_to_openai(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::None => json!("none"),
        ToolChoice::Required => json!("required"),
        ToolChoice::Function { name } => json!({
            "type": "function",
            "function": { "name": name },
        }),
    }
}

/// Decode one `data:` payload. Chunks without choices (usage-only) yield
/// `None`; error payloads become transport errors.
fn decode_chunk(data: &str) -> Result<Option<CompletionDelta>, BatonError> {
    let chunk: OpenAiStreamChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(BatonError::Transport(error.message));
    }
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };
    let finish_reason = choice
        .finish_reason
        .map(|raw| raw.parse().unwrap_or(FinishReason::Stop));
    Ok(Some(CompletionDelta {
        content: choice.delta.content.filter(|c| !c.is_empty()),
        tool_calls: choice.delta.tool_calls.unwrap_or_default(),
        finish_reason,
    }))
}

// OpenAI wire types (internal)

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    error: Option<OpenAiError>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Deserialize)]
struct OpenAiError {
    message: String,
}
