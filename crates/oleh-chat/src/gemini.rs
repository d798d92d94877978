//! Gemini chat client.
//!
//! Endpoint: `POST {endpoint}/models/{model}:generateContent`, authenticated
//! with the `x-goog-api-key` header.
//!
//! The client keeps the full conversation history and resends it on every
//! call, together with the system instruction and the tool declarations
//! fixed at construction time.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use oleh_core::config::LlmConfig;
use oleh_core::{Part, ToolRequest};
use oleh_tools::ToolDeclaration;

use crate::error::ChatError;
use crate::oracle::{ChatOracle, OracleResponse};

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [GeminiContent],
    system_instruction: SystemInstruction<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool<'a> {
    function_declarations: &'a [ToolDeclaration],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct FunctionCallingConfig {
    mode: &'static str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A part is text, inline data, a function call, or a function response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    /// Must be echoed back with the history on Gemini 2.5+.
    #[serde(skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

impl GeminiPart {
    fn from_part(part: Part) -> Self {
        match part {
            Part::Text(text) => GeminiPart {
                text: Some(text),
                ..Default::default()
            },
            Part::InlineData { mime_type, data } => GeminiPart {
                inline_data: Some(InlineData {
                    mime_type,
                    data: STANDARD.encode(data),
                }),
                ..Default::default()
            },
            Part::FunctionCall(request) => GeminiPart {
                function_call: Some(FunctionCall {
                    name: request.tool_name,
                    args: Value::Object(request.arguments),
                }),
                ..Default::default()
            },
            Part::FunctionResponse { name, response } => GeminiPart {
                function_response: Some(FunctionResponse { name, response }),
                ..Default::default()
            },
        }
    }

    fn to_part(&self) -> Option<Part> {
        if let Some(call) = &self.function_call {
            let arguments = call.args.as_object().cloned().unwrap_or_default();
            return Some(Part::FunctionCall(ToolRequest::new(
                call.name.clone(),
                arguments,
            )));
        }
        if let Some(text) = &self.text {
            return Some(Part::Text(text.clone()));
        }
        if let Some(inline) = &self.inline_data {
            return match STANDARD.decode(&inline.data) {
                Ok(data) => Some(Part::InlineData {
                    mime_type: inline.mime_type.clone(),
                    data,
                }),
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable inline data part");
                    None
                }
            };
        }
        self.function_response.as_ref().map(|r| Part::FunctionResponse {
            name: r.name.clone(),
            response: r.response.clone(),
        })
    }
}

fn classify_error(status: u16, body: &str) -> ChatError {
    let detail = serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|r| r.error);

    match detail {
        Some(error) => {
            let code = error.code.unwrap_or(status);
            let status_name = error.status.as_deref().unwrap_or("");
            if code == 401 || code == 403 || status_name == "UNAUTHENTICATED" {
                ChatError::Auth(error.message)
            } else {
                ChatError::Llm(error.message)
            }
        }
        None => ChatError::Llm(format!("Gemini API error ({}): {}", status, body)),
    }
}

// =============================================================================
// Client
// =============================================================================

const API_KEY_HEADER: &str = "x-goog-api-key";

/// One Gemini chat conversation.
pub struct GeminiChat {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
    system_instruction: String,
    tools: Vec<ToolDeclaration>,
    history: Vec<GeminiContent>,
}

impl GeminiChat {
    pub fn new(
        config: &LlmConfig,
        api_key: impl Into<String>,
        system_instruction: impl Into<String>,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self::with_client(Client::new(), config, api_key, system_instruction, tools)
    }

    /// Share one HTTP connection pool across sessions.
    pub fn with_client(
        client: Client,
        config: &LlmConfig,
        api_key: impl Into<String>,
        system_instruction: impl Into<String>,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
            system_instruction: system_instruction.into(),
            tools,
            history: Vec::new(),
        }
    }

    /// Number of contents (user and model) exchanged so far.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(&self) -> GenerateRequest<'_> {
        let has_tools = !self.tools.is_empty();
        GenerateRequest {
            contents: &self.history,
            system_instruction: SystemInstruction {
                parts: [TextPart {
                    text: &self.system_instruction,
                }],
            },
            tools: has_tools.then(|| {
                vec![GeminiTool {
                    function_declarations: &self.tools,
                }]
            }),
            tool_config: has_tools.then(|| ToolConfig {
                function_calling_config: FunctionCallingConfig { mode: "AUTO" },
            }),
            generation_config: self.temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }

    async fn generate(&self) -> Result<GenerateResponse, ChatError> {
        let response = self
            .client
            .post(self.api_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.request_body())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ChatOracle for GeminiChat {
    async fn send(&mut self, parts: Vec<Part>) -> Result<OracleResponse, ChatError> {
        self.history.push(GeminiContent {
            role: "user".to_string(),
            parts: parts.into_iter().map(GeminiPart::from_part).collect(),
        });

        let response = match self.generate().await {
            Ok(response) => response,
            Err(e) => {
                // The failed message never entered the conversation.
                self.history.pop();
                return Err(e);
            }
        };

        let candidates: Vec<GeminiContent> = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .collect();

        match candidates.first() {
            Some(first) => self.history.push(GeminiContent {
                role: "model".to_string(),
                parts: first.parts.clone(),
            }),
            None => warn!(model = %self.model, "Model returned no candidates"),
        }

        debug!(
            model = %self.model,
            candidates = candidates.len(),
            history = self.history.len(),
            "Model reply received"
        );

        Ok(OracleResponse::new(
            candidates
                .iter()
                .map(|c| c.parts.iter().filter_map(GeminiPart::to_part).collect())
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat(tools: Vec<ToolDeclaration>) -> GeminiChat {
        GeminiChat::new(&LlmConfig::default(), "test-key", "Be helpful.", tools)
    }

    #[test]
    fn test_api_url() {
        let url = chat(vec![]).api_url();
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_with_tools_and_inline_data() {
        let mut gemini = chat(vec![ToolDeclaration {
            name: "search_aliyah_information".to_string(),
            description: "Search.".to_string(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        }]);
        gemini.history.push(GeminiContent {
            role: "user".to_string(),
            parts: vec![
                GeminiPart::from_part(Part::text("Please explain this document for me.")),
                GeminiPart::from_part(Part::InlineData {
                    mime_type: "image/png".to_string(),
                    data: b"abc".to_vec(),
                }),
            ],
        });

        let body = serde_json::to_value(gemini.request_body()).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][1],
            json!({"inlineData": {"mimeType": "image/png", "data": "YWJj"}})
        );
        assert_eq!(
            body["systemInstruction"],
            json!({"parts": [{"text": "Be helpful."}]})
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "search_aliyah_information"
        );
        assert_eq!(body["toolConfig"]["functionCallingConfig"]["mode"], "AUTO");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_body_without_tools() {
        let body = serde_json::to_value(chat(vec![]).request_body()).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("toolConfig").is_none());
    }

    #[test]
    fn test_function_response_part_serialization() {
        let part = GeminiPart::from_part(Part::FunctionResponse {
            name: "find_ministry_of_aliyah_branch".to_string(),
            response: json!({"content": []}),
        });
        assert_eq!(
            serde_json::to_value(part).unwrap(),
            json!({"functionResponse": {
                "name": "find_ministry_of_aliyah_branch",
                "response": {"content": []}
            }})
        );
    }

    #[test]
    fn test_parse_function_call_response() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"functionCall": {
                            "name": "search_aliyah_information",
                            "args": {"query": "health insurance"}
                        }, "thoughtSignature": "sig"}
                    ]
                },
                "finishReason": "STOP"
            }]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        let content = response.candidates[0].content.as_ref().unwrap();
        assert_eq!(content.parts[0].thought_signature.as_deref(), Some("sig"));

        let part = content.parts[0].to_part().unwrap();
        let request = part.as_tool_request().unwrap();
        assert_eq!(request.tool_name, "search_aliyah_information");
        assert_eq!(request.arguments["query"], "health insurance");
    }

    #[test]
    fn test_inline_data_round_trips_through_base64() {
        let part = GeminiPart::from_part(Part::InlineData {
            mime_type: "application/pdf".to_string(),
            data: vec![0x25, 0x50, 0x44, 0x46],
        });
        assert_eq!(
            part.to_part(),
            Some(Part::InlineData {
                mime_type: "application/pdf".to_string(),
                data: vec![0x25, 0x50, 0x44, 0x46],
            })
        );
    }

    #[test]
    fn test_classify_error() {
        let auth = classify_error(
            400,
            r#"{"error": {"code": 401, "message": "API key not valid", "status": "UNAUTHENTICATED"}}"#,
        );
        assert!(matches!(auth, ChatError::Auth(ref m) if m == "API key not valid"));

        let quota = classify_error(
            429,
            r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#,
        );
        assert!(matches!(quota, ChatError::Llm(ref m) if m == "Quota exceeded"));

        let raw = classify_error(502, "Bad Gateway");
        assert_eq!(
            raw.to_string(),
            "LLM error: Gemini API error (502): Bad Gateway"
        );
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_unchanged() {
        let config = LlmConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..LlmConfig::default()
        };
        let mut gemini = GeminiChat::new(&config, "k", "sys", vec![]);
        let result = gemini.send(vec![Part::text("hello")]).await;
        assert!(result.is_err());
        assert_eq!(gemini.history_len(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let config = LlmConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..LlmConfig::default()
        };
        let mut gemini = GeminiChat::new(&config, "SUPERSECRETKEY123", "sys", vec![]);
        let err = gemini.send(vec![Part::text("hello")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY123"));
    }
}
