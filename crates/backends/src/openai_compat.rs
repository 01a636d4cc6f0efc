//! OpenAI-compatible backend implementation.
//!
//! Works with any endpoint exposing a `/chat/completions` route with
//! function calling: OpenAI, OpenRouter, Ollama, vLLM, and friends.
//!
//! One non-streaming request per think-step; the capability definitions
//! ride along as the function list, and the first choice's message comes
//! back as the assistant message, call request included.

use async_trait::async_trait;
use ponder_core::backend::{ModelBackend, ThinkRequest};
use ponder_core::capability::CapabilityDef;
use ponder_core::error::BackendError;
use ponder_core::message::{CallRequest, Message};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible model backend.
pub struct OpenAiCompatBackend {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    /// Create a new OpenAI-compatible backend.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            client,
        })
    }

    /// Create an OpenAI backend (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, BackendError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Create an Ollama backend (convenience constructor).
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Result<Self, BackendError> {
        // Ollama doesn't need a real key
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
            model,
        )
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Convert domain messages to the API wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
                name: m.name.clone(),
                function_call: m.call.as_ref().map(|c| ApiFunctionCall {
                    name: c.name.clone(),
                    arguments: c.arguments.clone(),
                }),
            })
            .collect()
    }

    /// Convert capability definitions to the API function list.
    fn to_api_functions(capabilities: &[CapabilityDef]) -> Vec<ApiFunction> {
        capabilities
            .iter()
            .map(|c| ApiFunction {
                name: c.name.clone(),
                description: c.description.clone(),
                parameters: c.parameters.clone(),
            })
            .collect()
    }

    /// Convert an API choice message back into a domain message.
    fn from_api_message(message: ApiMessage) -> Message {
        let content = message.content.unwrap_or_default();
        match message.function_call {
            Some(fc) => Message::assistant_call(
                content,
                CallRequest {
                    name: fc.name,
                    arguments: fc.arguments,
                },
            ),
            None => Message::assistant(content),
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn think(&self, request: ThinkRequest) -> Result<Message, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": self.temperature,
            "stream": false,
        });

        if !request.capabilities.is_empty() {
            body["functions"] = serde_json::json!(Self::to_api_functions(&request.capabilities));
            body["function_call"] = serde_json::json!("auto");
        }

        debug!(
            backend = %self.name,
            model = %self.model,
            messages = request.messages.len(),
            "Sending think request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(BackendError::RateLimited { retry_after_secs: 5 });
        }

        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(BackendError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("response body: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::MalformedResponse("no choices in response".into()))?;

        if let Some(reason) = &choice.finish_reason {
            debug!(finish_reason = %reason, "Think response received");
        }

        Ok(Self::from_api_message(choice.message))
    }
}

// --- Wire types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponder_core::capability::{CapabilitySpec, ParamKind, ParamSpec};
    use ponder_core::message::Role;

    #[test]
    fn function_message_carries_its_name_on_the_wire() {
        let messages = vec![
            Message::system("be brief"),
            Message::function("clock", "10:00"),
        ];
        let api = OpenAiCompatBackend::to_api_messages(&messages);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "function");
        assert_eq!(api[1].name.as_deref(), Some("clock"));
        assert_eq!(api[1].content.as_deref(), Some("10:00"));
    }

    #[test]
    fn assistant_call_roundtrips_through_the_wire_form() {
        let messages = vec![Message::assistant_call(
            "",
            CallRequest {
                name: "whois".into(),
                arguments: r#"{"user":"amy"}"#.into(),
            },
        )];
        let api = OpenAiCompatBackend::to_api_messages(&messages);
        let fc = api[0].function_call.as_ref().unwrap();
        assert_eq!(fc.name, "whois");
        assert_eq!(fc.arguments, r#"{"user":"amy"}"#);
    }

    #[test]
    fn capability_defs_become_functions() {
        let def = CapabilitySpec::new("whois", "Look someone up")
            .param(ParamSpec::context("ctx"))
            .param(ParamSpec::new("user", ParamKind::String))
            .to_def();
        let functions = OpenAiCompatBackend::to_api_functions(&[def]);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "whois");
        let props = functions[0].parameters["properties"].as_object().unwrap();
        assert!(props.contains_key("user"));
        assert!(!props.contains_key("ctx"));
    }

    #[test]
    fn response_with_function_call_parses() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {"name": "clock", "arguments": "{}"}
                },
                "finish_reason": "function_call"
            }]
        }"#;
        let response: ApiResponse = serde_json::from_str(raw).unwrap();
        let message =
            OpenAiCompatBackend::from_api_message(response.choices.into_iter().next().unwrap().message);
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "");
        assert_eq!(message.call.unwrap().name, "clock");
    }

    #[test]
    fn plain_response_parses() {
        let raw = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }]
        }"#;
        let response: ApiResponse = serde_json::from_str(raw).unwrap();
        let message =
            OpenAiCompatBackend::from_api_message(response.choices.into_iter().next().unwrap().message);
        assert_eq!(message.content, "Hello!");
        assert!(message.call.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend =
            OpenAiCompatBackend::new("test", "http://localhost:8080/v1/", "key", "m").unwrap();
        assert_eq!(backend.base_url, "http://localhost:8080/v1");
    }
}
