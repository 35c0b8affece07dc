//! OpenAI-compatible chat completions client.
//!
//! Lets the humanizer run against LiteLLM, vLLM, llama.cpp server and
//! similar backends. The input text becomes the user message of a fixed
//! paraphrasing conversation; each returned choice becomes one candidate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::build_http_client;
use crate::error::LlmError;
use crate::llm::{Candidate, GenerationRequest, GenerationResponse, LlmProvider};

/// Default endpoint for a local LiteLLM proxy.
pub const DEFAULT_CHAT_API_BASE: &str = "http://localhost:4000/v1";

/// System prompt that turns a chat model into a paraphraser.
pub const PARAPHRASE_SYSTEM_PROMPT: &str =
    "Paraphrase the user's text so it reads as if a person wrote it. \
Keep the meaning, facts and language of the original. Reply with the rewritten text only.";

/// Client for OpenAI-compatible `/chat/completions` APIs.
pub struct ChatCompletionsClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    default_model: String,
}

impl ChatCompletionsClient {
    /// Create a new client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL for the API (e.g., "http://localhost:4000/v1")
    /// * `api_key` - Optional API key for authentication
    /// * `default_model` - Default model to use when none is specified
    /// * `timeout` - Per-request timeout; `None` waits indefinitely
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        default_model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            default_model: default_model.into(),
        })
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl ApiRequest {
    fn from_generation(model: String, request: GenerationRequest) -> Self {
        let params = request.parameters;
        // Chat backends treat temperature 0 as greedy; mirror do_sample=false that way.
        let temperature = if params.do_sample {
            params.temperature
        } else {
            Some(0.0)
        };

        Self {
            model,
            messages: vec![
                ApiMessage::new("system", PARAPHRASE_SYSTEM_PROMPT),
                ApiMessage::new("user", request.inputs),
            ],
            max_tokens: params.max_length,
            n: params.num_return_sequences,
            temperature,
            top_p: params.top_p.filter(|_| params.do_sample),
            top_k: params.top_k.filter(|_| params.do_sample),
        }
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let api_request = ApiRequest::from_generation(model, request);
        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        let body = http_response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        let api_response: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        Ok(api_response.into())
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    /// List the served models and look for the default one.
    async fn check(&self) -> Result<(), LlmError> {
        let url = format!("{}/models", self.api_base);
        tracing::debug!(url = %url, "Listing served models");

        let mut http_request = self.client.get(&url);
        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        let body = http_response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        ensure_model_listed(&body, &self.default_model)
    }
}

/// Map a non-2xx response body to an `LlmError`.
fn error_from_response(status_code: u16, body: &str) -> LlmError {
    let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(body) else {
        return LlmError::ApiError {
            code: status_code,
            message: body.to_string(),
        };
    };

    if status_code == 429 {
        LlmError::RateLimited(error_response.error.message)
    } else {
        LlmError::ApiError {
            code: status_code,
            message: error_response.error.message,
        }
    }
}

/// Fail when a `/models` listing names models but not `model`.
///
/// Proxies that return an empty or unparseable listing are accepted.
fn ensure_model_listed(body: &str, model: &str) -> Result<(), LlmError> {
    let Ok(listing) = serde_json::from_str::<ApiModelList>(body) else {
        return Ok(());
    };

    if listing.data.is_empty() || listing.data.iter().any(|m| m.id == model) {
        Ok(())
    } else {
        Err(LlmError::ApiError {
            code: 404,
            message: format!("model '{}' is not served by this endpoint", model),
        })
    }
}

impl From<ApiResponse> for GenerationResponse {
    fn from(api_response: ApiResponse) -> Self {
        let candidates = api_response
            .choices
            .into_iter()
            .map(|choice| Candidate {
                index: choice.index,
                text: choice.message.content,
                finish_reason: choice.finish_reason,
            })
            .collect();

        GenerationResponse {
            model: api_response.model,
            candidates,
        }
    }
}

/// Internal request structure for the chat completions API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl ApiMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Internal response structure from the chat completions API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    index: u32,
    message: ApiMessage,
    finish_reason: Option<String>,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response of `GET /models`.
#[derive(Debug, Deserialize)]
struct ApiModelList {
    data: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = ChatCompletionsClient::new(
            "http://localhost:4000/v1/",
            Some("test-key".to_string()),
            "gpt-4o-mini",
            None,
        )
        .expect("client should build");

        assert_eq!(client.api_base(), "http://localhost:4000/v1");
        assert_eq!(client.default_model(), "gpt-4o-mini");
        assert!(client.has_api_key());
    }

    #[test]
    fn test_api_request_from_sampling_request() {
        let request = GenerationRequest::new("", "Hello world")
            .with_max_length(10000)
            .with_num_return_sequences(1)
            .with_sampling(0.7, 50, 0.95);

        let api_request = ApiRequest::from_generation("gpt-4o-mini".to_string(), request);
        let json: serde_json::Value =
            serde_json::to_value(&api_request).expect("serialization should succeed");

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], PARAPHRASE_SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hello world");
        assert_eq!(json["max_tokens"], 10000);
        assert_eq!(json["n"], 1);
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["top_p"], 0.95);
        assert_eq!(json["top_k"], 50);
    }

    #[test]
    fn test_api_request_greedy_drops_sampling_fields() {
        let api_request =
            ApiRequest::from_generation("m".to_string(), GenerationRequest::new("", "x"));
        let json = serde_json::to_string(&api_request).expect("serialization should succeed");

        assert!(json.contains("\"temperature\":0.0"));
        assert!(!json.contains("top_p"));
        assert!(!json.contains("top_k"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_api_response_conversion() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "  Rewritten.\n"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let api_response: ApiResponse = serde_json::from_str(body).expect("should parse");
        let response: GenerationResponse = api_response.into();

        assert_eq!(response.model, "gpt-4o-mini");
        // Whitespace around the reply is part of the generated text.
        assert_eq!(response.first_text(), Some("  Rewritten.\n"));
        assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_generate_connection_error() {
        let client = ChatCompletionsClient::new("http://localhost:65535", None, "m", None)
            .expect("client should build");

        let result = client.generate(GenerationRequest::new("", "test")).await;

        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_check_unreachable_endpoint() {
        let client = ChatCompletionsClient::new("http://localhost:65535", None, "m", None)
            .expect("client should build");

        let result = client.check().await;

        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }

    #[test]
    fn test_error_rate_limited() {
        let body = r#"{"error": {"message": "Too many requests", "type": "rate_limit"}}"#;
        let err = error_from_response(429, body);
        assert!(matches!(err, LlmError::RateLimited(ref msg) if msg == "Too many requests"));
    }

    #[test]
    fn test_error_structured_api_error() {
        let body = r#"{"error": {"message": "Invalid model", "code": "model_not_found"}}"#;
        let err = error_from_response(404, body);
        assert!(matches!(
            err,
            LlmError::ApiError { code: 404, ref message } if message == "Invalid model"
        ));
    }

    #[test]
    fn test_error_raw_body() {
        let err = error_from_response(500, "Internal Server Error");
        assert!(matches!(
            err,
            LlmError::ApiError { code: 500, ref message } if message == "Internal Server Error"
        ));
    }

    #[test]
    fn test_model_listing() {
        let body = r#"{"object": "list", "data": [{"id": "gpt-4o-mini", "object": "model"}]}"#;
        assert!(ensure_model_listed(body, "gpt-4o-mini").is_ok());
        assert!(matches!(
            ensure_model_listed(body, "other-model"),
            Err(LlmError::ApiError { code: 404, .. })
        ));

        assert!(ensure_model_listed(r#"{"data": []}"#, "any").is_ok());
        assert!(ensure_model_listed("ok", "any").is_ok());
    }
}
