//! Hugging Face Inference client for `text2text-generation` models.
//!
//! Talks to the hosted Inference API or any server exposing the same
//! `POST /models/{model}` contract. The model weights are loaded and run by
//! the server; this client only ships the text and decoding parameters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::build_http_client;
use crate::error::LlmError;
use crate::llm::{
    Candidate, GenerationParameters, GenerationRequest, GenerationResponse, LlmProvider,
};

/// Default Hugging Face Inference API endpoint.
pub const HF_INFERENCE_BASE_URL: &str = "https://router.huggingface.co/hf-inference";

/// Input of the startup generation that confirms the model is served.
const CHECK_INPUT: &str = "ping";

/// Client for Hugging Face-compatible text2text inference endpoints.
pub struct HfInferenceClient {
    /// HTTP client for making API requests.
    client: Client,
    /// Base URL for the inference API.
    api_base: String,
    /// Optional access token, sent as a bearer token.
    api_key: Option<String>,
    /// Model to use when a request leaves `model` empty.
    default_model: String,
}

impl HfInferenceClient {
    /// Create a client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL (e.g., "https://router.huggingface.co/hf-inference")
    /// * `api_key` - Optional access token
    /// * `default_model` - Model id (e.g., "Vamsi/T5_Paraphrase_Paws")
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

    /// Check if an access token is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.api_base, model)
    }
}

#[async_trait]
impl LlmProvider for HfInferenceClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };

        let api_request = ApiRequest {
            inputs: request.inputs,
            parameters: request.parameters,
            options: ApiOptions {
                wait_for_model: true,
            },
        };

        let url = self.model_url(&model);
        tracing::debug!(url = %url, model = %model, "Sending text2text generation request");

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
            return Err(error_from_response(status.as_u16(), &body, &model));
        }

        parse_response(&body, model)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Run a one-token greedy generation against the default model.
    async fn check(&self) -> Result<(), LlmError> {
        let request = GenerationRequest::new("", CHECK_INPUT).with_max_length(1);
        self.generate(request).await?;
        tracing::debug!(model = %self.default_model, "Inference endpoint is serving the model");
        Ok(())
    }
}

/// Map a non-2xx response body to an `LlmError`.
fn error_from_response(status_code: u16, body: &str, model: &str) -> LlmError {
    let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(body) else {
        return LlmError::ApiError {
            code: status_code,
            message: body.to_string(),
        };
    };

    match (status_code, error_response.estimated_time) {
        (503, Some(estimated_time)) => LlmError::ModelLoading {
            model: model.to_string(),
            estimated_time,
        },
        (429, _) => LlmError::RateLimited(error_response.error),
        _ => LlmError::ApiError {
            code: status_code,
            message: error_response.error,
        },
    }
}

/// Parse a successful response body into a `GenerationResponse`.
fn parse_response(body: &str, model: String) -> Result<GenerationResponse, LlmError> {
    let api_response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

    let outputs = match api_response {
        ApiResponse::Many(outputs) => outputs,
        ApiResponse::One(output) => vec![output],
    };

    let candidates = outputs
        .into_iter()
        .enumerate()
        .map(|(index, output)| Candidate {
            index: index as u32,
            text: output.generated_text,
            finish_reason: None,
        })
        .collect();

    Ok(GenerationResponse { model, candidates })
}

/// Internal request body for the inference API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    inputs: String,
    parameters: GenerationParameters,
    options: ApiOptions,
}

/// Request options understood by the inference API.
#[derive(Debug, Serialize)]
struct ApiOptions {
    /// Block until the model is loaded instead of failing with 503.
    wait_for_model: bool,
}

/// Successful response: a list of outputs, or a single one from some servers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiResponse {
    Many(Vec<ApiOutput>),
    One(ApiOutput),
}

#[derive(Debug, Deserialize)]
struct ApiOutput {
    generated_text: String,
}

/// Error response from the inference API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
    #[serde(default)]
    estimated_time: Option<f64>,
}
