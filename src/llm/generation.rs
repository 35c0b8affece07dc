//! Request/response types for text-to-text generation and the provider trait.
//!
//! A [`GenerationRequest`] carries one input text plus decoding parameters;
//! a [`GenerationResponse`] carries the generated candidates. Concrete
//! backends live in [`crate::llm::providers`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Decoding parameters for a generation request.
///
/// Field names follow the Hugging Face `text2text-generation` task so the
/// struct serializes directly into an inference request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Maximum length of the generated sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Number of candidates to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_return_sequences: Option<u32>,
    /// Sample the next token instead of greedy decoding.
    pub do_sample: bool,
    /// Sampling temperature. Higher values = more random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Keep only the k most likely tokens at each step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Nucleus sampling parameter (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

/// Request for text generation from a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier. Empty means "use the provider default".
    pub model: String,
    /// Input text handed to the model.
    pub inputs: String,
    /// Decoding parameters.
    pub parameters: GenerationParameters,
}

impl GenerationRequest {
    /// Create a new generation request with greedy, provider-default decoding.
    pub fn new(model: impl Into<String>, inputs: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            inputs: inputs.into(),
            parameters: GenerationParameters::default(),
        }
    }

    /// Set the maximum generated length.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.parameters.max_length = Some(max_length);
        self
    }

    /// Set how many candidates to generate.
    pub fn with_num_return_sequences(mut self, n: u32) -> Self {
        self.parameters.num_return_sequences = Some(n);
        self
    }

    /// Enable sampling with the given temperature, top-k and top-p values.
    pub fn with_sampling(mut self, temperature: f64, top_k: u32, top_p: f64) -> Self {
        self.parameters.do_sample = true;
        self.parameters.temperature = Some(temperature);
        self.parameters.top_k = Some(top_k);
        self.parameters.top_p = Some(top_p);
        self
    }
}

/// A single generated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Index of this candidate in the response.
    pub index: u32,
    /// Generated text.
    pub text: String,
    /// Reason the generation stopped, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response from a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model that produced the candidates.
    pub model: String,
    /// Generated candidates, in backend order.
    pub candidates: Vec<Candidate>,
}

impl GenerationResponse {
    /// Get the text of the first candidate, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.text.as_str())
    }
}

/// Trait for backends that can run text generation.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate candidates for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;

    /// Model used when a request leaves `model` empty.
    fn default_model(&self) -> &str;

    /// Confirm the backend is reachable and serves the default model.
    async fn check(&self) -> Result<(), LlmError>;
}
