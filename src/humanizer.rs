//! Text transformer: turns one input text into one paraphrased text.
//!
//! [`Paraphraser`] is the production transformer. It is built once per
//! process and shared read-only through `Arc<dyn TextTransformer>`; every
//! call sends exactly one generation request with the fixed decoding
//! settings below. Sampling is enabled on purpose, so identical inputs may
//! produce different outputs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::{GenerationRequest, LlmProvider};

/// Default paraphrasing model.
pub const DEFAULT_MODEL: &str = "Vamsi/T5_Paraphrase_Paws";

/// Maximum generated length.
pub const MAX_LENGTH: u32 = 10000;

/// Number of candidates requested per call.
pub const NUM_RETURN_SEQUENCES: u32 = 1;

/// Sampling temperature.
pub const TEMPERATURE: f64 = 0.7;

/// Top-k truncation.
pub const TOP_K: u32 = 50;

/// Nucleus (top-p) truncation.
pub const TOP_P: f64 = 0.95;

/// Anything that rewrites a text into another text.
#[async_trait]
pub trait TextTransformer: Send + Sync {
    /// Transform `text`, returning exactly one result.
    async fn transform(&self, text: &str) -> Result<String, LlmError>;
}

/// Paraphrases text through a pretrained text-to-text model.
pub struct Paraphraser {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl Paraphraser {
    /// Construct the paraphraser once for the lifetime of the process.
    ///
    /// An empty `model` defers to the provider's default model. The backend
    /// is checked before returning, so an unreachable server or a model it
    /// does not serve fails here instead of on the first file.
    pub async fn load(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let model = model.into();
        let model = if model.is_empty() {
            provider.default_model().to_string()
        } else {
            model
        };

        provider.check().await?;
        info!(model = %model, "Paraphraser loaded");
        Ok(Self { provider, model })
    }

    /// Model id every request is sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request for one input text.
    pub fn request_for(&self, text: &str) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), text)
            .with_max_length(MAX_LENGTH)
            .with_num_return_sequences(NUM_RETURN_SEQUENCES)
            .with_sampling(TEMPERATURE, TOP_K, TOP_P)
    }

    /// Paraphrase `text` and return the first generated candidate.
    pub async fn humanize(&self, text: &str) -> Result<String, LlmError> {
        let response = self.provider.generate(self.request_for(text)).await?;
        debug!(
            model = %response.model,
            candidates = response.candidates.len(),
            "Generation finished"
        );
        response
            .first_text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl TextTransformer for Paraphraser {
    async fn transform(&self, text: &str) -> Result<String, LlmError> {
        self.humanize(text).await
    }
}
