//! Generation backends.
//!
//! Each backend implements [`LlmProvider`] on top of an HTTP inference API.

pub mod huggingface;
pub mod openai;

use std::time::Duration;

use reqwest::Client;

use crate::error::LlmError;

pub use huggingface::{HfInferenceClient, HF_INFERENCE_BASE_URL};
pub use openai::{ChatCompletionsClient, DEFAULT_CHAT_API_BASE, PARAPHRASE_SYSTEM_PROMPT};

// Re-export the main LlmProvider trait for convenience
pub use super::generation::LlmProvider;

/// Build the shared reqwest client. `None` leaves requests without a timeout.
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<Client, LlmError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| LlmError::ClientBuild(e.to_string()))
}
