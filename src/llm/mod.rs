//! Text generation backends for folder-humanizer.
//!
//! The paraphrasing model is an external, pretrained artifact. This module
//! defines the request/response contract used to reach it and the HTTP
//! clients that implement that contract:
//!
//! ```ignore
//! use folder_humanizer::llm::{GenerationRequest, HfInferenceClient, LlmProvider};
//!
//! let client = HfInferenceClient::new(
//!     "https://api-inference.huggingface.co",
//!     std::env::var("HF_TOKEN").ok(),
//!     "Vamsi/T5_Paraphrase_Paws",
//!     None,
//! )?;
//! let request = GenerationRequest::new("", "The quick brown fox.")
//!     .with_max_length(256)
//!     .with_sampling(0.7, 50, 0.95);
//! let response = client.generate(request).await?;
//! println!("{}", response.first_text().unwrap_or_default());
//! ```

pub mod generation;
pub mod providers;

pub use generation::{
    Candidate, GenerationParameters, GenerationRequest, GenerationResponse, LlmProvider,
};
pub use providers::{ChatCompletionsClient, HfInferenceClient};
