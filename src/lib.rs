//! folder-humanizer: paraphrase folders of text files with a pretrained model.
//!
//! This library provides the pieces behind the `humanizer` binary: the
//! generation backends, the text transformer, the folder processor and the
//! interactive prompt session.

pub mod cli;
pub mod error;
pub mod folder;
pub mod humanizer;
pub mod llm;
pub mod session;

// Re-export commonly used types
pub use error::{FolderError, LlmError, SessionError};
pub use folder::{FailurePolicy, FolderOutcome, FolderProcessor, FolderReport};
pub use humanizer::{Paraphraser, TextTransformer};
pub use session::{Session, SessionState};
