//! End-to-end folder runs with stub transformers.

use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use folder_humanizer::llm::{Candidate, GenerationRequest, GenerationResponse, LlmProvider};
use folder_humanizer::{
    FolderOutcome, FolderProcessor, LlmError, Paraphraser, Session, SessionState,
    TextTransformer,
};
use tempfile::TempDir;

struct UppercaseTransformer;

#[async_trait]
impl TextTransformer for UppercaseTransformer {
    async fn transform(&self, text: &str) -> Result<String, LlmError> {
        Ok(text.to_uppercase())
    }
}

/// Provider that echoes the input reversed, standing in for the model.
struct ReversingProvider;

#[async_trait]
impl LlmProvider for ReversingProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Ok(GenerationResponse {
            model: request.model,
            candidates: vec![Candidate {
                index: 0,
                text: request.inputs.chars().rev().collect(),
                finish_reason: None,
            }],
        })
    }

    fn default_model(&self) -> &str {
        "reverse"
    }

    async fn check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_two_file_scenario() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dir = temp_dir.path();
    fs::write(dir.join("a.txt"), "Hello world").expect("fixture");
    fs::write(dir.join("b.txt"), "Goodbye").expect("fixture");

    let processor = FolderProcessor::new(Arc::new(UppercaseTransformer));
    let mut console = Vec::new();
    let outcome = processor
        .process(dir, &mut console)
        .await
        .expect("should process");

    assert!(matches!(outcome, FolderOutcome::Processed(ref r) if r.processed.len() == 2));
    assert_eq!(
        fs::read_to_string(dir.join("humanized_a.txt")).expect("output a"),
        "HELLO WORLD"
    );
    assert_eq!(
        fs::read_to_string(dir.join("humanized_b.txt")).expect("output b"),
        "GOODBYE"
    );

    let text = String::from_utf8(console).expect("utf-8");
    assert!(text.contains("Found 2 text file(s)"));
    assert_eq!(text.matches("✅ Saved:").count(), 2);
}

#[tokio::test]
async fn test_paraphraser_through_processor() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dir = temp_dir.path();
    fs::write(dir.join("note.txt"), "abc").expect("fixture");

    let paraphraser = Paraphraser::load(Arc::new(ReversingProvider), "")
        .await
        .expect("load should succeed");
    let processor = FolderProcessor::new(Arc::new(paraphraser));
    processor
        .process(dir, &mut Vec::new())
        .await
        .expect("should process");

    assert_eq!(
        fs::read_to_string(dir.join("humanized_note.txt")).expect("output"),
        "cba"
    );
}

#[tokio::test]
async fn test_interactive_session_scenarios() {
    let empty = TempDir::new().expect("failed to create temp dir");
    let input = format!("/does/not/exist\n{}\n QUIT \n", empty.path().display());

    let mut session = Session::new(
        FolderProcessor::new(Arc::new(UppercaseTransformer)),
        Cursor::new(input.into_bytes()),
        Vec::new(),
    );
    session.run().await.expect("session should finish");
    assert_eq!(session.state(), SessionState::Done);

    let text = String::from_utf8(session.into_console()).expect("utf-8");
    let invalid = text.find("Invalid folder path").expect("invalid path reported");
    let no_files = text.find("No .txt files found").expect("empty folder reported");
    assert!(invalid < no_files);
    assert_eq!(text.matches("Enter folder path").count(), 3);
    assert!(text.ends_with("👋 Exiting program. Goodbye!\n"));
    assert_eq!(fs::read_dir(empty.path()).expect("read dir").count(), 0);
}
