//! CLI definition for the humanizer.
//!
//! Without arguments the binary starts the interactive prompt. Folders
//! given on the command line are processed in order and the program exits
//! without prompting.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::folder::{FailurePolicy, FolderProcessor};
use crate::humanizer::{Paraphraser, TextTransformer, DEFAULT_MODEL};
use crate::llm::providers::{DEFAULT_CHAT_API_BASE, HF_INFERENCE_BASE_URL};
use crate::llm::{ChatCompletionsClient, HfInferenceClient, LlmProvider};
use crate::session::Session;

/// Default log level when neither RUST_LOG nor --log-level is set.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Environment variable selecting the backend when --provider is absent.
pub const PROVIDER_ENV: &str = "HUMANIZER_PROVIDER";

/// Environment variable overriding the backend's default base URL.
pub const API_BASE_ENV: &str = "HUMANIZER_API_BASE";

/// Environment variable overriding the paraphrasing model.
pub const MODEL_ENV: &str = "HUMANIZER_MODEL";

const LONG_ABOUT: &str = "\
humanizer reads each .txt file in a folder, paraphrases its content with a pretrained model \
and writes the result next to it as humanized_<name>.txt.

Without FOLDERS it prompts for folder paths until you type 'exit' or 'quit'.

Configuration falls back to HUMANIZER_PROVIDER, HUMANIZER_API_BASE and HUMANIZER_MODEL. \
The access token falls back to HF_TOKEN (huggingface) or OPENAI_API_KEY (openai).

Example usage:
  humanizer ./essays
  humanizer --api-base http://localhost:8080 ./essays
  HF_TOKEN=hf_xxx humanizer";

/// Paraphrase every .txt file in a folder with a pretrained model.
#[derive(Parser, Debug)]
#[command(name = "humanizer")]
#[command(about = "Paraphrase every .txt file in a folder with a pretrained text-to-text model")]
#[command(version)]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    /// Folders to process without prompting.
    pub folders: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Generation backend [default: huggingface].
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Base URL of the generation API (defaults depend on --provider).
    #[arg(long)]
    pub api_base: Option<String>,

    /// Access token for the generation API.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Paraphrasing model id [default: Vamsi/T5_Paraphrase_Paws].
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Per-request timeout in seconds. Requests wait indefinitely when unset.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep processing the remaining files when one file fails.
    #[arg(long)]
    pub keep_going: bool,

    /// Do not treat humanized_*.txt files as sources.
    #[arg(long)]
    pub skip_outputs: bool,
}

/// Backend settings after flags and environment are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub provider: ProviderKind,
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Cli {
    /// Per-file failure policy selected by the flags.
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::BestEffort
        } else {
            FailurePolicy::FailFast
        }
    }

    /// Merge flags with environment lookups; flags win.
    ///
    /// The access token is read from the variable that belongs to the
    /// selected provider, so a Hugging Face token is never sent to an
    /// OpenAI-compatible server.
    pub fn backend_config<F>(&self, env: F) -> anyhow::Result<BackendConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match self.provider {
            Some(provider) => provider,
            None => match env(PROVIDER_ENV) {
                Some(value) => ProviderKind::from_str(&value, true)
                    .map_err(|e| anyhow::anyhow!("Invalid {}: {}", PROVIDER_ENV, e))?,
                None => ProviderKind::default(),
            },
        };

        let api_base = self
            .api_base
            .clone()
            .or_else(|| env(API_BASE_ENV))
            .unwrap_or_else(|| provider.default_api_base().to_string());

        let api_key = self.api_key.clone().or_else(|| env(provider.api_key_env()));

        let model = self
            .model
            .clone()
            .or_else(|| env(MODEL_ENV))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(BackendConfig {
            provider,
            api_base,
            api_key,
            model,
        })
    }
}

/// Supported generation backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Hugging Face Inference API (or a compatible server).
    #[default]
    Huggingface,
    /// OpenAI-compatible chat completions API.
    Openai,
}

impl ProviderKind {
    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::Huggingface => HF_INFERENCE_BASE_URL,
            ProviderKind::Openai => DEFAULT_CHAT_API_BASE,
        }
    }

    /// Environment variable holding this backend's access token.
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Huggingface => "HF_TOKEN",
            ProviderKind::Openai => "OPENAI_API_KEY",
        }
    }
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing it.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// Loads the paraphraser once, then either processes the given folders or
/// starts the interactive session on stdin/stdout. A backend that cannot
/// serve the model fails here, before the first prompt.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = cli.backend_config(|key| std::env::var(key).ok())?;
    let timeout = cli.timeout_secs.map(Duration::from_secs);
    let provider = build_provider(&config, timeout)?;

    let paraphraser = Paraphraser::load(provider, config.model.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to load model '{}' from {}",
                config.model, config.api_base
            )
        })?;
    let transformer: Arc<dyn TextTransformer> = Arc::new(paraphraser);
    let processor = FolderProcessor::new(transformer)
        .with_policy(cli.failure_policy())
        .with_skip_outputs(cli.skip_outputs);

    if cli.folders.is_empty() {
        let stdin = io::stdin();
        let mut session = Session::new(processor, stdin.lock(), io::stdout());
        session.run().await?;
        return Ok(());
    }

    let mut stdout = io::stdout();
    for folder in &cli.folders {
        processor.process(folder, &mut stdout).await?;
    }
    Ok(())
}

/// Build the generation backend described by `config`.
fn build_provider(
    config: &BackendConfig,
    timeout: Option<Duration>,
) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::Huggingface => Arc::new(HfInferenceClient::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.model.clone(),
            timeout,
        )?),
        ProviderKind::Openai => Arc::new(ChatCompletionsClient::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.model.clone(),
            timeout,
        )?),
    };

    info!(
        provider = ?config.provider,
        api_base = %config.api_base,
        authenticated = config.api_key.is_some(),
        "Using generation backend"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::collections::HashMap;

    #[test]
    fn test_cli_parses() {
        // Verify CLI definition is valid
        Cli::command().debug_assert();
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["humanizer"]).expect("should parse");

        assert!(cli.folders.is_empty());
        assert_eq!(cli.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(cli.provider, None);
        assert_eq!(cli.model, None);
        assert_eq!(cli.api_key, None);
        assert_eq!(cli.timeout_secs, None);
        assert!(!cli.keep_going);
        assert!(!cli.skip_outputs);
        assert_eq!(cli.failure_policy(), FailurePolicy::FailFast);

        let config = cli.backend_config(env_of(&[])).expect("should resolve");
        assert_eq!(
            config,
            BackendConfig {
                provider: ProviderKind::Huggingface,
                api_base: HF_INFERENCE_BASE_URL.to_string(),
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
            }
        );
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "humanizer",
            "--provider",
            "openai",
            "--api-base",
            "http://localhost:8000/v1",
            "--api-key",
            "secret",
            "-m",
            "my-model",
            "--timeout-secs",
            "30",
            "--keep-going",
            "--skip-outputs",
            "-l",
            "debug",
            "./a",
            "./b",
        ])
        .expect("should parse");

        assert_eq!(cli.timeout_secs, Some(30));
        assert_eq!(cli.failure_policy(), FailurePolicy::BestEffort);
        assert!(cli.skip_outputs);
        assert_eq!(cli.log_level, "debug");
        assert_eq!(
            cli.folders,
            vec![PathBuf::from("./a"), PathBuf::from("./b")]
        );

        // Flags win over the environment.
        let env = env_of(&[
            (PROVIDER_ENV, "huggingface"),
            (API_BASE_ENV, "http://env-host"),
            (MODEL_ENV, "env-model"),
            ("OPENAI_API_KEY", "env-key"),
        ]);
        let config = cli.backend_config(env).expect("should resolve");
        assert_eq!(config.provider, ProviderKind::Openai);
        assert_eq!(config.api_base, "http://localhost:8000/v1");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model, "my-model");
    }

    #[test]
    fn test_environment_fallbacks() {
        let cli = Cli::try_parse_from(["humanizer"]).expect("should parse");
        let env = env_of(&[
            (PROVIDER_ENV, "OpenAI"),
            (API_BASE_ENV, "http://localhost:8000/v1"),
            (MODEL_ENV, "env-model"),
            ("OPENAI_API_KEY", "sk-env"),
        ]);

        let config = cli.backend_config(env).expect("should resolve");

        assert_eq!(config.provider, ProviderKind::Openai);
        assert_eq!(config.api_base, "http://localhost:8000/v1");
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.model, "env-model");
    }

    #[test]
    fn test_api_key_env_follows_provider() {
        let env = env_of(&[("HF_TOKEN", "hf_secret")]);

        let openai = Cli::try_parse_from(["humanizer", "--provider", "openai"])
            .expect("should parse")
            .backend_config(&env)
            .expect("should resolve");
        assert_eq!(openai.api_key, None);

        let huggingface = Cli::try_parse_from(["humanizer"])
            .expect("should parse")
            .backend_config(&env)
            .expect("should resolve");
        assert_eq!(huggingface.api_key.as_deref(), Some("hf_secret"));
    }

    #[test]
    fn test_invalid_provider_env() {
        let cli = Cli::try_parse_from(["humanizer"]).expect("should parse");
        let result = cli.backend_config(env_of(&[(PROVIDER_ENV, "anthropic")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_default_api_base() {
        assert_eq!(
            ProviderKind::Huggingface.default_api_base(),
            HF_INFERENCE_BASE_URL
        );
        assert_eq!(ProviderKind::Openai.default_api_base(), DEFAULT_CHAT_API_BASE);
        assert_eq!(ProviderKind::Huggingface.api_key_env(), "HF_TOKEN");
        assert_eq!(ProviderKind::Openai.api_key_env(), "OPENAI_API_KEY");
    }

    #[tokio::test]
    async fn test_run_fails_at_startup_when_backend_unreachable() {
        let temp_dir = tempfile::TempDir::new().expect("failed to create temp dir");
        std::fs::write(temp_dir.path().join("a.txt"), "Hello").expect("fixture");
        let cli = Cli::try_parse_from([
            "humanizer".to_string(),
            "--api-base".to_string(),
            "http://localhost:65535".to_string(),
            temp_dir.path().display().to_string(),
        ])
        .expect("should parse");

        let err = run_with_cli(cli).await.unwrap_err();

        assert!(err.to_string().contains("Failed to load model"));
        assert!(!temp_dir.path().join("humanized_a.txt").exists());
    }
}
