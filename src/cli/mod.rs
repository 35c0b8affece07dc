//! Command-line interface for the humanizer.
//!
//! Provides argument parsing, backend selection and the entry points used
//! by `main.rs`.

mod commands;

pub use commands::{
    parse_cli, run, run_with_cli, BackendConfig, Cli, ProviderKind, API_BASE_ENV, DEFAULT_LOG_LEVEL,
    MODEL_ENV, PROVIDER_ENV,
};
