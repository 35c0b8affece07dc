//! Folder processing: humanize every `.txt` file in a directory.
//!
//! For each source file `<folder>/<name>.txt` the processor reads the whole
//! file as UTF-8, sends it through a [`TextTransformer`], and writes the
//! result to `<folder>/humanized_<name>.txt`, overwriting any previous
//! output. Only the top level of the folder is scanned, every regular file
//! whose name ends in `.txt` counts as a source, and files are handled in
//! file-name order.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::FolderError;
use crate::humanizer::TextTransformer;

/// Prefix of generated output files.
pub const OUTPUT_PREFIX: &str = "humanized_";

/// Suffix a file name must carry to be processed.
pub const SOURCE_SUFFIX: &str = ".txt";

/// What to do when a single file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the batch on the first error and return it.
    #[default]
    FailFast,
    /// Report the error, record it, and continue with the next file.
    BestEffort,
}

/// A source file and the output written for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// A file that failed under [`FailurePolicy::BestEffort`].
#[derive(Debug)]
pub struct FileFailure {
    pub source: PathBuf,
    pub error: FolderError,
}

/// Per-file results of a processed folder.
#[derive(Debug, Default)]
pub struct FolderReport {
    pub processed: Vec<ProcessedFile>,
    pub failures: Vec<FileFailure>,
}

impl FolderReport {
    /// Number of source files the run attempted.
    pub fn attempted(&self) -> usize {
        self.processed.len() + self.failures.len()
    }
}

/// Result of running the processor on one folder path.
#[derive(Debug)]
pub enum FolderOutcome {
    /// The path does not exist or is not a directory.
    InvalidPath,
    /// The folder holds no source files.
    NoFiles,
    /// At least one source file was found and attempted.
    Processed(FolderReport),
}

/// Output path for a source file: same folder, file name prefixed.
pub fn output_path(source: &Path) -> Option<PathBuf> {
    let file_name = source.file_name()?;
    let mut name = OsString::from(OUTPUT_PREFIX);
    name.push(file_name);
    Some(source.with_file_name(name))
}

/// Whether a directory entry name is a source file for this tool.
///
/// Matches on the raw name so non-UTF-8 file names still qualify.
pub fn is_source_name(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(SOURCE_SUFFIX.as_bytes())
}

/// Whether a directory entry name looks like a previous output.
pub fn is_output_name(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(OUTPUT_PREFIX.as_bytes())
}

/// List source files directly inside `folder`, sorted by file name.
///
/// With `skip_outputs` set, `humanized_*` files are left out so a re-run
/// only overwrites them.
pub fn discover_text_files(
    folder: &Path,
    skip_outputs: bool,
) -> Result<Vec<PathBuf>, FolderError> {
    let list_err = |source| FolderError::ListDir {
        path: folder.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        let name = entry.file_name();

        if !path.is_file() || !is_source_name(&name) {
            continue;
        }
        if skip_outputs && is_output_name(&name) {
            debug!(path = %path.display(), "Skipping previous output");
            continue;
        }
        files.push(path);
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Humanizes folders through a shared text transformer.
pub struct FolderProcessor {
    transformer: Arc<dyn TextTransformer>,
    policy: FailurePolicy,
    skip_outputs: bool,
}

impl FolderProcessor {
    /// Create a processor with the default fail-fast policy.
    pub fn new(transformer: Arc<dyn TextTransformer>) -> Self {
        Self {
            transformer,
            policy: FailurePolicy::default(),
            skip_outputs: false,
        }
    }

    /// Set the per-file failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Leave `humanized_*` files out of discovery.
    pub fn with_skip_outputs(mut self, skip_outputs: bool) -> Self {
        self.skip_outputs = skip_outputs;
        self
    }

    /// Get the per-file failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Process every source file in `folder`, writing progress to `console`.
    ///
    /// An invalid path and an empty folder are reported on the console and
    /// returned as outcomes, not errors. Under [`FailurePolicy::FailFast`]
    /// the first read, transform or write error aborts the batch.
    pub async fn process<W: Write>(
        &self,
        folder: &Path,
        console: &mut W,
    ) -> Result<FolderOutcome, FolderError> {
        if !folder.is_dir() {
            debug!(folder = %folder.display(), "Rejected folder path");
            emit(console, "❌ Invalid folder path.")?;
            return Ok(FolderOutcome::InvalidPath);
        }

        let files = discover_text_files(folder, self.skip_outputs)?;
        if files.is_empty() {
            emit(console, "⚠️ No .txt files found in the folder.")?;
            return Ok(FolderOutcome::NoFiles);
        }

        info!(folder = %folder.display(), count = files.len(), "Humanizing folder");
        emit(
            console,
            &format!("\n📂 Found {} text file(s). Processing...\n", files.len()),
        )?;

        let mut report = FolderReport::default();
        for source in files {
            match self.process_file(&source, console).await {
                Ok(processed) => report.processed.push(processed),
                Err(error) => match self.policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::BestEffort => {
                        warn!(
                            file = %source.display(),
                            error = %error,
                            "Failed to humanize file, skipping"
                        );
                        let line = format!("❌ Failed: {}: {}\n", display_name(&source), error);
                        emit(console, &line)?;
                        report.failures.push(FileFailure { source, error });
                    }
                },
            }
        }

        info!(
            folder = %folder.display(),
            processed = report.processed.len(),
            failed = report.failures.len(),
            "Folder done"
        );
        Ok(FolderOutcome::Processed(report))
    }

    async fn process_file<W: Write>(
        &self,
        source: &Path,
        console: &mut W,
    ) -> Result<ProcessedFile, FolderError> {
        let output = output_path(source).ok_or_else(|| FolderError::Write {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;

        let content = fs::read_to_string(source).map_err(|e| FolderError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;

        emit(console, &format!("➡️ Humanizing: {}", display_name(source)))?;
        debug!(file = %source.display(), bytes = content.len(), "Read source file");

        let humanized = self
            .transformer
            .transform(&content)
            .await
            .map_err(|e| FolderError::Transform {
                path: source.to_path_buf(),
                source: e,
            })?;

        fs::write(&output, humanized).map_err(|e| FolderError::Write {
            path: output.clone(),
            source: e,
        })?;

        emit(console, &format!("✅ Saved: {}\n", output.display()))?;
        Ok(ProcessedFile {
            source: source.to_path_buf(),
            output,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn emit<W: Write>(console: &mut W, line: &str) -> Result<(), FolderError> {
    writeln!(console, "{}", line).map_err(FolderError::Console)
}
