//! Interactive prompt loop.
//!
//! The loop is a two-state machine: [`SessionState::Prompting`] asks for a
//! folder path and hands it to the [`FolderProcessor`];
//! [`SessionState::Done`] is reached on `exit` / `quit` (any case,
//! surrounding whitespace ignored) or when input runs out. Input and output
//! are injected so the loop runs the same against a terminal or a buffer.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::error::SessionError;
use crate::folder::{FolderOutcome, FolderProcessor};

/// Prompt shown before each folder path is read.
pub const PROMPT: &str =
    "\n📁 Enter folder path containing .txt files (or type 'exit' to quit): ";

/// Farewell printed when the session ends.
pub const GOODBYE: &str = "👋 Exiting program. Goodbye!";

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Prompting,
    Done,
}

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Exit,
    Folder(PathBuf),
}

/// Interpret a raw input line.
pub fn parse_input(line: &str) -> UserInput {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        UserInput::Exit
    } else {
        UserInput::Folder(PathBuf::from(trimmed))
    }
}

/// Prompt loop over an input source and a console sink.
pub struct Session<R, W> {
    processor: FolderProcessor,
    input: R,
    console: W,
    state: SessionState,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(processor: FolderProcessor, input: R, console: W) -> Self {
        Self {
            processor,
            input,
            console,
            state: SessionState::Prompting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Give back the console sink, e.g. to inspect a test buffer.
    pub fn into_console(self) -> W {
        self.console
    }

    /// Run one prompt/transition. A no-op once the session is done.
    pub async fn step(&mut self) -> Result<SessionState, SessionError> {
        if self.state == SessionState::Done {
            return Ok(self.state);
        }

        write!(self.console, "{}", PROMPT)?;
        self.console.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            debug!("Input closed, ending session");
            writeln!(self.console)?;
            return self.finish();
        }

        match parse_input(&line) {
            UserInput::Exit => self.finish(),
            UserInput::Folder(folder) => {
                let outcome = self.processor.process(&folder, &mut self.console).await?;
                match outcome {
                    FolderOutcome::InvalidPath => {
                        debug!(folder = %folder.display(), "Invalid folder")
                    }
                    FolderOutcome::NoFiles => {
                        debug!(folder = %folder.display(), "No source files")
                    }
                    FolderOutcome::Processed(report) => debug!(
                        folder = %folder.display(),
                        processed = report.processed.len(),
                        failed = report.failures.len(),
                        "Folder processed"
                    ),
                }
                Ok(self.state)
            }
        }
    }

    /// Drive the session until it is done or a folder run fails.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        while self.step().await? == SessionState::Prompting {}
        Ok(())
    }

    fn finish(&mut self) -> Result<SessionState, SessionError> {
        writeln!(self.console, "{}", GOODBYE)?;
        self.state = SessionState::Done;
        Ok(self.state)
    }
}
