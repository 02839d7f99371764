use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for bumpv operations
#[derive(Error, Debug)]
pub enum BumpvError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Version parsing error: '{version}' does not match pattern '{pattern}'")]
    Parse { version: String, pattern: String },

    #[error("Unknown version part '{part}', expected one of: {}", known.join(", "))]
    UnknownVersionPart { part: String, known: Vec<String> },

    #[error("Part '{part}' is already at its last value '{value}' of [{}] and cannot be bumped", values.join(", "))]
    ExhaustedValues {
        part: String,
        value: String,
        values: Vec<String>,
    },

    #[error("Invalid value for part '{part}': {reason}")]
    InvalidPartValue { part: String, reason: String },

    #[error("Did not find a value for '{label}' in template '{format}'")]
    MissingValue { label: String, format: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid target file {}: {reason}", path.display())]
    InvalidTargetFile { path: PathBuf, reason: String },

    #[error("Working directory is dirty: {0}")]
    WorkingDirectoryIsDirty(String),

    #[error("VCS command '{command}' failed: {output}")]
    VcsCommand { command: String, output: String },

    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in bumpv
pub type Result<T> = std::result::Result<T, BumpvError>;

impl BumpvError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        BumpvError::Configuration(msg.into())
    }

    /// Create a template error with context
    pub fn template(msg: impl Into<String>) -> Self {
        BumpvError::Template(msg.into())
    }

    /// Create an invalid target file error for `path`
    pub fn invalid_target(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BumpvError::InvalidTargetFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a VCS command error carrying the failing command and its output
    pub fn vcs(command: impl Into<String>, output: impl Into<String>) -> Self {
        BumpvError::VcsCommand {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create an output rendering error
    pub fn output(msg: impl Into<String>) -> Self {
        BumpvError::Output(msg.into())
    }

    /// Process exit code the CLI reports for this error.
    ///
    /// Dirty working directories, missing target text and failing VCS
    /// commands exit with 1. Configuration problems exit with 2 and
    /// version/template problems with 3.
    pub fn exit_code(&self) -> i32 {
        match self {
            BumpvError::WorkingDirectoryIsDirty(_)
            | BumpvError::InvalidTargetFile { .. }
            | BumpvError::VcsCommand { .. }
            | BumpvError::Output(_)
            | BumpvError::Io(_) => 1,
            BumpvError::Configuration(_) => 2,
            BumpvError::Parse { .. }
            | BumpvError::UnknownVersionPart { .. }
            | BumpvError::ExhaustedValues { .. }
            | BumpvError::InvalidPartValue { .. }
            | BumpvError::MissingValue { .. }
            | BumpvError::Template(_) => 3,
        }
    }
}
