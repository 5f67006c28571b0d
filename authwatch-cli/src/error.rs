//! CLI-specific error types and exit code mapping

use authwatch_core::error::{AuthwatchError, PipelineError};
use authwatch_log_pipeline::LogPipelineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The monitored log file cannot be opened or read.
    #[error("source log unavailable: {0}")]
    SourceUnavailable(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, signal handler, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from authwatch-core.
    #[error("{0}")]
    Core(#[from] AuthwatchError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                     |
    /// |------|-----------------------------|
    /// | 0    | Success                     |
    /// | 1    | General / command error     |
    /// | 2    | Configuration error         |
    /// | 5    | Source log unavailable      |
    /// | 10   | IO error                    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(AuthwatchError::Config(_)) => 2,
            Self::SourceUnavailable(_)
            | Self::Core(AuthwatchError::Pipeline(PipelineError::SourceUnavailable(_))) => 5,
            Self::Io(_) | Self::Core(AuthwatchError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<LogPipelineError> for CliError {
    fn from(e: LogPipelineError) -> Self {
        match e {
            LogPipelineError::SourceOpen { .. } | LogPipelineError::SourceRead { .. } => {
                Self::SourceUnavailable(e.to_string())
            }
            LogPipelineError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}
