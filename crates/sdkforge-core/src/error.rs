//! Error types for SDK builds.

use crate::model::ManifestError;
use crate::splitter::SplitError;
use crate::validation::ValidationError;

/// Process exit codes of the `sdkforge` binary. Part of its public contract.
pub mod exit_codes {
    pub const EXIT_SUCCESS: i32 = 0;
    pub const EXIT_INVALID_INPUT: i32 = 1; // Invalid SDK bundle or dependency declaration
    pub const EXIT_CONFIG_ERROR: i32 = 2; // Bad flags, config file or output format
    pub const EXIT_INTERNAL_ERROR: i32 = 3; // Manifest or split contract broken
    pub const EXIT_IO_ERROR: i32 = 4; // Filesystem, archive or signing failure
}

use exit_codes::*;

/// Top-level error of a build or validation run.
#[derive(Debug, thiserror::Error)]
pub enum SdkForgeError {
    /// Invalid SDK bundle or dependency declaration.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Manifest lacked structure the pipeline relies on.
    #[error("internal error while editing manifest: {0}")]
    Manifest(#[from] ManifestError),

    /// Split generation broke its contract.
    #[error("internal error while generating splits: {0}")]
    Split(#[from] SplitError),

    /// Unusable build request (output format, flag combination, config file).
    #[error("{message}")]
    InvalidCommand { message: String },

    /// Loading a key or signing an artifact failed.
    #[error("signing failed: {0:#}")]
    Signing(anyhow::Error),

    /// Reading or writing archives and files failed.
    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl SdkForgeError {
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => EXIT_INVALID_INPUT,
            Self::InvalidCommand { .. } => EXIT_CONFIG_ERROR,
            Self::Manifest(_) | Self::Split(_) => EXIT_INTERNAL_ERROR,
            Self::Signing(_) | Self::Io(_) => EXIT_IO_ERROR,
        }
    }
}

/// Result type for sdkforge operations.
pub type SdkForgeResult<T> = Result<T, SdkForgeError>;
