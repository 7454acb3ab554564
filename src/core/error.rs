//! Error types for Combat Pad.
//!
//! State-machine transitions fail with [`ValidationError`], the save
//! directory with [`SaveError`]. Both fold into the crate-wide [`Error`],
//! which carries miette diagnostics for terminal reporting.

use miette::Diagnostic;
use thiserror::Error;

/// Bad input to a roster, combat or effect transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select at least one character or monster to start combat")]
    EmptySelection,

    #[error("Missing initiative for character: {0}")]
    MissingInitiative(String),

    #[error("Combat already in progress")]
    CombatAlreadyActive,

    #[error("Effect name cannot be empty")]
    EmptyEffectName,

    #[error("Effect duration must be at least 1 turn, got {0}")]
    InvalidDuration(i32),
}

/// Persistence failures surfaced by the save directory.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Referenced save file (or any save, for `load_latest`) is absent.
    #[error("Save file not found: {0}")]
    NotFound(String),

    /// File exists but is not a readable snapshot.
    #[error("Invalid save file {file}: {reason}")]
    Format { file: String, reason: String },

    /// Filesystem failure while saving, listing, loading or deleting.
    #[error("IO error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SaveError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn format(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Unified error for everything the tracker exposes.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(code("COMBAT_PAD::VALIDATION"))]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    #[diagnostic(
        code("COMBAT_PAD::NOT_FOUND"),
        help("List the save directory to see which snapshots exist")
    )]
    NotFound(String),

    #[error("{0}")]
    #[diagnostic(
        code("COMBAT_PAD::FORMAT"),
        help("The file is not a Combat Pad snapshot or was written by a newer version")
    )]
    Format(String),

    #[error("{0}")]
    #[diagnostic(
        code("COMBAT_PAD::IO"),
        help("Check free disk space and permissions on the save directory")
    )]
    Io(String),
}

impl From<SaveError> for Error {
    fn from(err: SaveError) -> Self {
        let message = err.to_string();
        match err {
            SaveError::NotFound(_) => Self::NotFound(message),
            SaveError::Format { .. } => Self::Format(message),
            SaveError::Io { .. } => Self::Io(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
