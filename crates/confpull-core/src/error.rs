use std::path::PathBuf;

use thiserror::Error;

use crate::FileKind;

/// Failure categories reported at the workflow boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Validation,
    UnknownFile,
    /// Reported as a warning only; a fetch keeps going after it.
    BackupFailure,
    Install,
    Revert,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Validation => "validation",
            Self::UnknownFile => "unknown-file",
            Self::BackupFailure => "backup",
            Self::Install => "install",
            Self::Revert => "revert",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::Transport => 10,
            Self::Validation => 11,
            Self::UnknownFile => 12,
            Self::BackupFailure => 0,
            Self::Install => 13,
            Self::Revert => 14,
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error ({code}) while fetching {url}: {message}")]
    Transport {
        url: String,
        code: String,
        message: String,
    },

    #[error("Validation of remote {file_name} file failed: {reason}")]
    Validation {
        file_name: String,
        kind: FileKind,
        reason: String,
    },

    #[error("Unknown configuration file '{file_name}': it has no entry in the file registry")]
    UnknownFile { file_name: String },

    #[error(
        "Cannot resolve install path for {file_name}: it is installed per application, please add the app_name parameter"
    )]
    MissingAppName { file_name: String },

    #[error("Failed to update {file_name} file at {}: {reason}", path.display())]
    Install {
        file_name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Backup does not exist for {file_name}!")]
    NoBackup { file_name: String },

    #[error("File revert failed for {file_name} at {}: {reason}", path.display())]
    Revert {
        file_name: String,
        path: PathBuf,
        reason: String,
    },
}

impl FlowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Validation { .. } => FailureKind::Validation,
            Self::InvalidRequest(_) | Self::UnknownFile { .. } | Self::MissingAppName { .. } => {
                FailureKind::UnknownFile
            }
            Self::Install { .. } => FailureKind::Install,
            Self::NoBackup { .. } | Self::Revert { .. } => FailureKind::Revert,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}
