use thiserror::Error;

use crate::directive::DirectiveError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file type not allowed: '{filename}' must end in .py or .jac")]
    FileTypeNotAllowed { filename: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("file not found: '{filename}'")]
    FileNotFound { filename: String },
    #[error("file already exists: '{filename}'")]
    FileAlreadyExists { filename: String },
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error("find pattern matched nothing; file left unchanged")]
    NoEffectiveChange,
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Stable machine-readable code for response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::FileTypeNotAllowed { .. } => "file_type_not_allowed",
            StoreError::InvalidInput(_) => "invalid_input",
            StoreError::FileNotFound { .. } => "file_not_found",
            StoreError::FileAlreadyExists { .. } => "file_already_exists",
            StoreError::Directive(DirectiveError::InvalidFormat) => "invalid_directive_format",
            StoreError::Directive(DirectiveError::InvalidPattern(_)) => "invalid_pattern",
            StoreError::NoEffectiveChange => "no_effective_change",
            StoreError::Io(_) => "io_error",
        }
    }
}
