//! Shared error type across pulse crates.

use thiserror::Error;

/// Machine-readable error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Instrument name already registered.
    DuplicateName,
    /// Observation labels differ from the declared label names.
    LabelMismatch,
    /// Instrument state cannot be rendered.
    StructuralFault,
    /// Invalid instrument name, label name or bucket layout.
    InvalidDescriptor,
    /// Value rejected by the instrument (e.g. negative counter delta).
    InvalidValue,
    /// No instrument registered under the requested name.
    UnknownInstrument,
    /// Instrument exists but has a different kind.
    KindMismatch,
    /// Invalid input / malformed config.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateName => "DUPLICATE_NAME",
            ErrorCode::LabelMismatch => "LABEL_MISMATCH",
            ErrorCode::StructuralFault => "STRUCTURAL_FAULT",
            ErrorCode::InvalidDescriptor => "INVALID_DESCRIPTOR",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::UnknownInstrument => "UNKNOWN_INSTRUMENT",
            ErrorCode::KindMismatch => "KIND_MISMATCH",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("duplicate instrument name: {0}")]
    DuplicateName(String),
    #[error("label mismatch on {name}: expected [{expected}], got [{got}]")]
    LabelMismatch {
        name: String,
        expected: String,
        got: String,
    },
    #[error("structural fault in {name}: {reason}")]
    StructuralFault { name: String, reason: String },
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: f64 },
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),
    #[error("instrument {name} is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl PulseError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PulseError::DuplicateName(_) => ErrorCode::DuplicateName,
            PulseError::LabelMismatch { .. } => ErrorCode::LabelMismatch,
            PulseError::StructuralFault { .. } => ErrorCode::StructuralFault,
            PulseError::InvalidDescriptor(_) => ErrorCode::InvalidDescriptor,
            PulseError::InvalidValue { .. } => ErrorCode::InvalidValue,
            PulseError::UnknownInstrument(_) => ErrorCode::UnknownInstrument,
            PulseError::KindMismatch { .. } => ErrorCode::KindMismatch,
            PulseError::BadRequest(_) => ErrorCode::BadRequest,
            PulseError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            PulseError::Internal(_) => ErrorCode::Internal,
        }
    }
}
