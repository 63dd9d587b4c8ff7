//! Error types for cdl-core operations.
//!
//! Every failure raised by the object model falls into one of six
//! categories, reported by [`CdlError::kind`]:
//!
//! - **Type**: the input has the wrong shape (non-numeric text, a list given
//!   to a scalar). Never suppressed by the [`ValuePolicy`](crate::ValuePolicy).
//! - **Value**: right shape, wrong domain (negative slope, empty id under the
//!   strict policy, missing directory). Suppressed under the lenient policy.
//! - **Identity**: an explicit id collides with another correction. Always
//!   reported.
//! - **Attribute**: a write to a field that is fixed after construction.
//! - **Io**: filesystem failures other than a missing directory.
//! - **Config**: unreadable or invalid configuration files.
//!
//! # Usage
//!
//! ```rust
//! use cdl_core::{CdlError, ErrorKind};
//!
//! let err = CdlError::duplicate_id("sh010");
//! assert_eq!(err.kind(), ErrorKind::Identity);
//! assert!(err.to_string().contains("sh010"));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`CdlError`] as the error type.
pub type CdlResult<T> = std::result::Result<T, CdlError>;

/// Error category, mirroring how callers are expected to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong input shape or type.
    Type,
    /// Input outside the allowed domain.
    Value,
    /// Identifier collision.
    Identity,
    /// Write to an immutable field.
    Attribute,
    /// Underlying I/O failure.
    Io,
    /// Configuration file problem.
    Config,
}

/// Errors produced by the CDL object model.
#[derive(Debug, Error)]
pub enum CdlError {
    /// Text that does not parse as a number, or a NaN.
    #[error("{field}: '{value}' is not a number")]
    NotANumber {
        /// Field being assigned
        field: &'static str,
        /// Offending text
        value: String,
    },

    /// Input of the wrong structure for the field, e.g. a list for `sat`.
    #[error("{field}: expected {expected}")]
    WrongShape {
        /// Field being assigned
        field: &'static str,
        /// What the field accepts
        expected: &'static str,
    },

    /// A triplet assigned with the wrong number of components.
    #[error("{field}: expected 3 values, got {len}")]
    WrongLength {
        /// Field being assigned
        field: &'static str,
        /// Number of components supplied
        len: usize,
    },

    /// A value below the field's lower bound under the strict policy.
    #[error("{field}: {value} is below the minimum of 0.0")]
    OutOfDomain {
        /// Field being assigned
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// An empty correction id under the strict policy.
    #[error("correction id must not be empty")]
    EmptyIdRejected,

    /// A correction id already used by another correction.
    #[error("correction id '{id}' is already in use")]
    DuplicateId {
        /// Colliding id
        id: String,
    },

    /// A media reference that cannot be split into its components.
    #[error("malformed media reference '{uri}': {reason}")]
    MalformedUri {
        /// Offending reference
        uri: String,
        /// Why it was rejected
        reason: String,
    },

    /// A directory that sequence detection needed to list is gone.
    #[error("directory does not exist: {}", path.display())]
    MissingDirectory {
        /// Directory that was looked up
        path: PathBuf,
    },

    /// A write to a field that is fixed after construction.
    #[error("field '{field}' is read-only")]
    ReadOnly {
        /// Field name
        field: String,
    },

    /// A field name the dynamic setter does not know.
    #[error("unknown field '{field}'")]
    UnknownField {
        /// Field name
        field: String,
    },

    /// A handle whose entity was removed or whose registry was cleared.
    #[error("handle does not refer to a registered entity")]
    StaleHandle,

    /// I/O error during directory listing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file not found.
    #[error("config file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// YAML parsing error in a config file.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CdlError {
    /// Creates a [`CdlError::NotANumber`] error.
    #[inline]
    pub fn not_a_number(field: &'static str, value: impl Into<String>) -> Self {
        Self::NotANumber {
            field,
            value: value.into(),
        }
    }

    /// Creates a [`CdlError::DuplicateId`] error.
    #[inline]
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Creates a [`CdlError::MalformedUri`] error.
    #[inline]
    pub fn malformed_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`CdlError::ReadOnly`] error.
    #[inline]
    pub fn read_only(field: impl Into<String>) -> Self {
        Self::ReadOnly {
            field: field.into(),
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotANumber { .. } | Self::WrongShape { .. } => ErrorKind::Type,
            Self::WrongLength { .. }
            | Self::OutOfDomain { .. }
            | Self::EmptyIdRejected
            | Self::MalformedUri { .. }
            | Self::MissingDirectory { .. }
            | Self::UnknownField { .. }
            | Self::StaleHandle => ErrorKind::Value,
            Self::DuplicateId { .. } => ErrorKind::Identity,
            Self::ReadOnly { .. } => ErrorKind::Attribute,
            Self::Io(_) => ErrorKind::Io,
            Self::ConfigNotFound { .. } | Self::Yaml(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` for type errors.
    #[inline]
    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    /// Returns `true` for value errors.
    #[inline]
    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::Value
    }

    /// Returns `true` for identity errors.
    #[inline]
    pub fn is_identity_error(&self) -> bool {
        self.kind() == ErrorKind::Identity
    }
}
