//! Error types for reading and writing CDL documents.

use cdl_core::{CdlError, ErrorKind};
use thiserror::Error;

/// Result type for cdl-io operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while reading or writing CDL documents.
#[derive(Debug, Error)]
pub enum IoError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A value or identity check failed while building an entity.
    #[error(transparent)]
    Cdl(#[from] CdlError),

    /// Well-formed XML that is not the expected document.
    #[error("parse error: {0}")]
    Parse(String),

    /// A document whose root element is not the one the reader expects.
    #[error("expected <{expected}> document, found <{found}>")]
    WrongDocument {
        /// Root element the reader handles
        expected: &'static str,
        /// Root element found, empty for an empty document
        found: String,
    },

    /// File extension or format tag that is not a CDL format.
    #[error("unknown CDL format: '{0}'")]
    UnknownFormat(String),
}

impl IoError {
    /// Creates an [`IoError::Parse`] error.
    #[inline]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Returns true if a lenient reader may skip the offending entity and
    /// carry on with the rest of the document.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Cdl(err) => matches!(
                err.kind(),
                ErrorKind::Type | ErrorKind::Value | ErrorKind::Identity
            ),
            Self::Parse(_) => true,
            _ => false,
        }
    }
}
