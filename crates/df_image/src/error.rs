//! Error types that can be emitted from this library
//!

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`df_bsa::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bsa(#[from] df_bsa::error::Error),

    /// image header names a compression scheme with no known decoder
    #[error("unknown compression {0:#06x}")]
    UnknownCompression(u16),

    /// frame index past the end of a record
    #[error("record {record} has {count} frames, frame {frame} requested")]
    FrameNotFound {
        /// record index
        record: usize,
        /// requested frame
        frame: usize,
        /// frames in the record
        count: usize,
    },
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        Error::Bsa(value.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Bsa(value.into())
    }
}

impl Error {
    /// Shorthand for a [`df_bsa::error::Error::StructuralMismatch`]
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Error::Bsa(df_bsa::error::Error::StructuralMismatch(message.into()))
    }

    pub(crate) fn invalid_filename(name: impl Into<String>) -> Self {
        Error::Bsa(df_bsa::error::Error::InvalidFilename(name.into()))
    }

    pub(crate) fn record_not_found(record: usize) -> Self {
        Error::Bsa(df_bsa::error::RecordNotFoundError::Index(record).into())
    }

    /// Whether this error was raised by reading past the end of a record
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::Bsa(e) if e.is_end_of_data())
    }

    /// Whether the decoded layout did not agree with itself
    pub fn is_structural_mismatch(&self) -> bool {
        matches!(
            self,
            Error::Bsa(df_bsa::error::Error::StructuralMismatch(_))
        )
    }

    /// Whether the file was rejected by its name
    pub fn is_invalid_filename(&self) -> bool {
        matches!(self, Error::Bsa(df_bsa::error::Error::InvalidFilename(_)))
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
