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

    /// object list node carries a resource tag with no known layout
    #[error("unknown resource type {resource_type:#04x} in object at {offset}")]
    #[diagnostic(help("the object chain cannot be followed past an unknown resource"))]
    UnknownResourceType {
        /// raw tag
        resource_type: u8,
        /// offset of the node within the record
        offset: i32,
    },
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        Error::Bsa(value.into())
    }
}

impl Error {
    /// Shorthand for a [`df_bsa::error::Error::StructuralMismatch`]
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Error::Bsa(df_bsa::error::Error::StructuralMismatch(message.into()))
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
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
