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

    /// region index is past the end of the archive
    #[error("region {region} not found, archive holds {count} regions")]
    RegionNotFound {
        /// requested region
        region: usize,
        /// regions in the archive
        count: usize,
    },

    /// location index or name is not part of the region
    #[error("location {location} not found in region {region}")]
    LocationNotFound {
        /// region searched
        region: usize,
        /// requested index or name
        location: String,
    },
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        Error::Bsa(value.into())
    }
}

impl Error {
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
