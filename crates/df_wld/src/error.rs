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

    /// coordinates outside the map
    #[error("({x}, {y}) is outside the {width}x{height} map")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
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
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Error::Bsa(df_bsa::error::Error::StructuralMismatch(message.into()))
    }

    /// Whether this error was raised by reading past the end of the file
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::Bsa(e) if e.is_end_of_data())
    }

    /// Whether the header does not agree with the fixed map layout
    pub fn is_structural_mismatch(&self) -> bool {
        matches!(
            self,
            Error::Bsa(df_bsa::error::Error::StructuralMismatch(_))
        )
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
