//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    ///
    /// End of data conditions reported by binrw are converted into
    /// [`Error::UnexpectedEndOfData`] instead.
    #[error(transparent)]
    BinRWError(binrw::Error),

    /// file name does not carry the suffix required by the reader
    #[error("invalid file name {0}")]
    #[diagnostic(help("check the file extension"))]
    InvalidFilename(String),

    /// directory type tag in the archive header is not recognised
    #[error("invalid directory type {0:#06x}")]
    InvalidDirectoryType(u16),

    /// file is an invalid bsa archive
    #[error("file is an invalid bsa archive")]
    InvalidArchive,

    /// a read went past the end of the record being decoded
    #[error("unexpected end of data at {position}: needed {needed} bytes but only {available} available")]
    UnexpectedEndOfData {
        /// cursor position when the read was attempted
        position: usize,
        /// bytes requested
        needed: usize,
        /// bytes left in the view
        available: usize,
    },

    /// the decoded layout does not agree with itself
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// unable to find requested record
    #[error("unable to find requested record")]
    RecordNotFound(#[from] RecordNotFoundError),

    /// archive was not opened for writing
    #[error("archive was not opened for writing")]
    ReadOnly,

    /// replacement data does not match the stored record length
    #[error("record {index} is {expected} bytes, replacement is {actual} bytes")]
    LengthMismatch {
        /// record index
        index: usize,
        /// stored length
        expected: usize,
        /// replacement length
        actual: usize,
    },
}

/// Error type to provide further information when a record has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested record")]
pub enum RecordNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),

    /// by id {0}
    #[error("by id {0}")]
    Id(u32),
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        if value.is_eof() {
            // binrw does not carry the requested width through its eof errors
            return Error::UnexpectedEndOfData {
                position: 0,
                needed: 0,
                available: 0,
            };
        }

        match value {
            binrw::Error::Io(e) => Error::IOError(e),
            other => Error::BinRWError(other),
        }
    }
}

impl Error {
    /// Whether this error was raised by reading past the end of a record
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::UnexpectedEndOfData { .. })
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
