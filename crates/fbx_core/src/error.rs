//! Error types for FBX traversal.

use thiserror::Error;

/// Errors that can occur while opening or walking a binary FBX document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic: not a binary FBX document")]
    BadMagic,

    #[error("read of {width} bytes at offset {offset:#x} runs past end offset {limit:#x}")]
    Truncated { offset: usize, width: usize, limit: usize },

    #[error("unknown property type tag {tag:#04x} at offset {offset:#x}")]
    UnknownPropertyTag { tag: u8, offset: usize },

    #[error("cursor at offset {offset:#x} does not point at a {expected}")]
    InvalidCursor { offset: usize, expected: &'static str },

    #[error("record name at offset {offset:#x} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("malformed record at offset {offset:#x}: {message}")]
    Malformed { offset: usize, message: String },
}

/// Discriminant of an [`Error`], for callers that only care about the class
/// of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    BadMagic,
    Truncated,
    UnknownPropertyTag,
    InvalidCursor,
    InvalidUtf8,
    Malformed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::BadMagic => ErrorKind::BadMagic,
            Error::Truncated { .. } => ErrorKind::Truncated,
            Error::UnknownPropertyTag { .. } => ErrorKind::UnknownPropertyTag,
            Error::InvalidCursor { .. } => ErrorKind::InvalidCursor,
            Error::InvalidUtf8 { .. } => ErrorKind::InvalidUtf8,
            Error::Malformed { .. } => ErrorKind::Malformed,
        }
    }

    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Error::Malformed {
            offset,
            message: message.into(),
        }
    }
}

/// Result type for FBX operations.
pub type Result<T> = std::result::Result<T, Error>;
