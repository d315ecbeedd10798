//! Error types for codec encoding and decoding.
//!
//! This module contains the [`Error`] type which represents everything that
//! can go wrong while driving a value through a [`DynamicOps`] format, plus
//! the binary NBT reader and writer.
//!
//! Every error belongs to an [`ErrorKind`]. The codec layer uses the kind to
//! decide nothing by itself; callers match on it to tell a broken input apart
//! from a type that can never be represented.
//!
//! # Example
//!
//! ```
//! use na_codec::{Codec, CodecFactory, ErrorKind, JsonOps};
//! use serde_json::json;
//!
//! let codec = CodecFactory::default().create::<Vec<i32>>();
//! let err = codec.parse(&JsonOps, &json!({"not": "a list"})).unwrap_err();
//! assert_eq!(err.error().kind(), ErrorKind::MalformedData);
//! ```
//!
//! [`DynamicOps`]: crate::DynamicOps

use std::fmt::Display;

use serde::{de, ser};

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// The state machine was driven in an order it does not accept.
    IllegalState,
    /// The value's shape can not be represented in the target format.
    UnsupportedShape,
    /// The input data does not match the expected type.
    MalformedData,
    /// The options and the type combine into an ambiguous encoding.
    AmbiguousConfiguration,
    /// Anything else, such as IO failures.
    Other,
}

/// This type represents all possible errors that can occur when encoding or
/// decoding through a codec, or when reading or writing binary NBT.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A free-form message raised by a `Serialize`/`Deserialize` impl.
    #[error("{0}")]
    Message(String),

    /// An encoder or decoder state received elements in an invalid order.
    #[error("{0}")]
    IllegalState(String),

    /// The value can not be represented with the current format and options.
    #[error("{0}")]
    UnsupportedShape(String),

    /// The input does not have the structure the target type expects.
    #[error("{0}")]
    MalformedData(String),

    /// The combination of options and type produces an ambiguous encoding.
    #[error("{0}")]
    AmbiguousConfiguration(String),

    /// Required fields were absent from the input.
    #[error("Required fields were not found: {}", quoted(.0))]
    MissingFields(Vec<String>),

    /// An I/O error occurred.
    ///
    /// This typically happens when writing to a [`std::io::Write`] implementation
    /// or reading from a [`std::io::Read`] implementation that encounters an error.
    #[error("{0}")]
    IO(#[from] std::io::Error),

    /// The input ended unexpectedly.
    #[error("unexpected end of input")]
    EndOfFile,

    /// Extra bytes remain after parsing the NBT data.
    #[error("trailing data after end of input: {0} bytes remaining")]
    TrailingData(usize),

    /// An invalid NBT tag type was encountered.
    ///
    /// NBT defines tag types 0-12. If a byte outside this range is found
    /// where a tag type is expected, this error is returned with the
    /// invalid byte value.
    #[error("invalid NBT tag type: {0:#04x}")]
    InvalidTagType(u8),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    pub(crate) fn illegal_state(msg: impl Display) -> Self {
        Error::IllegalState(msg.to_string())
    }

    pub(crate) fn unsupported(msg: impl Display) -> Self {
        Error::UnsupportedShape(msg.to_string())
    }

    pub(crate) fn malformed(msg: impl Display) -> Self {
        Error::MalformedData(msg.to_string())
    }

    pub(crate) fn ambiguous(msg: impl Display) -> Self {
        Error::AmbiguousConfiguration(msg.to_string())
    }

    /// Returns the [`ErrorKind`] of this error.
    ///
    /// Messages raised through serde's `custom` hooks and missing fields are
    /// treated as malformed input.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IllegalState(_) => ErrorKind::IllegalState,
            Error::UnsupportedShape(_) => ErrorKind::UnsupportedShape,
            Error::AmbiguousConfiguration(_) => ErrorKind::AmbiguousConfiguration,
            Error::Message(_)
            | Error::MalformedData(_)
            | Error::MissingFields(_)
            | Error::EndOfFile
            | Error::TrailingData(_)
            | Error::InvalidTagType(_) => ErrorKind::MalformedData,
            Error::IO(_) => ErrorKind::Other,
        }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingFields(vec![field.to_owned()])
    }
}
