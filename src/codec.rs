//! The codec boundary: encoding serde types into a [`DynamicOps`] format and
//! back, with error traces.
//!
//! # Example
//!
//! ```
//! use na_codec::{Codec, CodecFactory, JsonOps};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Point {
//!     x: i32,
//!     y: Option<i32>,
//! }
//!
//! let codec = CodecFactory::default().create::<Point>();
//! let encoded = codec.encode_start(&Point { x: 1, y: None }, &JsonOps).unwrap();
//! assert_eq!(encoded, json!({"x": 1}));
//!
//! let decoded = codec.parse(&JsonOps, &encoded).unwrap();
//! assert_eq!(decoded, Point { x: 1, y: None });
//! ```

use std::{fmt, marker::PhantomData, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{CodecOptions, CodecOptionsBuilder, DynamicDecoder, DynamicEncoder, DynamicOps, Error};

/// Result of a codec operation.
pub type DataResult<T> = std::result::Result<T, CodecError>;

/// A failed encode or decode, with the path to the element that failed.
#[derive(Debug)]
pub struct CodecError {
    trace: String,
    message: String,
    error: Error,
}

impl CodecError {
    /// The path to the failing element, such as `$[0].field`.
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// The full message, including the trace.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying error.
    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Converts values of `A` to and from any [`DynamicOps`] format.
pub trait Codec<A> {
    /// Encodes `input` and merges the result into `prefix`.
    fn encode<O: DynamicOps>(&self, input: &A, ops: &O, prefix: &O::Value) -> DataResult<O::Value>;

    /// Decodes an `A`, returning it with the part of the input that was not
    /// consumed.
    fn decode<O: DynamicOps>(&self, ops: &O, input: &O::Value) -> DataResult<(A, O::Value)>;

    /// Encodes `input` on its own.
    fn encode_start<O: DynamicOps>(&self, input: &A, ops: &O) -> DataResult<O::Value> {
        self.encode(input, ops, &ops.empty())
    }

    /// Decodes an `A`, discarding the remainder.
    fn parse<O: DynamicOps>(&self, ops: &O, input: &O::Value) -> DataResult<A> {
        self.decode(ops, input).map(|(value, _)| value)
    }
}

/// A [`Codec`] for any serde type, configured by [`CodecOptions`].
pub struct SerializerCodec<A> {
    options: Arc<CodecOptions>,
    _marker: PhantomData<fn() -> A>,
}

impl<A> SerializerCodec<A> {
    pub fn new(options: Arc<CodecOptions>) -> Self {
        Self {
            options,
            _marker: PhantomData,
        }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    fn failure(&self, action: &str, trace: String, error: Error) -> CodecError {
        let message = if self.options.print_error_stack_traces {
            format!(
                "{action} exception at {trace}: {error}\n{error:?}\n{}",
                std::backtrace::Backtrace::force_capture()
            )
        } else {
            format!("{action} exception at {trace}: {error}")
        };
        debug!(codec = %self, %trace, "{action} failed: {error}");
        CodecError {
            trace,
            message,
            error,
        }
    }
}

impl<A> Clone for SerializerCodec<A> {
    fn clone(&self) -> Self {
        Self::new(self.options.clone())
    }
}

impl<A> fmt::Display for SerializerCodec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerializerCodec[{}]", std::any::type_name::<A>())
    }
}

impl<A> fmt::Debug for SerializerCodec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerCodec")
            .field("type", &std::any::type_name::<A>())
            .field("options", &self.options)
            .finish()
    }
}

impl<A: Serialize + DeserializeOwned> Codec<A> for SerializerCodec<A> {
    fn encode<O: DynamicOps>(&self, input: &A, ops: &O, prefix: &O::Value) -> DataResult<O::Value> {
        let mut encoder = DynamicEncoder::new(ops, &self.options);
        let value = match encoder.encode(input) {
            Ok(value) => value,
            Err(e) => return Err(self.failure("Encoding", encoder.collect_trace(), e)),
        };
        if *prefix == ops.empty() {
            return Ok(value);
        }
        let merged = if let Ok(entries) = ops.get_map(&value) {
            ops.merge_to_map(prefix, entries)
        } else if let Ok(items) = ops.get_list(&value) {
            ops.merge_to_list(prefix, items)
        } else {
            ops.merge_to_primitive(prefix, value)
        };
        merged.map_err(|e| self.failure("Encoding", "$".to_owned(), e))
    }

    fn decode<O: DynamicOps>(&self, ops: &O, input: &O::Value) -> DataResult<(A, O::Value)> {
        let mut decoder = DynamicDecoder::new(ops, &self.options);
        match decoder.decode(input.clone()) {
            Ok(value) => Ok((value, ops.empty())),
            Err(e) => Err(self.failure("Decoding", decoder.collect_trace(), e)),
        }
    }
}

/// Creates [`SerializerCodec`]s that share one set of [`CodecOptions`].
#[derive(Clone, Debug, Default)]
pub struct CodecFactory {
    options: Arc<CodecOptions>,
}

impl CodecFactory {
    /// Builds the options by applying `configure` to a default builder.
    pub fn new(configure: impl FnOnce(CodecOptionsBuilder) -> CodecOptionsBuilder) -> Self {
        Self::with_options(configure(CodecOptions::builder()).build())
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn create<A: Serialize + DeserializeOwned>(&self) -> SerializerCodec<A> {
        SerializerCodec::new(self.options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dynamic, DynamicValueOps, ErrorKind};

    #[test]
    fn test_decode_returns_empty_remainder() {
        let codec = CodecFactory::default().create::<i32>();
        let (value, rest) = codec.decode(&DynamicValueOps, &Dynamic::Int(3)).unwrap();
        assert_eq!(value, 3);
        assert_eq!(rest, Dynamic::Null);
    }

    #[test]
    fn test_encode_merges_into_prefix() {
        #[derive(Serialize, serde::Deserialize)]
        struct A {
            a: i32,
        }

        let codec = CodecFactory::default().create::<A>();
        let prefix = Dynamic::Map(vec![(Dynamic::from("b"), Dynamic::Int(2))]);
        let merged = codec.encode(&A { a: 1 }, &DynamicValueOps, &prefix).unwrap();
        assert_eq!(merged.get_str("a"), Some(&Dynamic::Int(1)));
        assert_eq!(merged.get_str("b"), Some(&Dynamic::Int(2)));
    }

    #[test]
    fn test_failure_message_names_trace() {
        let codec = CodecFactory::default().create::<Vec<u8>>();
        let input = Dynamic::List(vec![Dynamic::Int(1), Dynamic::Int(300)]);
        let err = codec.parse(&DynamicValueOps, &input).unwrap_err();
        assert_eq!(err.trace(), "$[1]");
        assert!(err.message().starts_with("Decoding exception at $[1]: "));
        assert_eq!(err.error().kind(), ErrorKind::MalformedData);
    }

    #[test]
    fn test_display() {
        let codec = CodecFactory::default().create::<String>();
        assert!(codec.to_string().starts_with("SerializerCodec["));
    }
}
