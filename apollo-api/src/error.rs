//! Codec errors.
use displaydoc::Display;
use serde_json::error::Category;
use thiserror::Error;

use crate::json_ext::Path;

/// The category of an [`ApolloError`].
///
/// Callers usually only need to tell these apart: a server sending garbage
/// ([`ErrorKind::MalformedJson`]) is a different problem from a server sending
/// a value that the client side types don't understand ([`ErrorKind::DataShape`]),
/// which is often a sign of a schema mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The underlying reader or writer failed.
    Io,
    /// The bytes are not valid JSON, or a value cannot be represented as JSON.
    MalformedJson,
    /// The JSON is valid but does not have the shape an adapter expects.
    DataShape,
    /// The codec itself is not set up correctly, e.g. a custom scalar is not registered.
    Configuration,
}

/// Errors raised while composing a request or parsing a response.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum ApolloError {
    /// I/O error: {0}
    Io(#[from] std::io::Error),

    /// malformed JSON: {reason}
    JsonEncoding {
        /// Why the JSON could not be read or written.
        reason: String,
    },

    /// unexpected JSON at '{path}': {reason}
    JsonData {
        /// Where in the document the problem was found.
        path: Path,

        /// What was expected, and what was found instead.
        reason: String,
    },

    /// no adapter registered for custom scalar '{name}'
    UnregisteredScalar {
        /// The GraphQL name of the scalar.
        name: String,
    },

    /// the adapter registered for custom scalar '{name}' does not handle '{expected}'
    ScalarTypeMismatch {
        /// The GraphQL name of the scalar.
        name: String,

        /// The Rust type the caller asked for.
        expected: &'static str,
    },

    /// operation '{operation}' returned no data
    NullData {
        /// The name of the operation.
        operation: String,
    },
}

impl ApolloError {
    /// A value that cannot be represented as JSON, or JSON that cannot be read.
    pub fn encoding(reason: impl Into<String>) -> Self {
        ApolloError::JsonEncoding {
            reason: reason.into(),
        }
    }

    /// A value at `path` that does not have the expected shape.
    ///
    /// Adapters use this when a required field is missing or a scalar cannot
    /// be decoded; `path` is usually [`JsonReader::path`](crate::json::JsonReader::path).
    pub fn data(path: Path, reason: impl Into<String>) -> Self {
        ApolloError::JsonData {
            path,
            reason: reason.into(),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApolloError::Io(_) => ErrorKind::Io,
            ApolloError::JsonEncoding { .. } => ErrorKind::MalformedJson,
            ApolloError::JsonData { .. } | ApolloError::NullData { .. } => ErrorKind::DataShape,
            ApolloError::UnregisteredScalar { .. } | ApolloError::ScalarTypeMismatch { .. } => {
                ErrorKind::Configuration
            }
        }
    }
}

impl From<serde_json::Error> for ApolloError {
    fn from(error: serde_json::Error) -> Self {
        match error.classify() {
            Category::Io => ApolloError::Io(error.into()),
            Category::Syntax | Category::Eof => ApolloError::encoding(error.to_string()),
            Category::Data => ApolloError::data(Path::default(), error.to_string()),
        }
    }
}
