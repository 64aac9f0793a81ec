//! The result of parsing a GraphQL response.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;
use uuid::Uuid;

use crate::ApolloError;
use crate::Result;
use crate::json_ext::Object;
use crate::json_ext::Path;

/// A GraphQL response decoded for one operation.
///
/// `data` and `errors` are independent: a server may return partial data
/// along with errors, errors without data, or data alone.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct ApolloResponse<D> {
    /// Identifies this response, for correlation in logs.
    pub request_uuid: Uuid,

    /// The name of the operation this response was parsed for.
    pub operation_name: String,

    /// The decoded data, `None` when the server returned none or `null`.
    pub data: Option<D>,

    /// The GraphQL errors, in the order the server sent them.
    pub errors: Vec<Error>,

    /// The response extensions, left untyped.
    pub extensions: Object,
}

impl<D> ApolloResponse<D> {
    /// A response with `data` and no errors nor extensions.
    pub fn new(operation_name: impl Into<String>, data: Option<D>) -> Self {
        Self {
            request_uuid: Uuid::new_v4(),
            operation_name: operation_name.into(),
            data,
            errors: Vec::new(),
            extensions: Object::new(),
        }
    }

    /// Replace the errors.
    pub fn with_errors(mut self, errors: Vec<Error>) -> Self {
        self.errors = errors;
        self
    }

    /// Replace the extensions.
    pub fn with_extensions(mut self, extensions: Object) -> Self {
        self.extensions = extensions;
        self
    }

    /// Replace the generated request identifier.
    pub fn with_request_uuid(mut self, request_uuid: Uuid) -> Self {
        self.request_uuid = request_uuid;
        self
    }

    /// Whether the server returned at least one error.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The data, failing with [`ApolloError::NullData`] if there is none.
    pub fn data_assert_not_null(&self) -> Result<&D> {
        self.data.as_ref().ok_or_else(|| ApolloError::NullData {
            operation: self.operation_name.clone(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
/// The error location
pub struct Location {
    /// The line number
    pub line: u32,
    /// The column number
    pub column: u32,
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as found in the `errors` field of a response.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// If this is a field error, the JSON path to that field in `data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,

    /// Top level fields that are not part of the GraphQL specification.
    #[serde(flatten)]
    pub non_standard_fields: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///
    /// * `.locations(impl Into<`[`Vec`]`<`[`Location`]`>>)` or `.location(impl Into<`[`Location`]`>)`
    ///   Optional.
    ///
    /// * `.path(impl Into<`[`Path`]`>)`
    ///   Optional.
    ///
    /// * `.extensions(...)` or `.extension(impl Into<`[`ByteString`]`>, impl Into<`[`Value`]`>)`
    ///   Optional.
    ///
    /// * `.extension_code(impl Into<`[`String`]`>)`
    ///   Optional. Sets the "code" in the extension map unless already set.
    ///
    /// * `.non_standard_fields(...)`
    ///   Optional.
    ///
    /// * `.build()`
    ///   Finishes the builder and returns a GraphQL [`Error`].
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Path>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<ByteString, Value>,
        non_standard_fields: JsonMap<ByteString, Value>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(ByteString::from(code)));
        }
        Self {
            message,
            locations,
            path,
            extensions,
            non_standard_fields,
        }
    }

    /// Decode one entry of `errors`.
    ///
    /// Servers are not always compliant, so this keeps whatever is usable: a
    /// missing or invalid `message` becomes empty, invalid `locations`,
    /// `path` or `extensions` are dropped. Only an entry that is not an
    /// object is rejected.
    pub(crate) fn from_value(value: Value) -> std::result::Result<Error, &'static str> {
        let mut object = ensure_object!(value)?;

        let message = match extract_key_value_from_object!(object, "message", Value::String(s) => s)
        {
            Ok(message) => message.map(|s| s.as_str().to_string()).unwrap_or_default(),
            Err(error) => {
                tracing::debug!(%error, "ignoring invalid `message` within error");
                String::new()
            }
        };
        let locations = extract_key_value_from_object!(object, "locations")
            .map(skip_invalid_locations)
            .map(serde_json_bytes::from_value::<Vec<Location>>)
            .transpose()
            .unwrap_or_else(|error| {
                tracing::debug!(%error, "ignoring invalid `locations` within error");
                None
            })
            .unwrap_or_default();
        let path = extract_key_value_from_object!(object, "path")
            .map(serde_json_bytes::from_value::<Path>)
            .transpose()
            .unwrap_or_else(|error| {
                tracing::debug!(%error, "ignoring invalid `path` within error");
                None
            });
        let extensions =
            match extract_key_value_from_object!(object, "extensions", Value::Object(o) => o) {
                Ok(extensions) => extensions.unwrap_or_default(),
                Err(error) => {
                    tracing::debug!(%error, "ignoring invalid `extensions` within error");
                    Object::new()
                }
            };

        Ok(Self::new(
            message, locations, path, None, extensions, object,
        ))
    }

    /// Extract the error code from [`Error::extensions`] as a String if it is set.
    pub fn extension_code(&self) -> Option<String> {
        self.extensions.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.as_str().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Bool(_) => None,
        })
    }
}

/// Servers built on GraphQL Java report `{ "line": -1, "column": -1 }` when
/// they can't locate an error, while GraphQL requires positive numbers.
fn skip_invalid_locations(mut value: Value) -> Value {
    if let Some(array) = value.as_array_mut() {
        array.retain(|location| {
            location.get("line") != Some(&Value::from(-1))
                || location.get("column") != Some(&Value::from(-1))
        })
    }
    value
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}
