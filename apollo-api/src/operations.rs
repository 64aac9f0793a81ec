//! Entry points composing requests and parsing responses for an [`Operation`].

use crate::ApolloError;
use crate::BooleanVariables;
use crate::CustomScalarAdapters;
use crate::Result;
use crate::json::Close;
use crate::json::JsonReader;
use crate::json::JsonWriter;
use crate::json::StreamJsonWriter;
use crate::json::ValueJsonReader;
use crate::json::ValueJsonWriter;
use crate::json::use_closing;
use crate::json::write_object;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::operation::Operation;
use crate::response::ApolloResponse;
use crate::response_parser;

/// Request and response codec, available on every [`Operation`].
///
/// Entry points taking a reader or a writer take ownership of it and close it
/// exactly once before returning, whether they succeed or not.
pub trait OperationExt: Operation {
    /// Write the request body for this operation:
    ///
    /// ```json
    /// {"operationName": "...", "variables": {...}, "query": "..."}
    /// ```
    ///
    /// `variables` is always present, empty when the operation has none.
    fn compose_json_request<W: JsonWriter>(
        &self,
        writer: W,
        adapters: &CustomScalarAdapters,
    ) -> Result<()> {
        tracing::trace!(operation = self.name(), "composing JSON request");
        use_closing(writer, |writer| {
            write_object(writer, |writer| {
                writer.name("operationName")?;
                writer.value_str(self.name())?;
                writer.name("variables")?;
                write_object(writer, |writer| {
                    self.serialize_variables(writer, adapters)
                })?;
                writer.name("query")?;
                writer.value_str(self.document())
            })?;
            writer.flush()
        })
    }

    /// [`OperationExt::compose_json_request`] into a `String`.
    fn compose_json_request_string(&self, adapters: &CustomScalarAdapters) -> Result<String> {
        let mut buffer = Vec::new();
        self.compose_json_request(StreamJsonWriter::new(&mut buffer), adapters)?;
        into_string(buffer)
    }

    /// Read a response for this operation.
    ///
    /// The boolean variables of the operation are bound to the adapter
    /// context before `data` is decoded, so that fields guarded by `@skip` or
    /// `@include` can be told apart from fields that are missing.
    fn parse_json_response<R: JsonReader>(
        &self,
        reader: R,
        adapters: &CustomScalarAdapters,
    ) -> Result<ApolloResponse<Self::Data>> {
        tracing::trace!(operation = self.name(), "parsing JSON response");
        use_closing(reader, |reader| {
            let variables = self.boolean_variables(adapters)?;
            let adapters = adapters.with_context(adapters.context().with_variables(variables));
            response_parser::parse(self, reader, &adapters)
        })
    }

    /// [`OperationExt::parse_json_response`] from text.
    fn parse_json_response_str(
        &self,
        response: &str,
        adapters: &CustomScalarAdapters,
    ) -> Result<ApolloResponse<Self::Data>> {
        self.parse_json_response(ValueJsonReader::from_slice(response.as_bytes()), adapters)
    }

    /// [`OperationExt::parse_json_response`] from bytes.
    fn parse_json_response_slice(
        &self,
        response: &[u8],
        adapters: &CustomScalarAdapters,
    ) -> Result<ApolloResponse<Self::Data>> {
        self.parse_json_response(ValueJsonReader::from_slice(response), adapters)
    }

    /// Write a response holding `data` and nothing else, as a server would.
    ///
    /// Mostly useful to build fixtures and mock servers.
    fn compose_json_response<W: JsonWriter>(
        &self,
        writer: W,
        data: &Self::Data,
        adapters: &CustomScalarAdapters,
    ) -> Result<()> {
        tracing::trace!(operation = self.name(), "composing JSON response");
        use_closing(writer, |writer| {
            write_object(writer, |writer| {
                writer.name("data")?;
                self.adapter().to_json(writer, adapters, data)
            })?;
            writer.flush()
        })
    }

    /// [`OperationExt::compose_json_response`] into a `String`.
    fn compose_json_response_string(
        &self,
        data: &Self::Data,
        adapters: &CustomScalarAdapters,
    ) -> Result<String> {
        let mut buffer = Vec::new();
        self.compose_json_response(StreamJsonWriter::new(&mut buffer), data, adapters)?;
        into_string(buffer)
    }

    /// The variables of this operation, as they would be sent.
    ///
    /// With `with_default_boolean_values`, absent boolean variables that have
    /// a default value are included with that value.
    fn variables(
        &self,
        adapters: &CustomScalarAdapters,
        with_default_boolean_values: bool,
    ) -> Result<Object> {
        let adapters = adapters.with_context(
            adapters
                .context()
                .with_default_boolean_values(with_default_boolean_values),
        );
        let mut writer = ValueJsonWriter::new();
        write_object(&mut writer, |writer| {
            self.serialize_variables(writer, &adapters)
        })?;
        writer.close()?;
        match writer.into_value() {
            Some(Value::Object(variables)) => Ok(variables),
            _ => Err(ApolloError::encoding("variables must be a JSON object")),
        }
    }

    /// The boolean variables of this operation, defaults included.
    fn boolean_variables(&self, adapters: &CustomScalarAdapters) -> Result<BooleanVariables> {
        Ok(self
            .variables(adapters, true)?
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::Bool(value) => Some((name.as_str().to_string(), value)),
                _ => None,
            })
            .collect())
    }
}

impl<O: Operation + ?Sized> OperationExt for O {}

fn into_string(buffer: Vec<u8>) -> Result<String> {
    String::from_utf8(buffer).map_err(|error| ApolloError::encoding(error.to_string()))
}
