use crate::ApolloError;
use crate::CustomScalarAdapters;
use crate::Result;
use crate::adapter::Adapter;
use crate::adapter::NullableAdapter;
use crate::json::JsonReader;
use crate::json::Token;
use crate::json::read_any;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::operation::Operation;
use crate::response::ApolloResponse;
use crate::response::Error;

/// Read a whole response document for `operation`.
///
/// `adapters` must already be bound to the variables of the request.
pub(crate) fn parse<O>(
    operation: &O,
    reader: &mut dyn JsonReader,
    adapters: &CustomScalarAdapters,
) -> Result<ApolloResponse<O::Data>>
where
    O: Operation + ?Sized,
{
    let data_adapter = NullableAdapter(operation.adapter());
    let mut data = None;
    let mut errors = Vec::new();
    let mut extensions = Object::new();

    reader.begin_object()?;
    while reader.has_next()? {
        match reader.next_name()?.as_str() {
            "data" => data = data_adapter.from_json(reader, adapters)?,
            "errors" => errors = read_errors(reader)?,
            "extensions" => extensions = read_extensions(reader)?,
            other => {
                tracing::debug!(key = other, "skipping unknown response key");
                reader.skip_value()?;
            }
        }
    }
    reader.end_object()?;

    Ok(ApolloResponse::new(operation.name(), data)
        .with_errors(errors)
        .with_extensions(extensions))
}

fn read_errors(reader: &mut dyn JsonReader) -> Result<Vec<Error>> {
    match reader.peek()? {
        Token::Null => {
            reader.next_null()?;
            Ok(Vec::new())
        }
        Token::BeginArray => {
            let mut errors = Vec::new();
            reader.begin_array()?;
            while reader.has_next()? {
                let path = reader.path();
                match Error::from_value(read_any(reader)?) {
                    Ok(error) => errors.push(error),
                    Err(reason) => {
                        tracing::warn!(%path, reason, "skipping malformed GraphQL error");
                    }
                }
            }
            reader.end_array()?;
            Ok(errors)
        }
        token => Err(ApolloError::data(
            reader.path(),
            format!("expected an array of errors but was {token}"),
        )),
    }
}

fn read_extensions(reader: &mut dyn JsonReader) -> Result<Object> {
    match read_any(reader)? {
        Value::Null => Ok(Object::new()),
        Value::Object(extensions) => Ok(extensions),
        _ => Err(ApolloError::data(
            reader.path(),
            "expected an object of extensions",
        )),
    }
}
