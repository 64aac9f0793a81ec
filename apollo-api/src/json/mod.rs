//! Push-style JSON writing and pull-style JSON reading.
//!
//! The codec never sees JSON text directly: requests are streamed into a
//! [`JsonWriter`] and responses are pulled token by token out of a
//! [`JsonReader`]. Tokenizing itself is left to `serde_json`.

use std::fmt;

use scopeguard::ScopeGuard;
use serde_json_bytes::ByteString;

use crate::ApolloError;
use crate::Result;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;

mod reader;
mod value_writer;
mod writer;

pub use reader::ValueJsonReader;
pub use value_writer::ValueJsonWriter;
pub use writer::StreamJsonWriter;

/// The kind of the next token available from a [`JsonReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// The opening of a JSON object.
    BeginObject,
    /// The end of a JSON object.
    EndObject,
    /// The opening of a JSON array.
    BeginArray,
    /// The end of a JSON array.
    EndArray,
    /// The name of an object member.
    Name,
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
    /// The end of the document.
    EndDocument,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Token::BeginObject => "BEGIN_OBJECT",
            Token::EndObject => "END_OBJECT",
            Token::BeginArray => "BEGIN_ARRAY",
            Token::EndArray => "END_ARRAY",
            Token::Name => "NAME",
            Token::String => "STRING",
            Token::Number => "NUMBER",
            Token::Boolean => "BOOLEAN",
            Token::Null => "NULL",
            Token::EndDocument => "END_DOCUMENT",
        })
    }
}

/// Releases the resource behind a reader or a writer.
///
/// Compose and parse entry points take ownership of their reader or writer
/// and call `close` exactly once before returning, whether they succeed or not.
pub trait Close {
    /// Release the underlying resource. Any further use fails.
    fn close(&mut self) -> Result<()>;
}

/// A push-style JSON writer.
///
/// Calls must describe a single well-formed JSON value: implementations reject
/// a `name` outside of an object, a value where a name is expected, and so on.
pub trait JsonWriter: Close {
    /// Open a JSON object.
    fn begin_object(&mut self) -> Result<()>;

    /// Close the current JSON object.
    fn end_object(&mut self) -> Result<()>;

    /// Open a JSON array.
    fn begin_array(&mut self) -> Result<()>;

    /// Close the current JSON array.
    fn end_array(&mut self) -> Result<()>;

    /// Write the name of the next member of the current object.
    fn name(&mut self, name: &str) -> Result<()>;

    /// Write a string.
    fn value_str(&mut self, value: &str) -> Result<()>;

    /// Write a boolean.
    fn value_bool(&mut self, value: bool) -> Result<()>;

    /// Write an integer.
    fn value_i64(&mut self, value: i64) -> Result<()>;

    /// Write a floating point number.
    ///
    /// JSON has no representation for NaN or infinities; writing one fails
    /// with [`ApolloError::JsonEncoding`].
    fn value_f64(&mut self, value: f64) -> Result<()>;

    /// Write an already parsed JSON number verbatim.
    fn value_number(&mut self, value: &serde_json::Number) -> Result<()>;

    /// Write `null`.
    fn null_value(&mut self) -> Result<()>;

    /// Flush buffered output to the underlying sink.
    fn flush(&mut self) -> Result<()>;
}

/// A pull-style JSON reader.
pub trait JsonReader: Close {
    /// The kind of the next token, without consuming it.
    fn peek(&mut self) -> Result<Token>;

    /// Consume the opening of a JSON object.
    fn begin_object(&mut self) -> Result<()>;

    /// Consume the end of the current JSON object.
    fn end_object(&mut self) -> Result<()>;

    /// Consume the opening of a JSON array.
    fn begin_array(&mut self) -> Result<()>;

    /// Consume the end of the current JSON array.
    fn end_array(&mut self) -> Result<()>;

    /// Whether the current object or array has more elements.
    fn has_next(&mut self) -> Result<bool>;

    /// Consume the name of the next object member.
    fn next_name(&mut self) -> Result<String>;

    /// Consume a string. Numbers are accepted and returned in their textual form.
    fn next_string(&mut self) -> Result<String>;

    /// Consume a boolean.
    fn next_bool(&mut self) -> Result<bool>;

    /// Consume a `null`.
    fn next_null(&mut self) -> Result<()>;

    /// Consume a number that fits in an `i32`.
    fn next_i32(&mut self) -> Result<i32>;

    /// Consume a number that fits in an `i64`.
    fn next_i64(&mut self) -> Result<i64>;

    /// Consume any number as an `f64`.
    fn next_f64(&mut self) -> Result<f64>;

    /// Consume a number without converting it.
    fn next_number(&mut self) -> Result<serde_json::Number>;

    /// Skip the next value, including all of its children.
    fn skip_value(&mut self) -> Result<()>;

    /// The path of the value the reader is positioned on.
    fn path(&self) -> Path;

    /// Consume names until one of `names` is found and return its index.
    ///
    /// Members with other names are skipped along with their values. Returns
    /// `None` once the current object has no more members.
    fn select_name(&mut self, names: &[&str]) -> Result<Option<usize>> {
        while self.has_next()? {
            let name = self.next_name()?;
            match names.iter().position(|candidate| *candidate == name) {
                Some(index) => return Ok(Some(index)),
                None => self.skip_value()?,
            }
        }
        Ok(None)
    }
}

/// Write `body` inside a JSON object.
pub fn write_object<W>(writer: &mut W, body: impl FnOnce(&mut W) -> Result<()>) -> Result<()>
where
    W: JsonWriter + ?Sized,
{
    writer.begin_object()?;
    body(writer)?;
    writer.end_object()
}

/// Write an arbitrary JSON value.
pub fn write_any(writer: &mut dyn JsonWriter, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer.null_value(),
        Value::Bool(b) => writer.value_bool(*b),
        Value::Number(n) => writer.value_number(n),
        Value::String(s) => writer.value_str(s.as_str()),
        Value::Array(items) => {
            writer.begin_array()?;
            for item in items {
                write_any(writer, item)?;
            }
            writer.end_array()
        }
        Value::Object(object) => {
            writer.begin_object()?;
            for (key, value) in object.iter() {
                writer.name(key.as_str())?;
                write_any(writer, value)?;
            }
            writer.end_object()
        }
    }
}

/// Read the next value, whatever its shape.
pub fn read_any(reader: &mut dyn JsonReader) -> Result<Value> {
    Ok(match reader.peek()? {
        Token::BeginObject => {
            reader.begin_object()?;
            let mut object = Object::new();
            while reader.has_next()? {
                let name = reader.next_name()?;
                object.insert(ByteString::from(name), read_any(reader)?);
            }
            reader.end_object()?;
            Value::Object(object)
        }
        Token::BeginArray => {
            reader.begin_array()?;
            let mut items = Vec::new();
            while reader.has_next()? {
                items.push(read_any(reader)?);
            }
            reader.end_array()?;
            Value::Array(items)
        }
        Token::String => Value::String(reader.next_string()?.into()),
        Token::Number => Value::Number(reader.next_number()?),
        Token::Boolean => Value::Bool(reader.next_bool()?),
        Token::Null => {
            reader.next_null()?;
            Value::Null
        }
        token @ (Token::EndObject | Token::EndArray | Token::Name | Token::EndDocument) => {
            return Err(ApolloError::data(
                reader.path(),
                format!("expected a value but was {token}"),
            ));
        }
    })
}

/// Run `body` with exclusive use of `resource`, then close it.
///
/// The resource is closed exactly once on every path out of `body`, including
/// early returns through `?` and unwinding. When both `body` and `close` fail,
/// the error from `body` wins.
pub(crate) fn use_closing<C, T>(resource: C, body: impl FnOnce(&mut C) -> Result<T>) -> Result<T>
where
    C: Close,
{
    let mut guard = scopeguard::guard(resource, |mut resource| {
        // only reached while unwinding
        let _ = resource.close();
    });
    let result = body(&mut *guard);
    let mut resource = ScopeGuard::into_inner(guard);
    let closed = resource.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) => Err(error),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(close_error)) => {
            tracing::debug!(%close_error, "failed to close after an error");
            Err(error)
        }
    }
}
