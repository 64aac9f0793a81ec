use std::io;
use std::io::Read;
use std::iter::Peekable;
use std::vec;

use bytes::Bytes;
use serde_json_bytes::ByteString;

use super::Close;
use super::JsonReader;
use super::Token;
use crate::ApolloError;
use crate::Result;
use crate::json_ext::Path;
use crate::json_ext::PathElement;
use crate::json_ext::Value;

/// Input that has not been parsed yet.
enum Source {
    Read(Box<dyn Read + Send>),
    Bytes(Bytes),
}

enum Frame {
    Object {
        members: Peekable<vec::IntoIter<(ByteString, Value)>>,
        /// Value of the member whose name was just read.
        value: Option<Value>,
        name: Option<ByteString>,
    },
    Array {
        items: Peekable<vec::IntoIter<Value>>,
        taken: usize,
    },
}

/// A [`JsonReader`] over a document parsed with `serde_json`.
///
/// The source is only read and parsed on first use, so that I/O and syntax
/// errors surface from the call consuming the reader. Invalid JSON is
/// reported as [`ApolloError::JsonEncoding`]; a token of the wrong kind is
/// reported as [`ApolloError::JsonData`] along with its path.
pub struct ValueJsonReader {
    source: Option<Source>,
    root: Option<Value>,
    stack: Vec<Frame>,
    closed: bool,
}

impl ValueJsonReader {
    /// Read the document from `source`.
    pub fn from_reader<R>(source: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::pending(Source::Read(Box::new(source)))
    }

    /// Read the document from `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::pending(Source::Bytes(bytes.into()))
    }

    /// Read the document from a slice, copying it.
    pub fn from_slice(slice: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(slice))
    }

    /// Read an already parsed document.
    pub fn from_value(value: Value) -> Self {
        Self {
            source: None,
            root: Some(value),
            stack: Vec::new(),
            closed: false,
        }
    }

    fn pending(source: Source) -> Self {
        Self {
            source: Some(source),
            root: None,
            stack: Vec::new(),
            closed: false,
        }
    }

    fn load(&mut self) -> Result<()> {
        if self.closed {
            return Err(io::Error::other("JSON reader is closed").into());
        }
        let bytes = match self.source.take() {
            None => return Ok(()),
            Some(Source::Bytes(bytes)) => bytes,
            Some(Source::Read(mut read)) => {
                let mut buffer = Vec::new();
                read.read_to_end(&mut buffer)?;
                Bytes::from(buffer)
            }
        };
        self.root = Some(Value::from_bytes(bytes)?);
        Ok(())
    }

    fn unexpected(&self, expected: &str, actual: Token) -> ApolloError {
        ApolloError::data(self.path(), format!("expected {expected} but was {actual}"))
    }

    /// Take the value the reader is positioned on, which must be of kind `expected`.
    fn take(&mut self, expected: Token) -> Result<Value> {
        let actual = self.peek()?;
        if actual != expected {
            return Err(self.unexpected(&expected.to_string(), actual));
        }
        self.take_any()
    }

    fn take_any(&mut self) -> Result<Value> {
        let value = match self.stack.last_mut() {
            None => self.root.take(),
            Some(Frame::Object { value, .. }) => value.take(),
            Some(Frame::Array { items, taken }) => {
                let item = items.next();
                if item.is_some() {
                    *taken += 1;
                }
                item
            }
        };
        value.ok_or_else(|| ApolloError::data(self.path(), "expected a value"))
    }

    fn take_number(&mut self, expected: &str) -> Result<(Path, serde_json::Number)> {
        let actual = self.peek()?;
        if actual != Token::Number {
            return Err(self.unexpected(expected, actual));
        }
        let path = self.path();
        match self.take_any()? {
            Value::Number(number) => Ok((path, number)),
            _ => Err(ApolloError::data(path, format!("expected {expected}"))),
        }
    }
}

fn token_of(value: &Value) -> Token {
    match value {
        Value::Null => Token::Null,
        Value::Bool(_) => Token::Boolean,
        Value::Number(_) => Token::Number,
        Value::String(_) => Token::String,
        Value::Array(_) => Token::BeginArray,
        Value::Object(_) => Token::BeginObject,
    }
}

// 2^63, the first float past `i64::MAX`: `i64::MAX as f64` rounds up to it
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn integral(number: &serde_json::Number) -> Option<i64> {
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    // too large for i64
    if number.is_u64() {
        return None;
    }
    number
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < I64_UPPER_BOUND)
        .map(|f| f as i64)
}

impl Close for ValueJsonReader {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.source = None;
        self.root = None;
        self.stack.clear();
        Ok(())
    }
}

impl JsonReader for ValueJsonReader {
    fn peek(&mut self) -> Result<Token> {
        self.load()?;
        Ok(match self.stack.last_mut() {
            None => self.root.as_ref().map_or(Token::EndDocument, token_of),
            Some(Frame::Object { members, value, .. }) => match value {
                Some(value) => token_of(value),
                None => {
                    if members.peek().is_some() {
                        Token::Name
                    } else {
                        Token::EndObject
                    }
                }
            },
            Some(Frame::Array { items, .. }) => items.peek().map_or(Token::EndArray, token_of),
        })
    }

    fn begin_object(&mut self) -> Result<()> {
        match self.take(Token::BeginObject)? {
            Value::Object(object) => {
                self.stack.push(Frame::Object {
                    members: object.into_iter().collect::<Vec<_>>().into_iter().peekable(),
                    value: None,
                    name: None,
                });
                Ok(())
            }
            _ => Err(ApolloError::data(self.path(), "expected BEGIN_OBJECT")),
        }
    }

    fn end_object(&mut self) -> Result<()> {
        let actual = self.peek()?;
        if actual != Token::EndObject {
            return Err(self.unexpected("END_OBJECT", actual));
        }
        self.stack.pop();
        Ok(())
    }

    fn begin_array(&mut self) -> Result<()> {
        match self.take(Token::BeginArray)? {
            Value::Array(items) => {
                self.stack.push(Frame::Array {
                    items: items.into_iter().peekable(),
                    taken: 0,
                });
                Ok(())
            }
            _ => Err(ApolloError::data(self.path(), "expected BEGIN_ARRAY")),
        }
    }

    fn end_array(&mut self) -> Result<()> {
        let actual = self.peek()?;
        if actual != Token::EndArray {
            return Err(self.unexpected("END_ARRAY", actual));
        }
        self.stack.pop();
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(!matches!(
            self.peek()?,
            Token::EndObject | Token::EndArray | Token::EndDocument
        ))
    }

    fn next_name(&mut self) -> Result<String> {
        let actual = self.peek()?;
        if actual != Token::Name {
            return Err(self.unexpected("NAME", actual));
        }
        if let Some(Frame::Object {
            members,
            value,
            name,
        }) = self.stack.last_mut()
        {
            if let Some((key, member)) = members.next() {
                let result = key.as_str().to_string();
                *name = Some(key);
                *value = Some(member);
                return Ok(result);
            }
        }
        Err(ApolloError::data(self.path(), "expected NAME"))
    }

    fn next_string(&mut self) -> Result<String> {
        let actual = self.peek()?;
        match actual {
            Token::String => match self.take_any()? {
                Value::String(s) => Ok(s.as_str().to_string()),
                _ => Err(self.unexpected("a String", actual)),
            },
            Token::Number => Ok(self.next_number()?.to_string()),
            _ => Err(self.unexpected("a String", actual)),
        }
    }

    fn next_bool(&mut self) -> Result<bool> {
        let actual = self.peek()?;
        if actual != Token::Boolean {
            return Err(self.unexpected("a Boolean", actual));
        }
        match self.take_any()? {
            Value::Bool(b) => Ok(b),
            _ => Err(self.unexpected("a Boolean", actual)),
        }
    }

    fn next_null(&mut self) -> Result<()> {
        self.take(Token::Null).map(|_| ())
    }

    fn next_i32(&mut self) -> Result<i32> {
        let (path, number) = self.take_number("an Int")?;
        integral(&number)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| ApolloError::data(path, format!("expected an Int but was {number}")))
    }

    fn next_i64(&mut self) -> Result<i64> {
        let (path, number) = self.take_number("a Long")?;
        integral(&number)
            .ok_or_else(|| ApolloError::data(path, format!("expected a Long but was {number}")))
    }

    fn next_f64(&mut self) -> Result<f64> {
        let (path, number) = self.take_number("a Float")?;
        number
            .as_f64()
            .ok_or_else(|| ApolloError::data(path, format!("expected a Float but was {number}")))
    }

    fn next_number(&mut self) -> Result<serde_json::Number> {
        self.take_number("a Number").map(|(_, number)| number)
    }

    fn skip_value(&mut self) -> Result<()> {
        match self.peek()? {
            Token::Name => {
                self.next_name()?;
                self.take_any().map(|_| ())
            }
            actual @ (Token::EndObject | Token::EndArray | Token::EndDocument) => {
                Err(self.unexpected("a value", actual))
            }
            _ => self.take_any().map(|_| ()),
        }
    }

    fn path(&self) -> Path {
        let top = self.stack.len().saturating_sub(1);
        self.stack
            .iter()
            .enumerate()
            .filter_map(|(depth, frame)| match frame {
                Frame::Object { name, .. } => name
                    .as_ref()
                    .map(|name| PathElement::Key(name.as_str().to_string())),
                // the top frame points at the next item, the others at the item being read
                Frame::Array { taken, .. } if depth == top => Some(PathElement::Index(*taken)),
                Frame::Array { taken, .. } => Some(PathElement::Index(taken.saturating_sub(1))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json as bjson;
    use test_log::test;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn pulls_tokens() {
        let mut reader =
            ValueJsonReader::from_slice(br#"{"hero": {"name": "R2-D2", "ids": [1, 2.5]}}"#);
        assert_eq!(reader.peek().unwrap(), Token::BeginObject);
        reader.begin_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "hero");
        reader.begin_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "name");
        assert_eq!(reader.next_string().unwrap(), "R2-D2");
        assert_eq!(reader.next_name().unwrap(), "ids");
        reader.begin_array().unwrap();
        assert_eq!(reader.next_i32().unwrap(), 1);
        assert_eq!(reader.next_f64().unwrap(), 2.5);
        assert!(!reader.has_next().unwrap());
        reader.end_array().unwrap();
        reader.end_object().unwrap();
        reader.end_object().unwrap();
        assert_eq!(reader.peek().unwrap(), Token::EndDocument);
    }

    #[test]
    fn type_mismatches_carry_the_path() {
        let mut reader = ValueJsonReader::from_value(bjson!({
            "hero": {"friends": [{"age": 3}, {"age": "three"}]}
        }));
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        reader.begin_array().unwrap();
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        assert_eq!(reader.next_i32().unwrap(), 3);
        reader.end_object().unwrap();
        reader.begin_object().unwrap();
        reader.next_name().unwrap();

        let error = reader.next_i32().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DataShape);
        assert_eq!(
            error.to_string(),
            "unexpected JSON at 'hero/friends/1/age': expected an Int but was STRING"
        );
    }

    #[test]
    fn numbers_are_range_checked() {
        let mut reader = ValueJsonReader::from_value(bjson!([3000000000_i64, 2.0, 2.5]));
        reader.begin_array().unwrap();
        let error = reader.next_i32().unwrap_err();
        assert_eq!(
            error.to_string(),
            "unexpected JSON at '0': expected an Int but was 3000000000"
        );
        assert_eq!(reader.next_i64().unwrap(), 2);
        assert!(reader.next_i64().is_err());
    }

    #[test]
    fn longs_past_i64_max_are_rejected() {
        for json in [
            "9223372036854775808",
            "9223372036854775900",
            "18446744073709551615",
            "9223372036854775808.0",
            "-9223372036854777856.0",
        ] {
            let mut reader = ValueJsonReader::from_slice(json.as_bytes());
            let error = reader.next_i64().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::DataShape, "{json}");
        }

        let mut reader = ValueJsonReader::from_slice(
            b"[9223372036854775807, -9223372036854775808, -9223372036854775808.0]",
        );
        reader.begin_array().unwrap();
        assert_eq!(reader.next_i64().unwrap(), i64::MAX);
        assert_eq!(reader.next_i64().unwrap(), i64::MIN);
        assert_eq!(reader.next_i64().unwrap(), i64::MIN);
    }

    #[test]
    fn strings_accept_numbers() {
        let mut reader = ValueJsonReader::from_value(bjson!([1002, "1003", true]));
        reader.begin_array().unwrap();
        assert_eq!(reader.next_string().unwrap(), "1002");
        assert_eq!(reader.next_string().unwrap(), "1003");
        assert_eq!(reader.next_string().unwrap_err().kind(), ErrorKind::DataShape);
    }

    #[test]
    fn select_name_skips_unknown_members() {
        let mut reader = ValueJsonReader::from_value(bjson!({
            "__typename": "Droid",
            "unknown": {"nested": [1, 2, 3]},
            "name": "R2-D2"
        }));
        reader.begin_object().unwrap();
        let names = ["name", "__typename"];
        assert_eq!(reader.select_name(&names).unwrap(), Some(1));
        assert_eq!(reader.next_string().unwrap(), "Droid");
        assert_eq!(reader.select_name(&names).unwrap(), Some(0));
        assert_eq!(reader.next_string().unwrap(), "R2-D2");
        assert_eq!(reader.select_name(&names).unwrap(), None);
        reader.end_object().unwrap();
    }

    #[test]
    fn malformed_json_is_an_encoding_error() {
        for json in ["{\"data\": }", "{\"data\": {\"ping\": \"pong\"}", "nope", ""] {
            let mut reader = ValueJsonReader::from_slice(json.as_bytes());
            let error = reader.peek().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MalformedJson, "{json}");
        }
    }

    #[test]
    fn unsupported_json_is_an_encoding_error() {
        let nested = format!("{}{}", "[".repeat(200), "]".repeat(200));
        for json in [nested.as_str(), "{\"data\": 1e400}"] {
            let mut reader = ValueJsonReader::from_slice(json.as_bytes());
            let error = reader.peek().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MalformedJson);
        }
    }

    #[test]
    fn read_failures_are_io_errors() {
        struct Disconnected;
        impl Read for Disconnected {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset",
                ))
            }
        }

        let mut reader = ValueJsonReader::from_reader(Disconnected);
        assert_eq!(reader.peek().unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn closed_readers_cannot_be_read() {
        let mut reader = ValueJsonReader::from_slice(b"{}");
        reader.close().unwrap();
        assert_eq!(reader.peek().unwrap_err().kind(), ErrorKind::Io);
    }
}
