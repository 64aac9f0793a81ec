use serde_json_bytes::ByteString;

use super::Close;
use super::JsonWriter;
use crate::ApolloError;
use crate::Result;
use crate::json_ext::Object;
use crate::json_ext::Value;

enum Frame {
    Object {
        object: Object,
        name: Option<ByteString>,
    },
    Array(Vec<Value>),
}

/// A [`JsonWriter`] building a [`Value`] in memory.
///
/// Used to look at the variables of an operation as data, for instance to
/// find which of them are booleans.
#[derive(Default)]
pub struct ValueJsonWriter {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl ValueJsonWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value written so far, if it is complete.
    pub fn into_value(self) -> Option<Value> {
        if self.stack.is_empty() {
            self.root
        } else {
            None
        }
    }

    fn push_value(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            None if self.root.is_some() => Err(ApolloError::encoding(
                "JSON must have only one top-level value",
            )),
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Object { object, name }) => match name.take() {
                Some(name) => {
                    object.insert(name, value);
                    Ok(())
                }
                None => Err(ApolloError::encoding(
                    "nesting problem: expected a name but was a value",
                )),
            },
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
        }
    }
}

impl Close for ValueJsonWriter {
    fn close(&mut self) -> Result<()> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(ApolloError::encoding("incomplete document"))
        }
    }
}

impl JsonWriter for ValueJsonWriter {
    fn begin_object(&mut self) -> Result<()> {
        if let Some(Frame::Object { name: None, .. }) = self.stack.last() {
            return Err(ApolloError::encoding(
                "nesting problem: expected a name but was a value",
            ));
        }
        self.stack.push(Frame::Object {
            object: Object::new(),
            name: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Object { object, name: None }) => self.push_value(Value::Object(object)),
            Some(Frame::Object { .. }) => Err(ApolloError::encoding("dangling name")),
            Some(frame @ Frame::Array(_)) => {
                self.stack.push(frame);
                Err(ApolloError::encoding(
                    "nesting problem: cannot end an object inside an array",
                ))
            }
            None => Err(ApolloError::encoding("nesting problem: no open object")),
        }
    }

    fn begin_array(&mut self) -> Result<()> {
        if let Some(Frame::Object { name: None, .. }) = self.stack.last() {
            return Err(ApolloError::encoding(
                "nesting problem: expected a name but was a value",
            ));
        }
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
            Some(frame @ Frame::Object { .. }) => {
                self.stack.push(frame);
                Err(ApolloError::encoding(
                    "nesting problem: cannot end an array inside an object",
                ))
            }
            None => Err(ApolloError::encoding("nesting problem: no open array")),
        }
    }

    fn name(&mut self, name: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Object {
                name: pending @ None,
                ..
            }) => {
                *pending = Some(ByteString::from(name));
                Ok(())
            }
            _ => Err(ApolloError::encoding(format!(
                "nesting problem: cannot write name '{name}' here"
            ))),
        }
    }

    fn value_str(&mut self, value: &str) -> Result<()> {
        self.push_value(Value::String(ByteString::from(value)))
    }

    fn value_bool(&mut self, value: bool) -> Result<()> {
        self.push_value(Value::Bool(value))
    }

    fn value_i64(&mut self, value: i64) -> Result<()> {
        self.push_value(Value::Number(value.into()))
    }

    fn value_f64(&mut self, value: f64) -> Result<()> {
        let number = serde_json::Number::from_f64(value).ok_or_else(|| {
            ApolloError::encoding(format!("numeric values must be finite, but was {value}"))
        })?;
        self.push_value(Value::Number(number))
    }

    fn value_number(&mut self, value: &serde_json::Number) -> Result<()> {
        self.push_value(Value::Number(value.clone()))
    }

    fn null_value(&mut self) -> Result<()> {
        self.push_value(Value::Null)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
