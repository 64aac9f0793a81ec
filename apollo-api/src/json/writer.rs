use std::io;
use std::io::Write;

use super::Close;
use super::JsonWriter;
use crate::ApolloError;
use crate::Result;

/// Where the writer is in the document, used to place separators and to
/// reject calls that would produce invalid JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    EmptyDocument,
    NonEmptyDocument,
    EmptyObject,
    NonEmptyObject,
    DanglingName,
    EmptyArray,
    NonEmptyArray,
}

/// A [`JsonWriter`] streaming JSON text to an [`io::Write`].
///
/// Every call writes through to the sink right away; nothing is buffered
/// beyond what the sink itself buffers. Wrap slow sinks in an
/// [`io::BufWriter`].
pub struct StreamJsonWriter<W: Write> {
    sink: W,
    stack: Vec<Scope>,
    indent: Option<String>,
    closed: bool,
}

impl<W: Write> StreamJsonWriter<W> {
    /// Create a writer producing compact JSON.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            stack: vec![Scope::EmptyDocument],
            indent: None,
            closed: false,
        }
    }

    /// Pretty print the output, using `indent` for each nesting level.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        let indent = indent.into();
        self.indent = (!indent.is_empty()).then_some(indent);
        self
    }

    /// Get back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn write(&mut self, s: &str) -> Result<()> {
        self.write_buf(s.as_bytes())
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        if self.closed {
            return Err(io::Error::other("JSON writer is closed").into());
        }
        self.sink.write_all(buf)?;
        Ok(())
    }

    fn top(&self) -> Result<Scope> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| ApolloError::encoding("JSON writer is closed"))
    }

    fn replace_top(&mut self, scope: Scope) {
        if let Some(top) = self.stack.last_mut() {
            *top = scope;
        }
    }

    fn newline(&mut self) -> Result<()> {
        let Some(indent) = self.indent.clone() else {
            return Ok(());
        };
        self.write("\n")?;
        for _ in 1..self.stack.len() {
            self.write(&indent)?;
        }
        Ok(())
    }

    /// Place the separator expected before a value and update the scope.
    fn before_value(&mut self) -> Result<()> {
        match self.top()? {
            Scope::EmptyDocument => {
                self.replace_top(Scope::NonEmptyDocument);
                Ok(())
            }
            Scope::NonEmptyDocument => Err(ApolloError::encoding(
                "JSON must have only one top-level value",
            )),
            Scope::EmptyArray => {
                self.replace_top(Scope::NonEmptyArray);
                self.newline()
            }
            Scope::NonEmptyArray => {
                self.write(",")?;
                self.newline()
            }
            Scope::DanglingName => {
                self.replace_top(Scope::NonEmptyObject);
                if self.indent.is_some() {
                    self.write(": ")
                } else {
                    self.write(":")
                }
            }
            Scope::EmptyObject | Scope::NonEmptyObject => Err(ApolloError::encoding(
                "nesting problem: expected a name but was a value",
            )),
        }
    }

    fn open(&mut self, empty: Scope, bracket: &str) -> Result<()> {
        self.before_value()?;
        self.stack.push(empty);
        self.write(bracket)
    }

    fn close_scope(&mut self, empty: Scope, non_empty: Scope, bracket: &str) -> Result<()> {
        let top = self.top()?;
        if top == Scope::DanglingName {
            return Err(ApolloError::encoding("dangling name"));
        }
        if top != empty && top != non_empty {
            return Err(ApolloError::encoding(format!(
                "nesting problem: cannot write '{bracket}' here"
            )));
        }
        self.stack.pop();
        if top == non_empty {
            self.newline()?;
        }
        self.write(bracket)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write("\"")?;

        let bytes = value.as_bytes();
        let mut start = 0;

        for (i, &byte) in bytes.iter().enumerate() {
            let escape = ESCAPE[byte as usize];
            if escape == 0 {
                continue;
            }

            if start < i {
                self.write_buf(&bytes[start..i])?;
            }
            self.write_escape(escape, byte)?;
            start = i + 1;
        }

        if start != bytes.len() {
            self.write_buf(&bytes[start..])?;
        }

        self.write("\"")
    }

    fn write_escape(&mut self, escape: u8, byte: u8) -> Result<()> {
        static HEX_DIGITS: [u8; 16] = *b"0123456789abcdef";
        match escape {
            UU => self.write_buf(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX_DIGITS[(byte >> 4) as usize],
                HEX_DIGITS[(byte & 0xF) as usize],
            ]),
            escape => self.write_buf(&[b'\\', escape]),
        }
    }
}

impl<W: Write> Close for StreamJsonWriter<W> {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let complete = self.stack.as_slice() == [Scope::NonEmptyDocument];
        let flushed = self.sink.flush();
        self.closed = true;
        self.stack.clear();
        flushed?;
        if complete {
            Ok(())
        } else {
            Err(ApolloError::encoding("incomplete document"))
        }
    }
}

impl<W: Write> JsonWriter for StreamJsonWriter<W> {
    fn begin_object(&mut self) -> Result<()> {
        self.open(Scope::EmptyObject, "{")
    }

    fn end_object(&mut self) -> Result<()> {
        self.close_scope(Scope::EmptyObject, Scope::NonEmptyObject, "}")
    }

    fn begin_array(&mut self) -> Result<()> {
        self.open(Scope::EmptyArray, "[")
    }

    fn end_array(&mut self) -> Result<()> {
        self.close_scope(Scope::EmptyArray, Scope::NonEmptyArray, "]")
    }

    fn name(&mut self, name: &str) -> Result<()> {
        match self.top()? {
            Scope::NonEmptyObject => {
                self.write(",")?;
                self.newline()?;
            }
            Scope::EmptyObject => self.newline()?,
            _ => {
                return Err(ApolloError::encoding(format!(
                    "nesting problem: cannot write name '{name}' outside of an object"
                )));
            }
        }
        self.replace_top(Scope::DanglingName);
        self.write_string(name)
    }

    fn value_str(&mut self, value: &str) -> Result<()> {
        self.before_value()?;
        self.write_string(value)
    }

    fn value_bool(&mut self, value: bool) -> Result<()> {
        self.before_value()?;
        if value {
            self.write("true")
        } else {
            self.write("false")
        }
    }

    fn value_i64(&mut self, value: i64) -> Result<()> {
        self.before_value()?;
        let mut buffer = itoa::Buffer::new();
        let s = buffer.format(value);
        self.write(s)
    }

    fn value_f64(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(ApolloError::encoding(format!(
                "numeric values must be finite, but was {value}"
            )));
        }
        self.before_value()?;
        let mut buffer = ryu::Buffer::new();
        let s = buffer.format_finite(value);
        self.write(s)
    }

    fn value_number(&mut self, value: &serde_json::Number) -> Result<()> {
        self.before_value()?;
        self.write(&value.to_string())
    }

    fn null_value(&mut self) -> Result<()> {
        self.before_value()?;
        self.write("null")
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

const BB: u8 = b'b'; // \x08
const TT: u8 = b't'; // \x09
const NN: u8 = b'n'; // \x0A
const FF: u8 = b'f'; // \x0C
const RR: u8 = b'r'; // \x0D
const QU: u8 = b'"'; // \x22
const BS: u8 = b'\\'; // \x5C
const UU: u8 = b'u'; // \x00...\x1F except the ones above
const __: u8 = 0;

// Lookup table of escape sequences. A value of b'x' at index i means that byte
// i is escaped as "\x" in JSON. A value of 0 means that byte i is not escaped.
static ESCAPE: [u8; 256] = [
    //   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    UU, UU, UU, UU, UU, UU, UU, UU, BB, TT, NN, UU, FF, RR, UU, UU, // 0
    UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, // 1
    __, __, QU, __, __, __, __, __, __, __, __, __, __, __, __, __, // 2
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 3
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 4
    __, __, __, __, __, __, __, __, __, __, __, __, BS, __, __, __, // 5
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 6
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 7
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 8
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 9
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // A
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // B
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // C
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // D
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // E
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // F
];
