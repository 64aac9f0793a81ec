//! Adapters convert between JSON and Rust values.
//!
//! An [`Adapter`] is implemented once per GraphQL type: generated code
//! implements it for every operation's `Data` and for input objects, custom
//! scalars get theirs registered in [`CustomScalarAdapters`], and built-in
//! scalars use the adapters of this module, which are always available.

use std::sync::Arc;

use crate::ApolloError;
use crate::CustomScalarAdapters;
use crate::Result;
use crate::json::JsonReader;
use crate::json::JsonWriter;
use crate::json::Token;
use crate::json::read_any;
use crate::json::write_any;
use crate::json_ext::Value;

/// Converts a value of one GraphQL type from and to JSON.
///
/// `adapters` gives access to the custom scalar adapters and to the
/// [`AdapterContext`](crate::AdapterContext), e.g. the boolean variables of
/// the operation being decoded.
pub trait Adapter: Send + Sync {
    /// The Rust type this adapter produces.
    type Value;

    /// Read a value.
    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<Self::Value>;

    /// Write a value.
    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Self::Value,
    ) -> Result<()>;
}

/// Combinators available on every [`Adapter`].
pub trait AdapterExt: Adapter + Sized {
    /// Accept `null`, decoded as `None`.
    fn nullable(self) -> NullableAdapter<Self> {
        NullableAdapter(self)
    }

    /// Read and write a JSON array of values.
    fn list(self) -> ListAdapter<Self> {
        ListAdapter(self)
    }

    /// Read and write [`Optional::Present`] values.
    fn present(self) -> PresentAdapter<Self> {
        PresentAdapter(self)
    }
}

impl<A: Adapter> AdapterExt for A {}

impl<A: Adapter + ?Sized> Adapter for &A {
    type Value = A::Value;

    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<Self::Value> {
        (**self).from_json(reader, adapters)
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Self::Value,
    ) -> Result<()> {
        (**self).to_json(writer, adapters, value)
    }
}

impl<A: Adapter + ?Sized> Adapter for Arc<A> {
    type Value = A::Value;

    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<Self::Value> {
        (**self).from_json(reader, adapters)
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Self::Value,
    ) -> Result<()> {
        (**self).to_json(writer, adapters, value)
    }
}

/// GraphQL `String` and `ID`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringAdapter;

impl Adapter for StringAdapter {
    type Value = String;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<String> {
        reader.next_string()
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &String,
    ) -> Result<()> {
        writer.value_str(value)
    }
}

/// GraphQL `Int`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntAdapter;

impl Adapter for IntAdapter {
    type Value = i32;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<i32> {
        reader.next_i32()
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &i32,
    ) -> Result<()> {
        writer.value_i64(i64::from(*value))
    }
}

/// 64 bit integers, commonly used to back custom `Long` scalars.
#[derive(Clone, Copy, Debug, Default)]
pub struct LongAdapter;

impl Adapter for LongAdapter {
    type Value = i64;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<i64> {
        reader.next_i64()
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &i64,
    ) -> Result<()> {
        writer.value_i64(*value)
    }
}

/// GraphQL `Float`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatAdapter;

impl Adapter for FloatAdapter {
    type Value = f64;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<f64> {
        reader.next_f64()
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &f64,
    ) -> Result<()> {
        writer.value_f64(*value)
    }
}

/// GraphQL `Boolean`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanAdapter;

impl Adapter for BooleanAdapter {
    type Value = bool;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<bool> {
        reader.next_bool()
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &bool,
    ) -> Result<()> {
        writer.value_bool(*value)
    }
}

/// Any JSON value, left untyped. Used for scalars without a dedicated adapter
/// such as `JSON`, and for `extensions`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyAdapter;

impl Adapter for AnyAdapter {
    type Value = Value;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<Value> {
        read_any(reader)
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &Value,
    ) -> Result<()> {
        write_any(writer, value)
    }
}

/// See [`AdapterExt::nullable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NullableAdapter<A>(pub A);

impl<A: Adapter> Adapter for NullableAdapter<A> {
    type Value = Option<A::Value>;

    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<Self::Value> {
        if reader.peek()? == Token::Null {
            reader.next_null()?;
            Ok(None)
        } else {
            self.0.from_json(reader, adapters).map(Some)
        }
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Self::Value,
    ) -> Result<()> {
        match value {
            Some(value) => self.0.to_json(writer, adapters, value),
            None => writer.null_value(),
        }
    }
}

/// See [`AdapterExt::list`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ListAdapter<A>(pub A);

impl<A: Adapter> Adapter for ListAdapter<A> {
    type Value = Vec<A::Value>;

    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<Self::Value> {
        reader.begin_array()?;
        let mut items = Vec::new();
        while reader.has_next()? {
            items.push(self.0.from_json(reader, adapters)?);
        }
        reader.end_array()?;
        Ok(items)
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Self::Value,
    ) -> Result<()> {
        writer.begin_array()?;
        for item in value {
            self.0.to_json(writer, adapters, item)?;
        }
        writer.end_array()
    }
}

/// An input value that may be left out of a request.
///
/// GraphQL tells apart a variable or input field set to `null` from one that
/// is not set at all: the latter picks up its default value on the server.
/// Generated serializers skip [`Optional::Absent`] values entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Optional<T> {
    /// The value is sent.
    Present(T),
    /// The value is not sent.
    #[default]
    Absent,
}

impl<T> Optional<T> {
    /// Whether a value is present.
    pub fn is_present(&self) -> bool {
        matches!(self, Optional::Present(_))
    }

    /// The value, if present.
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Optional::Present(value) => Some(value),
            Optional::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Optional<T> {
    /// `None` is treated as absent. Use `Optional::Present(None)` to send an explicit `null`.
    fn from(value: Option<T>) -> Self {
        value.map_or(Optional::Absent, Optional::Present)
    }
}

/// See [`AdapterExt::present`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PresentAdapter<A>(pub A);

impl<A: Adapter> Adapter for PresentAdapter<A> {
    type Value = Optional<A::Value>;

    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<Self::Value> {
        self.0.from_json(reader, adapters).map(Optional::Present)
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Self::Value,
    ) -> Result<()> {
        match value {
            Optional::Present(value) => self.0.to_json(writer, adapters, value),
            Optional::Absent => Err(ApolloError::encoding(
                "cannot write an absent value, it should have been skipped",
            )),
        }
    }
}
