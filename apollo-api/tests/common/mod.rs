//! Operations written the way generated code would write them, and
//! reader/writer wrappers counting how many times they are closed.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use apollo_api::ApolloError;
use apollo_api::BooleanExpression;
use apollo_api::CustomScalarAdapters;
use apollo_api::CustomScalarType;
use apollo_api::Operation;
use apollo_api::OperationType;
use apollo_api::Optional;
use apollo_api::Result;
use apollo_api::adapter::Adapter;
use apollo_api::adapter::AdapterExt;
use apollo_api::adapter::StringAdapter;
use apollo_api::json::Close;
use apollo_api::json::JsonReader;
use apollo_api::json::JsonWriter;
use apollo_api::json::Token;
use apollo_api::json_ext::Path;

pub const DATE: CustomScalarType = CustomScalarType::new("Date");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Maps `Date` to and from `YYYY-MM-DD`.
pub struct DateAdapter;

impl Adapter for DateAdapter {
    type Value = Date;

    fn from_json(&self, reader: &mut dyn JsonReader, _: &CustomScalarAdapters) -> Result<Date> {
        let path = reader.path();
        let text = reader.next_string()?;
        let mut parts = text.splitn(3, '-');
        let mut next = || parts.next().and_then(|part| part.parse::<u16>().ok());
        match (next(), next(), next()) {
            (Some(year), Some(month), Some(day)) if month <= 12 && day <= 31 => Ok(Date {
                year,
                month: month as u8,
                day: day as u8,
            }),
            _ => Err(ApolloError::data(path, format!("invalid Date '{text}'"))),
        }
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        _: &CustomScalarAdapters,
        value: &Date,
    ) -> Result<()> {
        writer.value_str(&format!(
            "{:04}-{:02}-{:02}",
            value.year, value.month, value.day
        ))
    }
}

pub fn star_wars_adapters() -> CustomScalarAdapters {
    CustomScalarAdapters::builder().add(DATE, DateAdapter).build()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Episode {
    NewHope,
    Empire,
    Jedi,
}

impl Episode {
    fn as_str(&self) -> &'static str {
        match self {
            Episode::NewHope => "NEWHOPE",
            Episode::Empire => "EMPIRE",
            Episode::Jedi => "JEDI",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeroData {
    pub hero: Option<Hero>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hero {
    pub name: String,
    pub birthday: Option<Date>,
    /// `None` when skipped with `withFriends: false`.
    pub friends: Option<Vec<Friend>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Friend {
    pub name: String,
}

/// ```graphql
/// query Hero($episode: Episode, $withFriends: Boolean!, $since: Date) {
///   hero(episode: $episode, since: $since) {
///     name
///     birthday
///     friends @include(if: $withFriends) { name }
///   }
/// }
/// ```
pub struct HeroQuery {
    pub episode: Optional<Episode>,
    pub with_friends: bool,
    pub since: Optional<Option<Date>>,
}

impl HeroQuery {
    pub fn new(with_friends: bool) -> Self {
        Self {
            episode: Optional::Absent,
            with_friends,
            since: Optional::Absent,
        }
    }
}

pub const HERO_DOCUMENT: &str = "query Hero($episode: Episode, $withFriends: Boolean!, $since: Date) { hero(episode: $episode, since: $since) { name birthday friends @include(if: $withFriends) { name } } }";

impl Operation for HeroQuery {
    type Data = HeroData;

    fn name(&self) -> &str {
        "Hero"
    }

    fn document(&self) -> &str {
        HERO_DOCUMENT
    }

    fn operation_type(&self) -> OperationType {
        OperationType::Query
    }

    fn serialize_variables(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
    ) -> Result<()> {
        if let Optional::Present(episode) = &self.episode {
            writer.name("episode")?;
            writer.value_str(episode.as_str())?;
        }
        writer.name("withFriends")?;
        writer.value_bool(self.with_friends)?;
        if let Optional::Present(since) = &self.since {
            writer.name("since")?;
            adapters
                .adapter_for::<Date>(&DATE)?
                .nullable()
                .to_json(writer, adapters, since)?;
        }
        Ok(())
    }

    fn adapter(&self) -> &dyn Adapter<Value = HeroData> {
        &HeroDataAdapter
    }
}

struct HeroDataAdapter;

impl Adapter for HeroDataAdapter {
    type Value = HeroData;

    fn from_json(
        &self,
        reader: &mut dyn JsonReader,
        adapters: &CustomScalarAdapters,
    ) -> Result<HeroData> {
        let mut hero = None;
        reader.begin_object()?;
        while let Some(index) = reader.select_name(&["hero"])? {
            if index == 0 {
                hero = HeroAdapter.nullable().from_json(reader, adapters)?;
            }
        }
        reader.end_object()?;
        Ok(HeroData { hero })
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &HeroData,
    ) -> Result<()> {
        writer.begin_object()?;
        writer.name("hero")?;
        HeroAdapter.nullable().to_json(writer, adapters, &value.hero)?;
        writer.end_object()
    }
}

struct HeroAdapter;

impl Adapter for HeroAdapter {
    type Value = Hero;

    fn from_json(&self, reader: &mut dyn JsonReader, adapters: &CustomScalarAdapters) -> Result<Hero> {
        let mut name = None;
        let mut birthday = None;
        let mut friends = None;
        reader.begin_object()?;
        let path = reader.path();
        while let Some(index) = reader.select_name(&["name", "birthday", "friends"])? {
            match index {
                0 => name = Some(StringAdapter.from_json(reader, adapters)?),
                1 => {
                    birthday = adapters
                        .adapter_for::<Date>(&DATE)?
                        .nullable()
                        .from_json(reader, adapters)?
                }
                _ => friends = Some(FriendAdapter.list().from_json(reader, adapters)?),
            }
        }
        reader.end_object()?;

        let name = name.ok_or_else(|| ApolloError::data(path.clone(), "missing field 'name'"))?;
        if friends.is_none()
            && adapters
                .context()
                .evaluate(&BooleanExpression::include("withFriends"))
        {
            return Err(ApolloError::data(path, "missing field 'friends'"));
        }
        Ok(Hero {
            name,
            birthday,
            friends,
        })
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Hero,
    ) -> Result<()> {
        writer.begin_object()?;
        writer.name("name")?;
        StringAdapter.to_json(writer, adapters, &value.name)?;
        writer.name("birthday")?;
        adapters
            .adapter_for::<Date>(&DATE)?
            .nullable()
            .to_json(writer, adapters, &value.birthday)?;
        if let Some(friends) = &value.friends {
            writer.name("friends")?;
            FriendAdapter.list().to_json(writer, adapters, friends)?;
        }
        writer.end_object()
    }
}

struct FriendAdapter;

impl Adapter for FriendAdapter {
    type Value = Friend;

    fn from_json(&self, reader: &mut dyn JsonReader, adapters: &CustomScalarAdapters) -> Result<Friend> {
        let mut name = None;
        reader.begin_object()?;
        let path = reader.path();
        while let Some(index) = reader.select_name(&["name"])? {
            if index == 0 {
                name = Some(StringAdapter.from_json(reader, adapters)?);
            }
        }
        reader.end_object()?;
        Ok(Friend {
            name: name.ok_or_else(|| ApolloError::data(path, "missing field 'name'"))?,
        })
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &Friend,
    ) -> Result<()> {
        writer.begin_object()?;
        writer.name("name")?;
        StringAdapter.to_json(writer, adapters, &value.name)?;
        writer.end_object()
    }
}

/// `query Ping { ping }`
pub struct PingQuery;

impl Operation for PingQuery {
    type Data = String;

    fn name(&self) -> &str {
        "Ping"
    }

    fn document(&self) -> &str {
        "query Ping { ping }"
    }

    fn operation_type(&self) -> OperationType {
        OperationType::Query
    }

    fn serialize_variables(&self, _: &mut dyn JsonWriter, _: &CustomScalarAdapters) -> Result<()> {
        Ok(())
    }

    fn adapter(&self) -> &dyn Adapter<Value = String> {
        &PingDataAdapter
    }
}

struct PingDataAdapter;

impl Adapter for PingDataAdapter {
    type Value = String;

    fn from_json(&self, reader: &mut dyn JsonReader, adapters: &CustomScalarAdapters) -> Result<String> {
        let mut ping = None;
        reader.begin_object()?;
        let path = reader.path();
        while let Some(index) = reader.select_name(&["ping"])? {
            if index == 0 {
                ping = Some(StringAdapter.from_json(reader, adapters)?);
            }
        }
        reader.end_object()?;
        ping.ok_or_else(|| ApolloError::data(path, "missing field 'ping'"))
    }

    fn to_json(
        &self,
        writer: &mut dyn JsonWriter,
        adapters: &CustomScalarAdapters,
        value: &String,
    ) -> Result<()> {
        writer.begin_object()?;
        writer.name("ping")?;
        StringAdapter.to_json(writer, adapters, value)?;
        writer.end_object()
    }
}

/// Counts calls to [`Close::close`] on the wrapped reader or writer.
pub struct Counting<T> {
    inner: T,
    closes: Arc<AtomicUsize>,
}

impl<T> Counting<T> {
    pub fn new(inner: T) -> (Self, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                closes: closes.clone(),
            },
            closes,
        )
    }
}

pub fn closes(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

impl<T: Close> Close for Counting<T> {
    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}

impl<W: JsonWriter> JsonWriter for Counting<W> {
    fn begin_object(&mut self) -> Result<()> {
        self.inner.begin_object()
    }

    fn end_object(&mut self) -> Result<()> {
        self.inner.end_object()
    }

    fn begin_array(&mut self) -> Result<()> {
        self.inner.begin_array()
    }

    fn end_array(&mut self) -> Result<()> {
        self.inner.end_array()
    }

    fn name(&mut self, name: &str) -> Result<()> {
        self.inner.name(name)
    }

    fn value_str(&mut self, value: &str) -> Result<()> {
        self.inner.value_str(value)
    }

    fn value_bool(&mut self, value: bool) -> Result<()> {
        self.inner.value_bool(value)
    }

    fn value_i64(&mut self, value: i64) -> Result<()> {
        self.inner.value_i64(value)
    }

    fn value_f64(&mut self, value: f64) -> Result<()> {
        self.inner.value_f64(value)
    }

    fn value_number(&mut self, value: &serde_json::Number) -> Result<()> {
        self.inner.value_number(value)
    }

    fn null_value(&mut self) -> Result<()> {
        self.inner.null_value()
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

impl<R: JsonReader> JsonReader for Counting<R> {
    fn peek(&mut self) -> Result<Token> {
        self.inner.peek()
    }

    fn begin_object(&mut self) -> Result<()> {
        self.inner.begin_object()
    }

    fn end_object(&mut self) -> Result<()> {
        self.inner.end_object()
    }

    fn begin_array(&mut self) -> Result<()> {
        self.inner.begin_array()
    }

    fn end_array(&mut self) -> Result<()> {
        self.inner.end_array()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.inner.has_next()
    }

    fn next_name(&mut self) -> Result<String> {
        self.inner.next_name()
    }

    fn next_string(&mut self) -> Result<String> {
        self.inner.next_string()
    }

    fn next_bool(&mut self) -> Result<bool> {
        self.inner.next_bool()
    }

    fn next_null(&mut self) -> Result<()> {
        self.inner.next_null()
    }

    fn next_i32(&mut self) -> Result<i32> {
        self.inner.next_i32()
    }

    fn next_i64(&mut self) -> Result<i64> {
        self.inner.next_i64()
    }

    fn next_f64(&mut self) -> Result<f64> {
        self.inner.next_f64()
    }

    fn next_number(&mut self) -> Result<serde_json::Number> {
        self.inner.next_number()
    }

    fn skip_value(&mut self) -> Result<()> {
        self.inner.skip_value()
    }

    fn path(&self) -> Path {
        self.inner.path()
    }
}
