//! Activity entity and its wire codec.
//!
//! Encoding rules:
//! - optional fields are omitted when absent, and left at their zero value when
//!   missing from a response;
//! - `data` is an uninterpreted JSON fragment, written and read back verbatim;
//! - `time` is written as naive UTC with microsecond precision
//!   (`2024-05-01T10:20:30.123456`), and read from that form or RFC 3339;
//! - metadata entries are flattened into top-level string fields, and any
//!   unknown top-level string field of a response lands in metadata.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::fmt;
use stream_feed_common::{FeedError, FeedResult};

use crate::feed::Feed;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Keys with a fixed meaning; never treated as metadata.
const RESERVED_KEYS: &[&str] = &[
    "id",
    "actor",
    "verb",
    "object",
    "target",
    "origin",
    "foreign_id",
    "time",
    "to",
    "data",
    "duration",
];

/// A feed identifier of the form `slug:user_id`.
///
/// Used for actor, object, target and origin references, which need not name
/// an existing feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(String);

impl FeedId {
    /// Build an identifier from its parts.
    #[must_use]
    pub fn new(slug: &str, user_id: &str) -> Self {
        Self(format!("{slug}:{user_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(slug, user_id)`, if the identifier has a separator.
    #[must_use]
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once(':')
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeedId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FeedId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for FeedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque JSON payload attached to an activity.
///
/// The client never interprets it: the exact text given is sent, and the exact
/// text received is kept.
#[derive(Debug, Clone)]
pub struct ActivityData(Box<RawValue>);

impl ActivityData {
    /// Wrap a JSON document given as text. The text must be valid JSON.
    pub fn from_json(json: impl Into<String>) -> FeedResult<Self> {
        RawValue::from_string(json.into())
            .map(Self)
            .map_err(FeedError::Encode)
    }

    /// Serialize any value into an opaque payload.
    pub fn from_value<T: Serialize>(value: &T) -> FeedResult<Self> {
        serde_json::value::to_raw_value(value)
            .map(Self)
            .map_err(FeedError::Encode)
    }

    /// The payload text, exactly as carried.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Parse the payload into a concrete type chosen by the caller.
    pub fn parse<T: DeserializeOwned>(&self) -> FeedResult<T> {
        serde_json::from_str(self.0.get())
            .map_err(|source| FeedError::Decode { status: None, source })
    }
}

impl PartialEq for ActivityData {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ActivityData {}

impl Serialize for ActivityData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// One feed event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    /// Server-assigned identifier; empty until the activity has been added.
    pub id: String,
    pub actor: FeedId,
    pub verb: String,
    pub object: FeedId,
    pub target: Option<FeedId>,
    pub origin: Option<FeedId>,
    /// Caller-assigned key; together with `time` the service uses it to
    /// de-duplicate activities.
    pub foreign_id: Option<String>,
    pub time: Option<DateTime<Utc>>,
    /// Extra feeds to deliver to, as `slug:user_id` optionally followed by a
    /// space and that feed's token.
    pub to: Vec<FeedId>,
    pub data: Option<ActivityData>,
    pub metadata: BTreeMap<String, String>,
}

impl Activity {
    /// Create an activity from its three required parts.
    #[must_use]
    pub fn new(actor: impl Into<FeedId>, verb: impl Into<String>, object: impl Into<FeedId>) -> Self {
        Self {
            actor: actor.into(),
            verb: verb.into(),
            object: object.into(),
            ..Self::default()
        }
    }

    /// Reference an activity by its server-assigned id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn foreign_id(mut self, foreign_id: impl Into<String>) -> Self {
        self.foreign_id = Some(foreign_id.into());
        self
    }

    #[must_use]
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<FeedId>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<FeedId>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn data(mut self, data: ActivityData) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Also deliver this activity to `feed`.
    ///
    /// When the feed can sign, its token travels along so the service accepts
    /// the extra delivery.
    #[must_use]
    pub fn deliver_to(mut self, feed: &dyn Feed) -> Self {
        let id = feed.feed_id();
        let entry = match feed.token() {
            "" => id,
            token => FeedId::from(format!("{id} {token}")),
        };
        self.to.push(entry);
        self
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.naive_utc().format(TIME_FORMAT).to_string()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc)))
}

impl Serialize for Activity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if !self.id.is_empty() {
            map.serialize_entry("id", &self.id)?;
        }
        map.serialize_entry("actor", &self.actor)?;
        map.serialize_entry("verb", &self.verb)?;
        map.serialize_entry("object", &self.object)?;
        if let Some(target) = &self.target {
            map.serialize_entry("target", target)?;
        }
        if let Some(origin) = &self.origin {
            map.serialize_entry("origin", origin)?;
        }
        if let Some(foreign_id) = &self.foreign_id {
            map.serialize_entry("foreign_id", foreign_id)?;
        }
        if let Some(time) = &self.time {
            map.serialize_entry("time", &format_time(time))?;
        }
        if !self.to.is_empty() {
            map.serialize_entry("to", &self.to)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        for (key, value) in &self.metadata {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }

        map.end()
    }
}

fn field<T: DeserializeOwned + Default>(key: &str, raw: &RawValue) -> Result<T, String> {
    serde_json::from_str::<Option<T>>(raw.get())
        .map(Option::unwrap_or_default)
        .map_err(|e| format!("invalid `{key}`: {e}"))
}

impl Activity {
    fn from_fields(fields: BTreeMap<String, Box<RawValue>>) -> Result<Self, String> {
        let mut activity = Self::default();

        for (key, raw) in fields {
            match key.as_str() {
                "id" => activity.id = field(&key, &raw)?,
                "actor" => activity.actor = field(&key, &raw)?,
                "verb" => activity.verb = field(&key, &raw)?,
                "object" => activity.object = field(&key, &raw)?,
                "target" => activity.target = field(&key, &raw)?,
                "origin" => activity.origin = field(&key, &raw)?,
                "foreign_id" => activity.foreign_id = field(&key, &raw)?,
                "time" => {
                    activity.time = field::<Option<String>>(&key, &raw)?
                        .map(|t| parse_time(&t).map_err(|e| format!("invalid `time` {t:?}: {e}")))
                        .transpose()?;
                }
                "to" => activity.to = field(&key, &raw)?,
                "data" => {
                    if raw.get() != "null" {
                        activity.data = Some(ActivityData(raw));
                    }
                }
                "duration" => {}
                _ => {
                    if let Ok(value) = serde_json::from_str::<String>(raw.get()) {
                        activity.metadata.insert(key, value);
                    }
                }
            }
        }

        Ok(activity)
    }
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = BTreeMap::<String, Box<RawValue>>::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(de::Error::custom)
    }
}
