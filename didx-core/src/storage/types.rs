use std::collections::BTreeMap;
use std::fmt::Debug;

use derive_more::{AsRef, From};

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

/// `StorageError` is a base error type for the record store
///
/// `RecordNotFound` and `RecordDuplicate` are the only two variants a caller is
/// expected to branch on, the rest are backend failures
#[derive(Debug, PartialEq, Error, Clone)]
pub enum StorageError {
    #[error("record not found: {record_type} {query}")]
    RecordNotFound { record_type: String, query: String },

    #[error("record duplicate: {record_type} {query}")]
    RecordDuplicate { record_type: String, query: String },

    #[error("serialize error: {0}")]
    SerializeError(String),

    #[error("unserialize error: {0}")]
    UnserializeError(String),

    #[error("db error: {0}")]
    DbError(String),
}

/// `TagValue` is a single indexed value attached to a record
///
/// A `List` tag is used for multi-valued properties like mediation recipient keys,
/// a query for a `Text` value matches when the list contains it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, From)]
#[serde(crate = "self::serde")]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl TagValue {
    pub fn matches(&self, wanted: &TagValue) -> bool {
        match (self, wanted) {
            (TagValue::Bool(own), TagValue::Bool(other)) => own == other,
            (TagValue::Text(own), TagValue::Text(other)) => own == other,
            (TagValue::List(own), TagValue::Text(other)) => own.contains(other),
            (TagValue::List(own), TagValue::List(other)) => {
                other.iter().all(|item| own.contains(item))
            }
            _ => false,
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

/// `Tags` is an ordered tag map, ordering keeps the merge and the query output deterministic
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, From, AsRef)]
#[serde(crate = "self::serde")]
pub struct Tags(BTreeMap<String, TagValue>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<TagValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_opt(mut self, key: &str, value: Option<impl Into<TagValue>>) -> Self {
        if let Some(val) = value {
            self.set(key, val);
        }

        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<TagValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TagValue)> {
        self.0.iter()
    }

    /// `merge` overlays `derived` on top of `self`, a derived key always replaces a
    /// custom key with the same name
    pub fn merge(&self, derived: Tags) -> Tags {
        let mut merged = self.0.clone();
        merged.extend(derived.0);
        Tags::from(merged)
    }
}

/// `Query` is a conjunction of tag conditions
pub type Query = Tags;

impl Tags {
    pub fn matches(&self, tags: &Tags) -> bool {
        self.iter().all(|(key, wanted)| {
            tags.get(key)
                .map(|current| current.matches(wanted))
                .unwrap_or(false)
        })
    }

    pub fn describe(&self) -> String {
        let pairs: Vec<String> = self
            .iter()
            .map(|(key, val)| match val {
                TagValue::Bool(flag) => format!("{key}={flag}"),
                TagValue::Text(text) => format!("{key}={text}"),
                TagValue::List(items) => format!("{key}=[{}]", items.join(",")),
            })
            .collect();

        format!("{{{}}}", pairs.join(", "))
    }
}

/// `Record` is the persisted entity contract
///
/// Every record exposes two tag sets: custom tags set by the user, and default tags
/// computed from the record's own fields at read time
pub trait Record:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const RECORD_TYPE: &'static str;

    fn id(&self) -> String;
    fn custom_tags(&self) -> &Tags;
    fn default_tags(&self) -> Tags;

    fn tags(&self) -> Tags {
        self.custom_tags().merge(self.default_tags())
    }
}

/// `StorageService` is the record store abstraction
///
/// All mutations are whole-record writes, there is no partial field update
#[async_trait]
pub trait StorageService<T>: Send + Sync
where
    T: Record,
{
    async fn save(&self, record: &T) -> Result<(), StorageError>;
    async fn update(&self, record: &T) -> Result<(), StorageError>;
    async fn delete(&self, record: &T) -> Result<(), StorageError>;
    async fn get_by_id(&self, id: String) -> Result<T, StorageError>;
    async fn get_all(&self) -> Result<Vec<T>, StorageError>;
    async fn find_by_query(&self, query: &Query) -> Result<Vec<T>, StorageError>;
}

/// `StoredRecord` is the backend neutral shape of a persisted record, the value is kept
/// as JSON and the tags are materialized at write time so queries never need to
/// rebuild the typed record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct StoredRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: rst_common::standard::serde_json::Value,
    pub tags: Tags,
}

impl StoredRecord {
    pub fn from_record<T: Record>(record: &T) -> Result<Self, StorageError> {
        let value = rst_common::standard::serde_json::to_value(record)
            .map_err(|err| StorageError::SerializeError(err.to_string()))?;

        Ok(Self {
            id: record.id(),
            record_type: T::RECORD_TYPE.to_string(),
            value,
            tags: record.tags(),
        })
    }

    pub fn to_record<T: Record>(&self) -> Result<T, StorageError> {
        rst_common::standard::serde_json::from_value(self.value.clone())
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }
}

impl TryInto<Vec<u8>> for StoredRecord {
    type Error = StorageError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        rst_common::standard::serde_json::to_vec(&self)
            .map_err(|err| StorageError::SerializeError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for StoredRecord {
    type Error = StorageError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        rst_common::standard::serde_json::from_slice(&value)
            .map_err(|err| StorageError::UnserializeError(err.to_string()))
    }
}
