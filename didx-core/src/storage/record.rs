use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::serde::ts_seconds_option;
use rst_common::standard::chrono::{DateTime, SubsecRound, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;

use super::types::{TagValue, Tags};

/// `BaseRecord` holds the properties shared by every persisted record
///
/// `created_at` is set once at construction and never touched again, `updated_at`
/// moves on every state mutation. Timestamps are kept at second precision, the
/// precision they are persisted with
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(crate = "self::serde")]
pub struct BaseRecord {
    id: String,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds_option")]
    #[serde(rename = "updatedAt")]
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    tags: Tags,
}

impl BaseRecord {
    pub fn new(id: Option<String>, created_at: Option<DateTime<Utc>>, tags: Option<Tags>) -> Self {
        Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            created_at: created_at.unwrap_or_else(Utc::now).trunc_subsecs(0),
            updated_at: None,
            tags: tags.unwrap_or_default(),
        }
    }

    pub fn id(&self) -> String {
        self.id.to_owned()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn set_tag(&mut self, key: &str, value: impl Into<TagValue>) {
        self.tags.set(key, value);
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now().trunc_subsecs(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_when_absent() {
        let base = BaseRecord::new(None, None, None);
        assert!(!base.id().is_empty());
        assert!(Uuid::parse_str(&base.id()).is_ok());
        assert!(base.updated_at().is_none());
    }

    #[test]
    fn test_keep_given_props() {
        let created_at = Utc::now().trunc_subsecs(0);
        let mut base = BaseRecord::new(
            Some("record-id".to_string()),
            Some(created_at),
            Some(Tags::new().with("default", true)),
        );

        base.touch();
        assert_eq!(base.id(), "record-id");
        assert_eq!(base.created_at(), created_at);
        assert!(base.updated_at().is_some());
        assert_eq!(base.tags().get("default"), Some(&TagValue::from(true)));
    }
}
