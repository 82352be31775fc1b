//! The `Novel` record and its opaque identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Creator id recorded when no identity is available.
pub const ANONYMOUS: &str = "anonymous";

/// Backend-assigned identifier of a novel.
///
/// Sequence backends hand out decimal numbers, the document backend hands out
/// generated keys; callers never interpret the value. The empty string and
/// `"0"` both mean "not yet persisted".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NovelId(String);

impl NovelId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// An identifier that has not been assigned by any backend.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_empty() || self.0 == "0"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the id as a positive sequence number, if it is one.
    ///
    /// Only the canonical decimal form counts, so `"01"` or `"+1"` never
    /// alias record `1`.
    pub fn as_sequence(&self) -> Option<i64> {
        self.0
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0 && n.to_string() == self.0)
    }
}

impl From<i64> for NovelId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for NovelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NovelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NovelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalogued work.
///
/// `published_date` is free text and never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Novel {
    pub id: NovelId,
    pub title: String,
    pub author: String,
    pub published_date: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub description: String,
    /// Display name of the creator
    pub created_by: String,
    #[serde(rename = "createdByID")]
    pub created_by_id: String,
}

impl Novel {
    /// Convenience constructor used by tests and the CLI.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn set_creator_anonymous(&mut self) {
        self.created_by = String::new();
        self.created_by_id = ANONYMOUS.to_string();
    }
}
