//! Entry model and identities

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::util::unix_timestamp_ms;

/// Reserved prefix that keeps provisional ids disjoint from the server's
/// positive integer id space.
pub const PROVISIONAL_PREFIX: &str = "offline_";

/// Generate a fresh provisional id: `offline_<unix ms>_<random suffix>`.
///
/// The random suffix keeps ids unique even when several entries are
/// created within the same millisecond on the same device.
#[must_use]
pub fn new_provisional_id() -> String {
    format!(
        "{PROVISIONAL_PREFIX}{}_{}",
        unix_timestamp_ms(),
        Uuid::new_v4().simple()
    )
}

/// Identity of an entry: a server-assigned integer once synced, or a
/// locally generated provisional string until then.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Server(i64),
    Provisional(String),
}

impl EntryId {
    /// Create a new provisional identity.
    #[must_use]
    pub fn provisional() -> Self {
        Self::Provisional(new_provisional_id())
    }

    /// Server id when this identity has been confirmed by the backend.
    #[must_use]
    pub const fn as_server(&self) -> Option<i64> {
        match self {
            Self::Server(id) => Some(*id),
            Self::Provisional(_) => None,
        }
    }

    #[must_use]
    pub const fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Provisional(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for EntryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            if id > 0 {
                return Ok(Self::Server(id));
            }
            return Err(Error::InvalidInput(format!(
                "server entry ids are positive integers, got {id}"
            )));
        }
        if trimmed.starts_with(PROVISIONAL_PREFIX) {
            return Ok(Self::Provisional(trimmed.to_string()));
        }
        Err(Error::InvalidInput(format!("not an entry id: {trimmed}")))
    }
}

/// The closed set of entry kinds the knowledge base stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Journal,
    Note,
    Person,
    Place,
    Thing,
}

impl EntryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Note => "note",
            Self::Person => "person",
            Self::Place => "place",
            Self::Thing => "thing",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "journal" => Ok(Self::Journal),
            "note" => Ok(Self::Note),
            "person" => Ok(Self::Person),
            "place" => Ok(Self::Place),
            "thing" => Ok(Self::Thing),
            other => Err(Error::InvalidInput(format!("unknown entry type: {other}"))),
        }
    }
}

/// An entry as held by the local entry store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    /// Current identity, server or provisional
    pub id: EntryId,
    /// Present iff the entry was created offline and the creation has not
    /// round-tripped through the server yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisional_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Open, type-dependent attribute bag
    #[serde(default)]
    pub structured_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Creation timestamp (Unix ms), local-clock based until synced
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    #[serde(default)]
    pub is_offline_created: bool,
    #[serde(default)]
    pub is_modified_offline: bool,
    #[serde(default)]
    pub needs_sync: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<i64>,
}

impl StoredEntry {
    /// Build an entry for an offline creation: provisional identity,
    /// flagged for sync.
    #[must_use]
    pub fn new_offline(draft: EntryDraft) -> Self {
        let provisional = new_provisional_id();
        let now = unix_timestamp_ms();
        Self {
            id: EntryId::Provisional(provisional.clone()),
            provisional_id: Some(provisional),
            title: draft.title,
            content: draft.content,
            entry_type: draft.entry_type,
            date: draft.date,
            structured_data: draft.structured_data,
            user_id: None,
            created_at: now,
            updated_at: now,
            is_offline_created: true,
            is_modified_offline: false,
            needs_sync: true,
            last_synced_at: None,
        }
    }

    /// Apply a partial update; absent fields are left unchanged.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(date) = patch.date {
            self.date = Some(date);
        }
        if let Some(structured_data) = &patch.structured_data {
            self.structured_data = structured_data.clone();
        }
    }
}

/// Fields for creating a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub title: String,
    pub content: String,
    pub entry_type: EntryType,
    pub date: Option<NaiveDate>,
    pub structured_data: serde_json::Value,
}

impl EntryDraft {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        entry_type: EntryType,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            entry_type,
            date: None,
            structured_data: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_structured_data(mut self, structured_data: serde_json::Value) -> Self {
        self.structured_data = structured_data;
        self
    }
}

/// Partial update of an entry; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<NaiveDate>,
    pub structured_data: Option<serde_json::Value>,
}

impl EntryPatch {
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.date.is_none()
            && self.structured_data.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn provisional_ids_are_unique_under_rapid_generation() {
        let mut seen = HashSet::new();
        for _ in 0..500 {
            assert!(seen.insert(new_provisional_id()));
        }
    }

    #[test]
    fn provisional_ids_carry_reserved_prefix() {
        let id = new_provisional_id();
        assert!(id.starts_with(PROVISIONAL_PREFIX));
    }

    #[test]
    fn entry_id_parses_server_integers() {
        let id: EntryId = "42".parse().unwrap();
        assert_eq!(id, EntryId::Server(42));
        assert_eq!(id.as_server(), Some(42));
        assert!(!id.is_provisional());
    }

    #[test]
    fn entry_id_parses_provisional_strings() {
        let id: EntryId = "offline_1000_abc".parse().unwrap();
        assert_eq!(id, EntryId::Provisional("offline_1000_abc".to_string()));
        assert!(id.is_provisional());
        assert_eq!(id.as_server(), None);
    }

    #[test]
    fn entry_id_rejects_foreign_strings_and_nonpositive_integers() {
        assert!("not-an-id".parse::<EntryId>().is_err());
        assert!("0".parse::<EntryId>().is_err());
        assert!("-3".parse::<EntryId>().is_err());
    }

    #[test]
    fn entry_id_display_roundtrips() {
        for raw in ["17", "offline_1000_def"] {
            let id: EntryId = raw.parse().unwrap();
            assert_eq!(id.to_string(), raw);
        }
    }

    #[test]
    fn entry_type_roundtrips_through_strings() {
        for entry_type in [
            EntryType::Journal,
            EntryType::Note,
            EntryType::Person,
            EntryType::Place,
            EntryType::Thing,
        ] {
            let parsed: EntryType = entry_type.as_str().parse().unwrap();
            assert_eq!(parsed, entry_type);
        }
        assert!("recipe".parse::<EntryType>().is_err());
    }

    #[test]
    fn new_offline_sets_provisional_identity_and_flags() {
        let entry = StoredEntry::new_offline(EntryDraft::new("Trip", "Pack bags", EntryType::Note));

        assert!(entry.id.is_provisional());
        assert_eq!(entry.provisional_id.as_deref(), Some(&*entry.id.to_string()));
        assert!(entry.is_offline_created);
        assert!(entry.needs_sync);
        assert!(!entry.is_modified_offline);
        assert_eq!(entry.last_synced_at, None);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut entry =
            StoredEntry::new_offline(EntryDraft::new("Trip", "Pack bags", EntryType::Note));
        let original_title = entry.title.clone();

        entry.apply(&EntryPatch::content("Pack bags and boots"));

        assert_eq!(entry.title, original_title);
        assert_eq!(entry.content, "Pack bags and boots");
    }

    #[test]
    fn stored_entry_serde_roundtrip() {
        let entry = StoredEntry::new_offline(
            EntryDraft::new("Trip", "Pack bags", EntryType::Journal)
                .with_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
                .with_structured_data(serde_json::json!({"mood": "excited"})),
        );

        let raw = serde_json::to_string(&entry).unwrap();
        let back: StoredEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn stored_entry_json_uses_wire_field_names() {
        let entry = StoredEntry::new_offline(EntryDraft::new("T", "c", EntryType::Person));
        let raw = serde_json::to_value(&entry).unwrap();

        assert_eq!(raw["type"], "person");
        assert!(raw.get("needsSync").is_some());
        assert!(raw.get("isOfflineCreated").is_some());
        assert!(raw.get("entry_type").is_none());
    }
}
