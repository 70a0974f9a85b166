//! Query/read surface: local filtering and the per-platform read-path
//! policy.

use crate::models::{EntryType, StoredEntry};
use crate::platform::Platform;

/// Default page size for entry listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Type/keyword filter applied to entry listings, locally or remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub query: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            entry_type: None,
            query: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl EntryFilter {
    #[must_use]
    pub fn of_type(entry_type: EntryType) -> Self {
        Self {
            entry_type: Some(entry_type),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matching(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether this filter restricts the result set at all (pagination
    /// aside). Only unrestricted reads are safe to re-cache wholesale.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.entry_type.is_none() && self.normalized_query().is_none() && self.offset == 0
    }

    pub(crate) fn normalized_query(&self) -> Option<String> {
        let query = self.query.as_ref()?.trim().to_lowercase();
        if query.is_empty() {
            None
        } else {
            Some(query)
        }
    }
}

/// Where a read should be served from, given platform and connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Remote API only; failures surface to the caller.
    Remote,
    /// Remote preferred, local cache as fallback, payload re-cached.
    RemoteWithLocalFallback,
    /// Local store only; no remote calls attempted.
    Local,
}

/// Decide the source of truth for a read.
#[must_use]
pub const fn read_source(platform: Platform, online: bool) -> ReadSource {
    match platform {
        Platform::Web => ReadSource::Remote,
        Platform::OfflineCapable => {
            if online {
                ReadSource::RemoteWithLocalFallback
            } else {
                ReadSource::Local
            }
        }
    }
}

/// Apply type and keyword filters locally, the way the backend would
/// apply them server-side: exact type equality, case-insensitive
/// substring match over title and content, most-recently-updated first.
#[must_use]
pub fn filter_entries(entries: &[StoredEntry], filter: &EntryFilter) -> Vec<StoredEntry> {
    let query = filter.normalized_query();

    let mut matched: Vec<StoredEntry> = entries
        .iter()
        .filter(|entry| {
            filter
                .entry_type
                .is_none_or(|wanted| entry.entry_type == wanted)
        })
        .filter(|entry| match &query {
            None => true,
            Some(needle) => {
                entry.title.to_lowercase().contains(needle)
                    || entry.content.to_lowercase().contains(needle)
            }
        })
        .cloned()
        .collect();

    matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    matched
        .into_iter()
        .skip(filter.offset)
        .take(filter.limit)
        .collect()
}
