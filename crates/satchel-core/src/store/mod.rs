//! Local entry store: the canonical on-device view of all known entries.
//!
//! Holds both entries mirrored from the server and entries created or
//! edited offline, keyed by a server id or a provisional id. The
//! in-memory view is mirrored to the key-value adapter one record per
//! entry; persistence failures are logged and never corrupt the
//! in-memory view, and unreadable stored records are skipped on load.
//! Per-entry persistence is independent — there is no cross-entry
//! atomicity, which is acceptable because sync is idempotent and
//! resumable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::RemoteEntry;
use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use crate::models::{EntryDraft, EntryId, EntryPatch, StoredEntry};
use crate::rewrite::rewrite_marker;
use crate::util::unix_timestamp_ms;

const ENTRY_KEY_PREFIX: &str = "entry/";

/// What a local deletion implies for the server-of-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDisposition {
    /// The entry never reached the server; nothing to do remotely.
    LocalOnly,
    /// The entry was previously synced under this server id; the caller
    /// may attempt a best-effort remote delete.
    WasSynced(i64),
}

/// Clone-able handle to the on-device entry store.
#[derive(Clone)]
pub struct LocalEntryStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    kv: Box<dyn KeyValueStore>,
    entries: Mutex<Vec<StoredEntry>>,
    /// Provisional ids already swapped for server ids this session, so a
    /// caller holding a stale provisional id still resolves the entry.
    remapped: Mutex<HashMap<String, i64>>,
}

impl LocalEntryStore {
    /// Open the store over a persistence adapter, loading every readable
    /// entry record. Unreadable records (I/O failure, corrupt JSON) are
    /// logged and skipped so a damaged backing store degrades to an
    /// empty view instead of failing.
    #[must_use]
    pub fn open(kv: impl KeyValueStore + 'static) -> Self {
        let entries = load_entries(&kv);
        Self {
            inner: Arc::new(StoreInner {
                kv: Box::new(kv),
                entries: Mutex::new(entries),
                remapped: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Follow the remap table so a provisional id whose creation has
    /// already been acknowledged resolves to the server identity.
    fn canonical_id(&self, id: &EntryId) -> EntryId {
        if let EntryId::Provisional(provisional) = id {
            let remapped = self
                .inner
                .remapped
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(server_id) = remapped.get(provisional) {
                return EntryId::Server(*server_id);
            }
        }
        id.clone()
    }

    /// Every known entry, most-recently-updated first. Never fails.
    #[must_use]
    pub fn get_all(&self) -> Vec<StoredEntry> {
        let mut entries = self.lock().clone();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries
    }

    /// Look up an entry by server or provisional identity.
    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<StoredEntry> {
        let id = self.canonical_id(id);
        self.lock().iter().find(|entry| matches_id(entry, &id)).cloned()
    }

    /// Create an entry while offline: fresh provisional identity,
    /// flagged for sync, inserted at the head of the list.
    pub fn create_offline(&self, draft: EntryDraft) -> EntryId {
        let entry = StoredEntry::new_offline(draft);
        let id = entry.id.clone();

        let mut entries = self.lock();
        self.persist(&entry);
        entries.insert(0, entry);
        id
    }

    /// Merge a partial edit into an entry. Flags the entry for sync;
    /// editing a not-yet-synced creation stays a creation rather than
    /// becoming a modification.
    pub fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<StoredEntry> {
        let id = self.canonical_id(id);
        let mut entries = self.lock();
        let entry = entries
            .iter_mut()
            .find(|entry| matches_id(entry, &id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        entry.apply(patch);
        entry.updated_at = unix_timestamp_ms();
        entry.needs_sync = true;
        if !entry.is_offline_created {
            entry.is_modified_offline = true;
        }

        let updated = entry.clone();
        self.persist(&updated);
        Ok(updated)
    }

    /// Remove an entry outright and report whether the server still
    /// knows about it.
    pub fn delete(&self, id: &EntryId) -> Result<DeleteDisposition> {
        let id = self.canonical_id(id);
        let mut entries = self.lock();
        let position = entries
            .iter()
            .position(|entry| matches_id(entry, &id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let removed = entries.remove(position);
        if let Err(error) = self.inner.kv.remove(&entry_key(&removed.id)) {
            tracing::warn!("failed to remove persisted entry {}: {error}", removed.id);
        }

        Ok(match removed.id.as_server() {
            Some(server_id) => DeleteDisposition::WasSynced(server_id),
            None => DeleteDisposition::LocalOnly,
        })
    }

    /// Absorb the authoritative list of the user's entries.
    ///
    /// A merge, not a replace: entries flagged `needs_sync` always
    /// survive untouched, pure-cache entries are refreshed from the
    /// payload, and pure-cache entries absent from the payload are
    /// dropped (assumed deleted upstream).
    pub fn cache_server_entries(&self, remote: Vec<RemoteEntry>) {
        let mut entries = self.lock();

        let kept: Vec<StoredEntry> = entries
            .iter()
            .filter(|entry| entry.needs_sync)
            .cloned()
            .collect();
        let dropped: Vec<EntryId> = entries
            .iter()
            .filter(|entry| !entry.needs_sync)
            .map(|entry| entry.id.clone())
            .collect();

        let mut merged = kept;
        for remote_entry in remote {
            let shadowed = merged.iter().any(|entry| {
                entry.id.as_server() == Some(remote_entry.id)
            });
            if shadowed {
                // An unsynced local edit wins over the server snapshot.
                continue;
            }
            let fresh = StoredEntry::from(remote_entry);
            self.persist(&fresh);
            merged.push(fresh);
        }

        for id in dropped {
            if merged.iter().any(|entry| entry.id == id) {
                continue;
            }
            if let Err(error) = self.inner.kv.remove(&entry_key(&id)) {
                tracing::warn!("failed to remove superseded entry {id}: {error}");
            }
        }

        merged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        *entries = merged;
    }

    /// Record a successful sync round-trip.
    ///
    /// With `server_id` (creation ack): atomically swap the provisional
    /// identity for the server id and flip `is_offline_created`. Without
    /// (update ack): clear the divergence flags. Both stamp
    /// `last_synced_at`.
    pub fn mark_synced(&self, id: &EntryId, server_id: Option<i64>) -> Result<()> {
        let mut entries = self.lock();

        if let Some(server_id) = server_id {
            let collision = entries
                .iter()
                .any(|entry| entry.id == EntryId::Server(server_id));
            if collision {
                // Should never happen given disjoint id spaces; refuse
                // to corrupt state.
                tracing::error!(
                    "identity conflict: server id {server_id} already present while acking {id}"
                );
                return Err(Error::IdentityConflict(format!(
                    "server id {server_id} already present"
                )));
            }
        }

        let entry = entries
            .iter_mut()
            .find(|entry| matches_id(entry, id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let old_key = entry_key(&entry.id);
        if let Some(server_id) = server_id {
            if let EntryId::Provisional(provisional) = &entry.id {
                self.inner
                    .remapped
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(provisional.clone(), server_id);
            }
            entry.id = EntryId::Server(server_id);
            entry.provisional_id = None;
            entry.is_offline_created = false;
        }
        entry.needs_sync = false;
        entry.is_modified_offline = false;
        entry.last_synced_at = Some(unix_timestamp_ms());

        let updated = entry.clone();
        let new_key = entry_key(&updated.id);
        if new_key != old_key {
            if let Err(error) = self.inner.kv.remove(&old_key) {
                tracing::warn!("failed to remove remapped entry key {old_key}: {error}");
            }
        }
        self.persist(&updated);
        Ok(())
    }

    /// Entries with local mutations the server has not acknowledged,
    /// oldest mutation first (per-entry causal order).
    #[must_use]
    pub fn sync_queue(&self) -> Vec<StoredEntry> {
        let mut queue: Vec<StoredEntry> = self
            .lock()
            .iter()
            .filter(|entry| entry.needs_sync)
            .cloned()
            .collect();
        queue.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        queue
    }

    /// Size of the sync queue, for UI display.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().iter().filter(|entry| entry.needs_sync).count()
    }

    /// Rewrite `#[[old_id]]` markers to `#[[new_id]]` across every
    /// entry's content, persisting each changed entry. Best-effort: a
    /// failed persist is logged and the scan continues.
    ///
    /// Rewriting maintains identities rather than recording a user edit,
    /// so it touches neither `updated_at` nor `needs_sync`.
    pub fn rewrite_references(&self, old_id: &str, new_id: &str) -> usize {
        let mut entries = self.lock();
        let mut rewritten = 0;

        for entry in entries.iter_mut() {
            let Some(content) = rewrite_marker(&entry.content, old_id, new_id) else {
                continue;
            };
            entry.content = content;
            self.persist(entry);
            rewritten += 1;
        }

        if rewritten > 0 {
            tracing::debug!("rewrote {rewritten} reference(s) from {old_id} to {new_id}");
        }
        rewritten
    }

    fn persist(&self, entry: &StoredEntry) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!("failed to serialize entry {}: {error}", entry.id);
                return;
            }
        };
        if let Err(error) = self.inner.kv.set(&entry_key(&entry.id), &raw) {
            tracing::warn!("failed to persist entry {}: {error}", entry.id);
        }
    }
}

fn matches_id(entry: &StoredEntry, id: &EntryId) -> bool {
    if entry.id == *id {
        return true;
    }
    match id {
        EntryId::Provisional(provisional) => {
            entry.provisional_id.as_deref() == Some(provisional.as_str())
        }
        EntryId::Server(_) => false,
    }
}

fn entry_key(id: &EntryId) -> String {
    format!("{ENTRY_KEY_PREFIX}{id}")
}

fn load_entries(kv: &dyn KeyValueStore) -> Vec<StoredEntry> {
    let keys = match kv.keys() {
        Ok(keys) => keys,
        Err(error) => {
            tracing::warn!("failed to list persisted entries, starting empty: {error}");
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for key in keys {
        if !key.starts_with(ENTRY_KEY_PREFIX) {
            continue;
        }
        let raw = match kv.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(error) => {
                tracing::warn!("failed to read persisted entry {key}: {error}");
                continue;
            }
        };
        match serde_json::from_str::<StoredEntry>(&raw) {
            Ok(entry) => entries.push(entry),
            Err(error) => {
                tracing::warn!("skipping corrupt entry record {key}: {error}");
            }
        }
    }

    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    entries
}
