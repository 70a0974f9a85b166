//! Application facade: the surface the clients consume.
//!
//! Wires the platform capability, local entry store, connectivity
//! monitor, remote API, and sync engine together. On an offline-capable
//! platform every write lands in the local store first (provisional
//! identity, needs-sync flag) and the sync engine is invoked
//! opportunistically while online; a web platform forwards writes
//! straight to the remote API.

use crate::api::{EntryChanges, NewEntry, RemoteEntry, RemoteEntryApi};
use crate::config::SyncOptions;
use crate::connectivity::{ConnectivityMonitor, Transition};
use crate::error::{Error, Result};
use crate::models::{EntryDraft, EntryId, EntryPatch, StoredEntry};
use crate::platform::Platform;
use crate::query::{filter_entries, read_source, EntryFilter, ReadSource};
use crate::store::{DeleteDisposition, LocalEntryStore};
use crate::sync::{SyncEngine, SyncReport};

pub struct EntryService<A: RemoteEntryApi + Clone> {
    platform: Platform,
    store: LocalEntryStore,
    monitor: ConnectivityMonitor,
    engine: SyncEngine<A>,
    api: A,
}

impl<A: RemoteEntryApi + Clone> EntryService<A> {
    #[must_use]
    pub fn new(
        platform: Platform,
        store: LocalEntryStore,
        api: A,
        options: SyncOptions,
        initially_online: bool,
    ) -> Self {
        Self {
            platform,
            monitor: ConnectivityMonitor::new(initially_online, options.settle_delay),
            engine: SyncEngine::new(store.clone(), api.clone()),
            store,
            api,
        }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Size of the sync queue, for the pending badge.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.store.pending_count()
    }

    /// Timestamp (Unix ms) of the last completed sync pass.
    #[must_use]
    pub fn last_synced_at(&self) -> Option<i64> {
        self.engine.last_synced_at()
    }

    /// Create an entry, locally first on an offline-capable platform.
    pub async fn create_entry(&self, draft: EntryDraft) -> Result<StoredEntry> {
        let draft = normalize_draft(draft)?;

        if !self.platform.is_offline_capable() {
            let remote = self.api.create_entry(&NewEntry::from_draft(&draft)).await?;
            return Ok(StoredEntry::from(remote));
        }

        let id = self.store.create_offline(draft);
        self.opportunistic_sync().await;
        self.store
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Merge a partial edit into an entry.
    pub async fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> Result<StoredEntry> {
        if patch.is_empty() {
            return self
                .get_entry(id)
                .await?
                .ok_or_else(|| Error::NotFound(id.to_string()));
        }

        if !self.platform.is_offline_capable() {
            let server_id = require_server_id(id)?;
            let remote = self
                .api
                .get_entry(server_id)
                .await?
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            let mut merged = StoredEntry::from(remote);
            merged.apply(patch);
            let updated = self
                .api
                .update_entry(server_id, &EntryChanges::from_entry(&merged))
                .await?;
            return Ok(StoredEntry::from(updated));
        }

        let updated = self.store.update(id, patch)?;
        self.opportunistic_sync().await;
        Ok(self.store.get(id).unwrap_or(updated))
    }

    /// Delete an entry. On an offline-capable platform the local removal
    /// always succeeds; the remote copy is deleted best-effort when
    /// online, and stays behind when offline.
    pub async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        if !self.platform.is_offline_capable() {
            let server_id = require_server_id(id)?;
            self.api.delete_entry(server_id).await?;
            return Ok(());
        }

        match self.store.delete(id)? {
            DeleteDisposition::LocalOnly => {}
            DeleteDisposition::WasSynced(server_id) => {
                if self.monitor.is_online() {
                    if let Err(error) = self.api.delete_entry(server_id).await {
                        tracing::warn!("remote delete failed for entry {server_id}: {error}");
                    }
                } else {
                    tracing::debug!(
                        "entry {server_id} deleted locally while offline; server copy remains"
                    );
                }
            }
        }
        Ok(())
    }

    /// Fetch a single entry through the platform's read path.
    pub async fn get_entry(&self, id: &EntryId) -> Result<Option<StoredEntry>> {
        if self.platform.is_offline_capable() {
            return Ok(self.store.get(id));
        }

        let Some(server_id) = id.as_server() else {
            return Ok(None);
        };
        Ok(self.api.get_entry(server_id).await?.map(StoredEntry::from))
    }

    /// List or search entries through the platform's read path.
    pub async fn entries(&self, filter: &EntryFilter) -> Result<Vec<StoredEntry>> {
        match read_source(self.platform, self.monitor.is_online()) {
            ReadSource::Remote => {
                let remote = self.fetch_remote(filter).await?;
                Ok(remote.into_iter().map(StoredEntry::from).collect())
            }
            ReadSource::RemoteWithLocalFallback => match self.fetch_remote(filter).await {
                Ok(remote) if !remote.is_empty() => {
                    if filter.is_unrestricted() {
                        // Serve the merged view so entries still waiting
                        // to sync stay visible alongside the fresh cache.
                        self.store.cache_server_entries(remote);
                        Ok(self.local_entries(filter))
                    } else {
                        Ok(remote.into_iter().map(StoredEntry::from).collect())
                    }
                }
                Ok(_) => Ok(self.local_entries(filter)),
                Err(error) => {
                    tracing::warn!("remote read failed, serving cached entries: {error}");
                    Ok(self.local_entries(filter))
                }
            },
            ReadSource::Local => Ok(self.local_entries(filter)),
        }
    }

    /// Run a sync pass now, if online. Re-entrant triggers collapse into
    /// the running pass.
    pub async fn trigger_sync(&self) -> SyncReport {
        if !self.monitor.is_online() {
            tracing::debug!("sync requested while offline, skipping");
            return SyncReport::default();
        }
        self.engine.sync().await
    }

    /// Feed a platform connectivity event. A reconnect triggers a sync
    /// pass after the settle delay and returns its report.
    pub async fn set_connectivity(&self, online: bool) -> Option<SyncReport> {
        match self.monitor.report(online) {
            Transition::CameOnline => {
                tracing::debug!("back online, syncing after settle delay");
                tokio::time::sleep(self.monitor.settle_delay()).await;
                Some(self.engine.sync().await)
            }
            Transition::WentOffline => {
                tracing::debug!("connection lost, routing writes to the local store");
                None
            }
            Transition::Unchanged => None,
        }
    }

    fn local_entries(&self, filter: &EntryFilter) -> Vec<StoredEntry> {
        filter_entries(&self.store.get_all(), filter)
    }

    async fn fetch_remote(&self, filter: &EntryFilter) -> crate::api::ApiResult<Vec<RemoteEntry>> {
        if let Some(query) = filter.normalized_query() {
            let results = self.api.search_entries(&query).await?;
            Ok(results
                .into_iter()
                .filter(|entry| {
                    filter
                        .entry_type
                        .is_none_or(|wanted| entry.entry_type == wanted)
                })
                .skip(filter.offset)
                .take(filter.limit)
                .collect())
        } else {
            self.api
                .list_entries(filter.entry_type, filter.limit, filter.offset)
                .await
        }
    }

    async fn opportunistic_sync(&self) {
        if !self.monitor.is_online() {
            return;
        }
        let report = self.engine.sync().await;
        if !report.is_clean() {
            tracing::warn!("{} item(s) failed to sync", report.error_count);
        }
    }
}

fn normalize_draft(mut draft: EntryDraft) -> Result<EntryDraft> {
    draft.title = draft.title.trim().to_string();
    draft.content = draft.content.trim().to_string();
    if draft.title.is_empty() && draft.content.is_empty() {
        return Err(Error::InvalidInput(
            "entry needs a title or content".to_string(),
        ));
    }
    Ok(draft)
}

fn require_server_id(id: &EntryId) -> Result<i64> {
    id.as_server().ok_or_else(|| {
        Error::InvalidInput(format!(
            "web clients cannot address provisional entry {id}"
        ))
    })
}
