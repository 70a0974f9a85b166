//! Sync engine: drains pending local changes into the server-of-record.
//!
//! Entries are processed independently and in causal order per entry
//! (a creation syncs as a create, later edits of a synced entry as
//! updates). Individual failures leave the entry flagged for the next
//! pass; the pass itself never fails. A creation whose acknowledgement
//! is lost is retried as a duplicate creation on the next pass — the
//! accepted at-least-once gap of this protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::api::{EntryChanges, NewEntry, RemoteEntryApi};
use crate::models::StoredEntry;
use crate::store::LocalEntryStore;
use crate::util::unix_timestamp_ms;

/// Aggregate outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub success_count: usize,
    pub error_count: usize,
}

impl SyncReport {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Pushes the sync queue to the backend and reconciles the results back
/// into the local entry store.
pub struct SyncEngine<A: RemoteEntryApi> {
    store: LocalEntryStore,
    api: A,
    in_flight: AtomicBool,
    last_synced_at: Mutex<Option<i64>>,
}

impl<A: RemoteEntryApi> SyncEngine<A> {
    #[must_use]
    pub fn new(store: LocalEntryStore, api: A) -> Self {
        Self {
            store,
            api,
            in_flight: AtomicBool::new(false),
            last_synced_at: Mutex::new(None),
        }
    }

    /// Run one sync pass. At most one pass is in flight at a time;
    /// concurrent triggers collapse into the running pass and the losing
    /// caller gets an empty report.
    pub async fn sync(&self) -> SyncReport {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sync pass already in flight, ignoring trigger");
            return SyncReport::default();
        }

        let report = self.run_pass().await;
        self.in_flight.store(false, Ordering::SeqCst);
        report
    }

    /// Timestamp (Unix ms) of the last completed pass, for staleness
    /// display.
    #[must_use]
    pub fn last_synced_at(&self) -> Option<i64> {
        *self
            .last_synced_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_pass(&self) -> SyncReport {
        let queue = self.store.sync_queue();
        let mut report = SyncReport::default();

        for entry in queue {
            if entry.is_offline_created {
                self.sync_creation(&entry, &mut report).await;
            } else if let Some(server_id) = entry.id.as_server() {
                self.sync_update(&entry, server_id, &mut report).await;
            } else {
                // Flagged but neither an offline creation nor server-backed:
                // the id invariants no longer hold for this entry.
                tracing::error!(
                    "entry {} needs sync but has no syncable identity",
                    entry.id
                );
                report.error_count += 1;
            }
        }

        *self
            .last_synced_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(unix_timestamp_ms());

        tracing::debug!(
            "sync pass finished: {} synced, {} failed",
            report.success_count,
            report.error_count
        );
        report
    }

    async fn sync_creation(&self, entry: &StoredEntry, report: &mut SyncReport) {
        let body = NewEntry::from_entry(entry);
        match self.api.create_entry(&body).await {
            Ok(remote) => {
                let old_id = entry.id.to_string();
                match self.store.mark_synced(&entry.id, Some(remote.id)) {
                    Ok(()) => {
                        self.store
                            .rewrite_references(&old_id, &remote.id.to_string());
                        report.success_count += 1;
                    }
                    Err(error) => {
                        tracing::error!(
                            "failed to absorb server id {} for {}: {error}",
                            remote.id,
                            entry.id
                        );
                        report.error_count += 1;
                    }
                }
            }
            Err(error) => {
                tracing::warn!("creation sync failed for {}: {error}", entry.id);
                report.error_count += 1;
            }
        }
    }

    async fn sync_update(&self, entry: &StoredEntry, server_id: i64, report: &mut SyncReport) {
        let changes = EntryChanges::from_entry(entry);
        match self.api.update_entry(server_id, &changes).await {
            Ok(_) => match self.store.mark_synced(&entry.id, None) {
                Ok(()) => report.success_count += 1,
                Err(error) => {
                    tracing::error!("failed to clear sync flags for {}: {error}", entry.id);
                    report.error_count += 1;
                }
            },
            Err(error) => {
                tracing::warn!("update sync failed for {}: {error}", entry.id);
                report.error_count += 1;
            }
        }
    }
}
