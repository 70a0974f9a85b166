//! Data models for Satchel

mod entry;

pub use entry::{
    new_provisional_id, EntryDraft, EntryId, EntryPatch, EntryType, StoredEntry,
    PROVISIONAL_PREFIX,
};
