//! satchel-core - Core library for Satchel
//!
//! This crate contains the entry model, the local entry store, and the
//! offline-first sync engine shared by all Satchel clients (CLI, mobile,
//! web shells).

pub mod api;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod kv;
pub mod models;
pub mod platform;
pub mod query;
pub mod rewrite;
pub mod service;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{EntryDraft, EntryId, EntryPatch, EntryType, StoredEntry};
pub use platform::Platform;
pub use query::EntryFilter;
pub use service::EntryService;
pub use sync::SyncReport;
