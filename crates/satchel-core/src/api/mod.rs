//! Remote entry API client.
//!
//! The backend is the server-of-record behind a small REST surface
//! (`POST /entries`, `PUT /entries/{id}`, `GET /entries`, `GET /search`).
//! The engine consumes it through [`RemoteEntryApi`] so tests and other
//! transports can stand in for the HTTP client.

use chrono::NaiveDate;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntryId, EntryType, StoredEntry};
use crate::util::{compact_text, is_http_url, normalize_text_option, unix_timestamp_ms};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("API HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid API payload: {0}")]
    InvalidPayload(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// An entry as the server returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub structured_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<RemoteEntry> for StoredEntry {
    /// Mirror a server record into local storage: synced, nothing pending.
    fn from(remote: RemoteEntry) -> Self {
        Self {
            id: EntryId::Server(remote.id),
            provisional_id: None,
            title: remote.title,
            content: remote.content,
            entry_type: remote.entry_type,
            date: remote.date,
            structured_data: remote.structured_data,
            user_id: remote.user_id,
            created_at: remote.created_at,
            updated_at: remote.updated_at,
            is_offline_created: false,
            is_modified_offline: false,
            needs_sync: false,
            last_synced_at: Some(unix_timestamp_ms()),
        }
    }
}

/// `POST /entries` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub structured_data: serde_json::Value,
}

impl NewEntry {
    /// Snapshot an entry's current field values for a creation call.
    #[must_use]
    pub fn from_entry(entry: &StoredEntry) -> Self {
        Self {
            title: entry.title.clone(),
            content: entry.content.clone(),
            entry_type: entry.entry_type,
            date: entry.date,
            structured_data: entry.structured_data.clone(),
        }
    }

    /// Build a creation body straight from draft fields (web platform,
    /// where no local entry is written first).
    #[must_use]
    pub fn from_draft(draft: &crate::models::EntryDraft) -> Self {
        Self {
            title: draft.title.clone(),
            content: draft.content.clone(),
            entry_type: draft.entry_type,
            date: draft.date,
            structured_data: draft.structured_data.clone(),
        }
    }
}

/// `PUT /entries/{id}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryChanges {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub structured_data: serde_json::Value,
}

impl EntryChanges {
    #[must_use]
    pub fn from_entry(entry: &StoredEntry) -> Self {
        Self {
            title: entry.title.clone(),
            content: entry.content.clone(),
            structured_data: entry.structured_data.clone(),
        }
    }
}

/// The backend operations the engine and read surface consume.
#[allow(async_fn_in_trait)]
pub trait RemoteEntryApi {
    async fn create_entry(&self, entry: &NewEntry) -> ApiResult<RemoteEntry>;

    async fn update_entry(&self, id: i64, changes: &EntryChanges) -> ApiResult<RemoteEntry>;

    async fn delete_entry(&self, id: i64) -> ApiResult<()>;

    async fn get_entry(&self, id: i64) -> ApiResult<Option<RemoteEntry>>;

    async fn list_entries(
        &self,
        entry_type: Option<EntryType>,
        limit: usize,
        offset: usize,
    ) -> ApiResult<Vec<RemoteEntry>>;

    async fn search_entries(&self, query: &str) -> ApiResult<Vec<RemoteEntry>>;
}

/// `reqwest`-backed client for the backend REST API.
#[derive(Clone)]
pub struct HttpEntryApi {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpEntryApi {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> ApiResult<Self> {
        let base_url = normalize_endpoint(base_url.into())?;
        Ok(Self {
            base_url,
            auth_token: normalize_text_option(auth_token),
            client: reqwest::Client::builder().build()?,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder.header("Accept", "application/json")
    }
}

impl RemoteEntryApi for HttpEntryApi {
    async fn create_entry(&self, entry: &NewEntry) -> ApiResult<RemoteEntry> {
        let response = self
            .request(Method::POST, "/entries")
            .json(entry)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_entry(&self, id: i64, changes: &EntryChanges) -> ApiResult<RemoteEntry> {
        let response = self
            .request(Method::PUT, &format!("/entries/{id}"))
            .json(changes)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_entry(&self, id: i64) -> ApiResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/entries/{id}"))
            .send()
            .await?;
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(read_api_error(response).await)
    }

    async fn get_entry(&self, id: i64) -> ApiResult<Option<RemoteEntry>> {
        let response = self
            .request(Method::GET, &format!("/entries/{id}"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    async fn list_entries(
        &self,
        entry_type: Option<EntryType>,
        limit: usize,
        offset: usize,
    ) -> ApiResult<Vec<RemoteEntry>> {
        let mut builder = self
            .request(Method::GET, "/entries")
            .query(&[("limit", limit), ("offset", offset)]);
        if let Some(entry_type) = entry_type {
            builder = builder.query(&[("type", entry_type.as_str())]);
        }
        let response = builder.send().await?;
        read_json(response).await
    }

    async fn search_entries(&self, query: &str) -> ApiResult<Vec<RemoteEntry>> {
        let response = self
            .request(Method::GET, "/search")
            .query(&[("q", query)])
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    if !response.status().is_success() {
        return Err(read_api_error(response).await);
    }
    Ok(response.json::<T>().await?)
}

async fn read_api_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ApiError::Api(parse_api_error(status, &body))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> ApiResult<String> {
    let endpoint = normalize_text_option(Some(raw)).ok_or_else(|| {
        ApiError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(ApiError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process stand-in for the backend, shared by the engine tests.

    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};

    use super::{
        ApiError, ApiResult, EntryChanges, EntryType, NewEntry, RemoteEntry, RemoteEntryApi,
    };
    use crate::util::unix_timestamp_ms;

    /// Clone-able fake backend; clones share one server-side state.
    #[derive(Clone, Default)]
    pub(crate) struct FakeRemoteApi {
        inner: Arc<FakeInner>,
    }

    #[derive(Default)]
    struct FakeInner {
        next_id: AtomicI64,
        fail_requests: AtomicBool,
        entries: Mutex<Vec<RemoteEntry>>,
        create_calls: Mutex<Vec<NewEntry>>,
        update_calls: Mutex<Vec<(i64, EntryChanges)>>,
    }

    impl FakeRemoteApi {
        pub(crate) fn new() -> Self {
            let api = Self::default();
            api.inner.next_id.store(1, Ordering::SeqCst);
            api
        }

        pub(crate) fn set_failing(&self, failing: bool) {
            self.inner.fail_requests.store(failing, Ordering::SeqCst);
        }

        pub(crate) fn seed(&self, entry: RemoteEntry) {
            self.inner.next_id.fetch_max(entry.id + 1, Ordering::SeqCst);
            self.inner.entries.lock().unwrap().push(entry);
        }

        pub(crate) fn server_entries(&self) -> Vec<RemoteEntry> {
            self.inner.entries.lock().unwrap().clone()
        }

        pub(crate) fn create_calls(&self) -> Vec<NewEntry> {
            self.inner.create_calls.lock().unwrap().clone()
        }

        pub(crate) fn update_calls(&self) -> Vec<(i64, EntryChanges)> {
            self.inner.update_calls.lock().unwrap().clone()
        }

        fn check_link(&self) -> ApiResult<()> {
            if self.inner.fail_requests.load(Ordering::SeqCst) {
                return Err(ApiError::Api("simulated network failure".to_string()));
            }
            Ok(())
        }
    }

    impl RemoteEntryApi for FakeRemoteApi {
        async fn create_entry(&self, entry: &NewEntry) -> ApiResult<RemoteEntry> {
            self.check_link()?;
            self.inner.create_calls.lock().unwrap().push(entry.clone());

            let now = unix_timestamp_ms();
            let created = RemoteEntry {
                id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
                title: entry.title.clone(),
                content: entry.content.clone(),
                entry_type: entry.entry_type,
                date: entry.date,
                structured_data: entry.structured_data.clone(),
                user_id: Some(1),
                created_at: now,
                updated_at: now,
            };
            self.inner.entries.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_entry(&self, id: i64, changes: &EntryChanges) -> ApiResult<RemoteEntry> {
            self.check_link()?;
            self.inner
                .update_calls
                .lock()
                .unwrap()
                .push((id, changes.clone()));

            let mut entries = self.inner.entries.lock().unwrap();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.id == id)
                .ok_or_else(|| ApiError::Api(format!("no such entry ({id})")))?;
            entry.title = changes.title.clone();
            entry.content = changes.content.clone();
            entry.structured_data = changes.structured_data.clone();
            entry.updated_at = unix_timestamp_ms();
            Ok(entry.clone())
        }

        async fn delete_entry(&self, id: i64) -> ApiResult<()> {
            self.check_link()?;
            self.inner
                .entries
                .lock()
                .unwrap()
                .retain(|entry| entry.id != id);
            Ok(())
        }

        async fn get_entry(&self, id: i64) -> ApiResult<Option<RemoteEntry>> {
            self.check_link()?;
            Ok(self
                .inner
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|entry| entry.id == id)
                .cloned())
        }

        async fn list_entries(
            &self,
            entry_type: Option<EntryType>,
            limit: usize,
            offset: usize,
        ) -> ApiResult<Vec<RemoteEntry>> {
            self.check_link()?;
            Ok(self
                .inner
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|entry| entry_type.is_none_or(|wanted| entry.entry_type == wanted))
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn search_entries(&self, query: &str) -> ApiResult<Vec<RemoteEntry>> {
            self.check_link()?;
            let needle = query.to_lowercase();
            Ok(self
                .inner
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|entry| {
                    entry.title.to_lowercase().contains(&needle)
                        || entry.content.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::EntryDraft;

    #[test]
    fn normalize_endpoint_rejects_invalid_values() {
        assert!(normalize_endpoint(String::new()).is_err());
        assert!(normalize_endpoint("api.example.com".to_string()).is_err());
    }

    #[test]
    fn normalize_endpoint_trims_trailing_slash() {
        assert_eq!(
            normalize_endpoint("https://api.example.com/".to_string()).unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn parse_api_error_prefers_json_message() {
        let message = parse_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "title is required"}"#,
        );
        assert_eq!(message, "title is required (422)");
    }

    #[test]
    fn parse_api_error_falls_back_to_raw_body_and_status() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down (502)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[test]
    fn remote_entry_mirrors_into_synced_stored_entry() {
        let remote = RemoteEntry {
            id: 42,
            title: "Trip Notes".to_string(),
            content: "pack".to_string(),
            entry_type: EntryType::Journal,
            date: None,
            structured_data: serde_json::Value::Null,
            user_id: Some(7),
            created_at: 1000,
            updated_at: 2000,
        };

        let stored = StoredEntry::from(remote);
        assert_eq!(stored.id, EntryId::Server(42));
        assert_eq!(stored.provisional_id, None);
        assert!(!stored.needs_sync);
        assert!(!stored.is_offline_created);
        assert!(stored.last_synced_at.is_some());
    }

    #[test]
    fn new_entry_snapshots_current_field_values() {
        let mut entry = StoredEntry::new_offline(EntryDraft::new(
            "Trip Notes",
            "original",
            EntryType::Note,
        ));
        entry.content = "edited".to_string();

        let body = NewEntry::from_entry(&entry);
        assert_eq!(body.content, "edited");
        assert_eq!(body.entry_type, EntryType::Note);
    }

    #[test]
    fn wire_bodies_serialize_with_camel_case_names() {
        let entry = StoredEntry::new_offline(EntryDraft::new("T", "c", EntryType::Thing));
        let body = serde_json::to_value(NewEntry::from_entry(&entry)).unwrap();

        assert_eq!(body["type"], "thing");
        assert!(body.get("structuredData").is_some());
        assert!(body.get("structured_data").is_none());
    }
}
