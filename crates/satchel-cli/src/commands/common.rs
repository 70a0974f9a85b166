use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, Utc};
use satchel_core::api::HttpEntryApi;
use satchel_core::config::{ApiConfig, SyncOptions};
use satchel_core::kv::FileKeyValueStore;
use satchel_core::rewrite::extract_references;
use satchel_core::store::LocalEntryStore;
use satchel_core::{EntryFilter, EntryId, EntryService, Platform, StoredEntry};
use serde::Serialize;

use crate::error::CliError;

/// Wide enough to cover any realistic personal store in one read.
pub const LIST_ALL_LIMIT: usize = 10_000;

/// Placeholder endpoint used when no API is configured; the service is
/// forced offline in that case, so the client never dials it.
const UNCONFIGURED_API_URL: &str = "http://localhost:8787";

pub type CliService = EntryService<HttpEntryApi>;

/// Build the offline-capable entry service the CLI drives.
///
/// The CLI has no connectivity events to observe, so the state is
/// derived once per invocation: online iff an API endpoint is
/// configured and `--offline` was not passed.
pub fn build_service(data_dir: &Path, force_offline: bool) -> Result<CliService, CliError> {
    let config = ApiConfig::from_env();
    let online = !force_offline && config.is_configured();
    if !online {
        tracing::debug!("working offline against {}", data_dir.display());
    }

    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| UNCONFIGURED_API_URL.to_string());
    let api = HttpEntryApi::new(base_url, config.auth_token)?;
    let store = LocalEntryStore::open(FileKeyValueStore::open(data_dir)?);

    Ok(EntryService::new(
        Platform::OfflineCapable,
        store,
        api,
        SyncOptions::default(),
        online,
    ))
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os("SATCHEL_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(default_data_dir)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("satchel")
        .join("entries")
}

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
    pub needs_sync: bool,
    pub references: Vec<String>,
}

pub fn entry_to_list_item(entry: &StoredEntry) -> EntryListItem {
    let now_ms = Utc::now().timestamp_millis();
    let mut references = extract_references(&entry.content);
    references.sort();

    EntryListItem {
        id: entry.id.to_string(),
        title: entry.title.clone(),
        preview: entry_preview(entry, 80),
        content: entry.content.clone(),
        entry_type: entry.entry_type.to_string(),
        date: entry.date.map(|date| date.to_string()),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        relative_time: format_relative_time(entry.updated_at, now_ms),
        needs_sync: entry.needs_sync,
        references,
    }
}

pub fn format_entry_lines(entries: &[StoredEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let id = entry.id.to_string();
            let kind = entry.entry_type.to_string();
            let preview = entry_preview(entry, 40);
            let relative_time = format_relative_time(entry.updated_at, now_ms);
            let pending = if entry.needs_sync { "  (pending)" } else { "" };

            format!("{id:<13}  {kind:<8}  {preview:<40}  {relative_time}{pending}")
        })
        .collect()
}

/// First line of the title, or of the content when the title is blank,
/// collapsed and truncated.
pub fn entry_preview(entry: &StoredEntry, max_chars: usize) -> String {
    let source = if entry.title.trim().is_empty() {
        &entry.content
    } else {
        &entry.title
    };
    let first_line = source.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEntryId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn parse_entry_date(raw: Option<&str>) -> Result<Option<NaiveDate>, CliError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CliError::InvalidDate(trimmed.to_string()))
}

/// Resolve an entry by exact id or unique id prefix.
pub async fn resolve_entry(service: &CliService, raw_id: &str) -> Result<StoredEntry, CliError> {
    let normalized = normalize_entry_identifier(raw_id)?;

    if let Ok(id) = normalized.parse::<EntryId>() {
        if let Some(entry) = service.get_entry(&id).await? {
            return Ok(entry);
        }
    }

    let all = service
        .entries(&EntryFilter::default().with_limit(LIST_ALL_LIMIT))
        .await?;
    let matching: Vec<&StoredEntry> = all
        .iter()
        .filter(|entry| entry.id.to_string().starts_with(&normalized))
        .collect();

    match matching.len() {
        0 => Err(CliError::EntryNotFound(normalized)),
        1 => Ok(matching[0].clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|entry| entry.id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousEntryId(format!(
                "ID prefix '{normalized}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_entry_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let entry_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&entry_content))
}

fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // Fallback for editor commands with args, e.g. "code --wait"
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_entry_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("satchel-entry-{}-{now}.md", std::process::id()))
}

#[cfg(test)]
mod tests {
    use satchel_core::{EntryDraft, EntryType};

    use super::*;

    fn offline_service(dir: &Path) -> CliService {
        build_service(dir, true).unwrap()
    }

    #[test]
    fn normalize_content_trims_and_rejects_empty() {
        assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
        assert_eq!(normalize_content(" \n\t "), None);
    }

    #[test]
    fn normalize_search_query_rejects_empty() {
        assert!(normalize_search_query(" \n\t ").is_err());
        assert_eq!(
            normalize_search_query("  exact phrase  ").unwrap(),
            "exact phrase"
        );
    }

    #[test]
    fn normalize_entry_identifier_rejects_empty() {
        assert!(matches!(
            normalize_entry_identifier(" \n "),
            Err(CliError::EmptyEntryId)
        ));
        assert_eq!(normalize_entry_identifier("  42  ").unwrap(), "42");
    }

    #[test]
    fn parse_entry_date_accepts_iso_dates() {
        assert_eq!(parse_entry_date(None).unwrap(), None);
        assert_eq!(parse_entry_date(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_entry_date(Some("2024-06-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert!(matches!(
            parse_entry_date(Some("June 1st")),
            Err(CliError::InvalidDate(_))
        ));
    }

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    }

    #[test]
    fn entry_preview_prefers_title_and_truncates() {
        let mut entry = StoredEntry::new_offline(EntryDraft::new(
            "A very long title that should be shortened here",
            "content body",
            EntryType::Note,
        ));
        assert_eq!(entry_preview(&entry, 20), "A very long title...");

        entry.title = String::new();
        assert_eq!(entry_preview(&entry, 40), "content body");
    }

    #[test]
    fn default_editor_is_defined() {
        assert!(!default_editor().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_service_captures_and_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        let service = offline_service(dir.path());

        let entry = service
            .create_entry(EntryDraft::new("Trip Notes", "pack the bags", EntryType::Journal))
            .await
            .unwrap();
        assert!(entry.id.is_provisional());
        assert!(!service.is_online());

        let listed = service.entries(&EntryFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].needs_sync);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn entries_survive_service_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let service = offline_service(dir.path());
            service
                .create_entry(EntryDraft::new("Durable", "kept on disk", EntryType::Note))
                .await
                .unwrap();
        }

        let reopened = offline_service(dir.path());
        let listed = reopened.entries(&EntryFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Durable");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_entry_supports_exact_and_prefix_id() {
        let dir = tempfile::tempdir().unwrap();
        let service = offline_service(dir.path());
        let entry = service
            .create_entry(EntryDraft::new("Find me", "x", EntryType::Note))
            .await
            .unwrap();
        let id = entry.id.to_string();

        let by_exact = resolve_entry(&service, &id).await.unwrap();
        assert_eq!(by_exact.title, "Find me");

        // A prefix one character short of the full id is still unique.
        let by_prefix = resolve_entry(&service, &id[..id.len() - 1]).await.unwrap();
        assert_eq!(by_prefix.title, "Find me");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_entry_rejects_ambiguous_prefix_and_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let service = offline_service(dir.path());
        service
            .create_entry(EntryDraft::new("Left", "x", EntryType::Note))
            .await
            .unwrap();
        service
            .create_entry(EntryDraft::new("Right", "x", EntryType::Note))
            .await
            .unwrap();

        // Every provisional id shares the reserved prefix.
        let error = resolve_entry(&service, "offline_").await.unwrap_err();
        assert!(matches!(error, CliError::AmbiguousEntryId(_)));

        let error = resolve_entry(&service, "does-not-exist").await.unwrap_err();
        assert!(matches!(error, CliError::EntryNotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn entry_to_list_item_carries_references_and_sync_flag() {
        let dir = tempfile::tempdir().unwrap();
        let service = offline_service(dir.path());
        let entry = service
            .create_entry(EntryDraft::new(
                "Trip Notes",
                "see #[[42]] and #[[7]]",
                EntryType::Journal,
            ))
            .await
            .unwrap();

        let item = entry_to_list_item(&entry);
        assert!(item.needs_sync);
        assert_eq!(item.entry_type, "journal");
        assert_eq!(item.references, vec!["42".to_string(), "7".to_string()]);
    }
}
