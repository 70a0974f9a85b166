use satchel_core::EntryDraft;

use crate::cli::EntryTypeArg;
use crate::commands::common::{
    capture_editor_input, normalize_content, parse_entry_date, read_piped_stdin, CliService,
};
use crate::error::CliError;

pub async fn run_add(
    service: &CliService,
    content_parts: &[String],
    title: Option<&str>,
    entry_type: EntryTypeArg,
    date: Option<&str>,
) -> Result<(), CliError> {
    let content = resolve_entry_content(content_parts)?;
    let date = parse_entry_date(date)?;

    let mut draft = EntryDraft::new(title.unwrap_or_default(), content, entry_type.into());
    if let Some(date) = date {
        draft = draft.with_date(date);
    }

    let entry = service.create_entry(draft).await?;
    println!("{}", entry.id);
    Ok(())
}

fn resolve_entry_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_entry_content_joins_arguments() {
        let parts = vec!["pack".to_string(), "the".to_string(), "bags".to_string()];
        assert_eq!(resolve_entry_content(&parts).unwrap(), "pack the bags");
    }
}
