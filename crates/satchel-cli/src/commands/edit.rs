use satchel_core::EntryPatch;

use crate::commands::common::{capture_editor_input_with_initial, resolve_entry, CliService};
use crate::error::CliError;

pub async fn run_edit(service: &CliService, id: &str) -> Result<(), CliError> {
    let entry = resolve_entry(service, id).await?;

    let Some(edited_content) = capture_editor_input_with_initial(&entry.content)? else {
        return Err(CliError::EmptyEditedContent);
    };

    if edited_content == entry.content {
        println!("{}", entry.id);
        return Ok(());
    }

    let updated = service
        .update_entry(&entry.id, &EntryPatch::content(edited_content))
        .await?;
    println!("{}", updated.id);
    Ok(())
}
