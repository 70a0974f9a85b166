use satchel_core::EntryFilter;

use crate::commands::common::{
    entry_to_list_item, format_entry_lines, normalize_search_query, CliService, EntryListItem,
};
use crate::error::CliError;

pub async fn run_search(
    service: &CliService,
    query: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let filter = EntryFilter::matching(normalized_query).with_limit(limit);

    let entries = service.entries(&filter).await?;

    if as_json {
        let json_items = entries
            .iter()
            .map(entry_to_list_item)
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_entry_lines(&entries) {
            println!("{line}");
        }
    }

    Ok(())
}
