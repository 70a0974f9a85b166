use satchel_core::EntryFilter;

use crate::cli::EntryTypeArg;
use crate::commands::common::{
    entry_to_list_item, format_entry_lines, CliService, EntryListItem,
};
use crate::error::CliError;

pub async fn run_list(
    service: &CliService,
    limit: usize,
    entry_type: Option<EntryTypeArg>,
    as_json: bool,
) -> Result<(), CliError> {
    let mut filter = EntryFilter::default().with_limit(limit);
    filter.entry_type = entry_type.map(Into::into);

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
