use crate::commands::common::{resolve_entry, CliService};
use crate::error::CliError;

pub async fn run_delete(service: &CliService, id: &str) -> Result<(), CliError> {
    let entry = resolve_entry(service, id).await?;
    service.delete_entry(&entry.id).await?;
    println!("{}", entry.id);
    Ok(())
}
