use crate::commands::common::CliService;
use crate::error::CliError;

pub async fn run_sync(service: &CliService) -> Result<(), CliError> {
    if !service.is_online() {
        return Err(CliError::SyncNotAvailable);
    }

    let report = service.trigger_sync().await;

    if report.error_count > 0 {
        println!(
            "Synced {} entr{}, {} failed (will retry on the next sync)",
            report.success_count,
            plural_y(report.success_count),
            report.error_count
        );
    } else if report.success_count > 0 {
        println!(
            "Synced {} entr{}",
            report.success_count,
            plural_y(report.success_count)
        );
    } else {
        println!("Nothing to sync");
    }
    Ok(())
}

const fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::commands::common::build_service;

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_requires_connectivity() {
        let dir = tempdir().unwrap();
        let service = build_service(dir.path(), true).unwrap();

        let error = run_sync(&service).await.unwrap_err();
        assert!(matches!(error, CliError::SyncNotAvailable));
    }
}
