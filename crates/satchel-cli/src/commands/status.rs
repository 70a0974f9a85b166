use chrono::Utc;

use crate::commands::common::{format_relative_time, CliService};

pub fn run_status(service: &CliService) {
    let state = if service.is_online() {
        "online"
    } else {
        "offline"
    };
    println!("State:        {state}");

    let pending = service.pending_count();
    if pending == 0 {
        println!("Pending:      none");
    } else {
        println!("Pending:      {pending} change(s) waiting to sync");
    }

    match service.last_synced_at() {
        Some(timestamp_ms) => {
            let relative = format_relative_time(timestamp_ms, Utc::now().timestamp_millis());
            println!("Last sync:    {relative}");
        }
        None => println!("Last sync:    never (this run)"),
    }
}
