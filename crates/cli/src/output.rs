use crate::error::CliError;
use engine_core::progress::ProgressReport;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_progress(report: &ProgressReport) {
    println!("Session:   {}", report.session_id);
    println!("Status:    {}", report.status);
    if report.total_estimated {
        println!("Total:     ~{} (estimate)", report.items_total);
    } else {
        println!("Total:     {}", report.items_total);
    }
    println!(
        "Processed: {} ({}%)  ok={} failed={} skipped={}",
        report.items_processed,
        report.percentage,
        report.items_succeeded,
        report.items_failed,
        report.items_skipped
    );
    if let Some(message) = &report.message {
        println!("Message:   {message}");
    }
}
