//! Attendance kiosk: reads decoded QR text from a keyboard-wedge scanner on
//! stdin, one code per line, and prints a notification for every scan.

use std::sync::Arc;

use academy::config::Config;
use academy::db::init_db;
use academy::scan::{LineSource, ScanLoop, ScanReport, drive, mysql_pipeline};
use academy::store::MySqlStore;
use academy::telemetry;
use academy::utils::student_cache::StudentCache;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;

fn notification(report: &ScanReport) -> String {
    let status = if report.outcome.is_committed() { "OK" } else { "!!" };
    match &report.student {
        Some(s) => format!(
            "[{status}] {} | {} | CNIC {} | {}",
            report.outcome.message(),
            s.name,
            s.national_id,
            s.course
        ),
        None => format!("[{status}] {}", report.outcome.message()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let _guard = telemetry::init(&config, "scanner.log");

    let pool = init_db(&config.database_url).await?;
    let cache = StudentCache::new(config.student_cache_capacity, config.student_cache_ttl);
    let pipeline = Arc::new(mysql_pipeline(
        MySqlStore::new(pool),
        cache,
        config.ledger_clock,
    ));

    let (outcome_tx, mut outcome_rx) = mpsc::channel::<ScanReport>(16);
    let (handle, worker) = ScanLoop::spawn(pipeline, outcome_tx);

    let printer = tokio::spawn(async move {
        while let Some(report) = outcome_rx.recv().await {
            println!("{}", notification(&report));
        }
    });

    info!("Scanner ready, reading codes from stdin");
    println!("Student Online Attendance System: scan a card");

    let source = LineSource::new(BufReader::new(tokio::io::stdin()));
    let stats = drive(source, &handle).await;

    // Closing the last handle lets the loop finish the scan in flight and stop.
    drop(handle);
    worker.await?;
    printer.await?;

    info!(
        accepted = stats.accepted,
        dropped = stats.dropped,
        "Scanner stopped"
    );
    Ok(())
}
