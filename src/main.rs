//! Main entry point for the zipcrack CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zipcrack::progress::{BarProgress, NoProgress, Progress};
use zipcrack::report::{self, Severity};
use zipcrack::wordlist::MAX_CANDIDATE_LEN;
use zipcrack::{ArchiveReader, Cli, LocalFileReader, RunResult, RunStats, Scheduler};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> Result<u8> {
    if cli.list {
        list_entries(&cli.archive).await?;
        return Ok(0);
    }

    let wordlist = cli
        .wordlist
        .as_deref()
        .context("a wordlist is required unless --list is given")?;

    let progress: Arc<dyn Progress> = if cli.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(BarProgress::new())
    };
    let scheduler = Scheduler::new(cli.config()).with_progress(progress);
    watch_for_cancellation(&scheduler, cli.timeout);

    let report = zipcrack::crack(&cli.archive, wordlist, scheduler).await;

    let rendered = report::render(&report.result);
    match rendered.severity {
        Severity::Success => info!("{}", rendered.message),
        Severity::Warning => warn!("{}", rendered.message),
        Severity::Error => error!("{}", rendered.message),
    }
    if let RunResult::Found(password) = &report.result {
        // Raw bytes, so non-UTF-8 passwords survive a pipe.
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(password.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }
    if report.stats.total_lines > 0 {
        log_stats(&report.stats);
    }

    Ok(report::exit_code(&report.result))
}

/// Stop the workers on Ctrl-C or once the optional deadline passes.
fn watch_for_cancellation(scheduler: &Scheduler, timeout: Option<u64>) {
    let handle = scheduler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && handle.cancel() {
            warn!("Interrupted, waiting for workers to stop");
        }
    });

    if let Some(secs) = timeout {
        let handle = scheduler.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            if handle.cancel() {
                warn!("Timeout of {secs}s reached, waiting for workers to stop");
            }
        });
    }
}

fn log_stats(stats: &RunStats) {
    let examined = stats.examined_total();
    let secs = stats.elapsed.as_secs_f64();
    let rate = if secs > 0.0 { examined as f64 / secs } else { 0.0 };
    info!(
        "Tried {examined}/{} candidates in {secs:.2}s ({rate:.0}/s), {} passed the header check only",
        stats.total_lines, stats.false_positives
    );
    if stats.skipped > 0 {
        warn!("Skipped {} lines longer than {MAX_CANDIDATE_LEN} bytes", stats.skipped);
    }
}

/// Print every entry with its sizes and protection.
async fn list_entries(archive: &Path) -> Result<()> {
    let reader = Arc::new(LocalFileReader::new(archive)?);
    let entries = ArchiveReader::new(reader).list_entries().await?;

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:<24}  Name",
        "Length", "Size", "Cmpr", "Date", "Time", "Protection"
    );
    println!("{}", "-".repeat(96));

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        // Percentage saved; encrypted stored entries can grow, hence signed.
        let ratio = if entry.uncompressed_size > 0 {
            let saved = 100 - (entry.compressed_size as i128 * 100 / entry.uncompressed_size as i128);
            format!("{saved:>4}%")
        } else {
            "  0%".to_string()
        };

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:<24}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio,
            year,
            month,
            day,
            hour,
            minute,
            entry.encryption().to_string(),
            entry.file_name
        );
    }

    println!("{}", "-".repeat(96));
    let protected = entries.iter().filter(|e| e.encryption().is_encrypted()).count();
    println!("{} entries, {} protected", entries.len(), protected);

    Ok(())
}
