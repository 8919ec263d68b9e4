//! CLI entry point for dvrsync.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use dvrsync_core::catalog::catalog_path;
use dvrsync_core::{
    Catalog, HttpClient, SyncConfig, SyncReport, SyncRunner, TunerRef, load_config, scrub_library,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

/// Outcome mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    /// Some work succeeded, some failed; the next run retries the rest.
    Partial,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.default_log_level());
    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ProcessExit::Failure.into()
        }
    }
}

fn init_tracing(default_level: &str) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ProcessExit> {
    let (path, config) = load_config(args.config.as_deref())?;
    debug!(path = %path.display(), "loaded config");

    match args.command {
        Command::Sync => run_sync(config, args.quiet).await,
        Command::Tuners { lineup, guide } => run_tuners(&config, lineup, guide).await,
        Command::Scrub => run_scrub(&config).await,
    }
}

async fn run_sync(config: SyncConfig, quiet: bool) -> Result<ProcessExit> {
    if config.tuners.is_empty() {
        warn!("no tuners configured; nothing to do");
        return Ok(ProcessExit::Success);
    }
    let runner = SyncRunner::open(config)
        .await
        .context("failed to open catalogs")?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let bar = progress_bar(should_use_progress_bar(
        io::stderr().is_terminal(),
        quiet,
        is_dumb_terminal(),
    ));
    let bar_handle = bar.clone();
    let mut on_progress = move |percent: f64| {
        // Clamped to 0..=100 so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        bar_handle.set_position(percent.clamp(0.0, 100.0).round() as u64);
    };
    let report = runner.run(&interrupted, &mut on_progress).await;
    bar.finish_and_clear();
    let report = report?;

    Ok(determine_exit_outcome(&report))
}

fn determine_exit_outcome(report: &SyncReport) -> ProcessExit {
    if report.interrupted {
        warn!(%report, "Interrupted. Run again to resume.");
        return ProcessExit::Failure;
    }
    if !report.has_failures() {
        ProcessExit::Success
    } else if report.downloaded + report.deleted + report.tuners_discovered > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn should_use_progress_bar(stderr_is_terminal: bool, quiet: bool, dumb_terminal: bool) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

async fn run_tuners(config: &SyncConfig, lineup: bool, guide: bool) -> Result<ProcessExit> {
    let client = HttpClient::new_with_timeouts(
        config.http.connect_timeout_secs,
        config.http.read_timeout_secs,
    );
    let mut failures = 0usize;
    for address in &config.tuners {
        let tuner_ref = TunerRef::new(address);
        let tuner = match tuner_ref.discover(&client, config.schema).await {
            Ok(Some(tuner)) => tuner,
            Ok(None) => {
                println!("{}: discovery response rejected", tuner_ref.base_url());
                failures += 1;
                continue;
            }
            Err(e) => {
                println!("{}: {e}", tuner_ref.base_url());
                failures += 1;
                continue;
            }
        };

        println!(
            "{} ({}) {} firmware {} - {} tuner(s) at {}",
            tuner.friendly_name,
            tuner.device_id,
            tuner.model_number,
            tuner.firmware_version,
            tuner.tuner_count,
            tuner.base_url
        );
        match &tuner.storage {
            Some(storage) => println!(
                "  storage {}: {} MiB free of {} MiB",
                storage.id,
                storage.free_space / dvrsync_core::download::constants::MIB,
                storage.total_space / dvrsync_core::download::constants::MIB
            ),
            None => println!("  no DVR storage"),
        }
        if lineup {
            match tuner.lineup(&client, config.schema).await {
                Ok(channels) => {
                    let hd = channels.iter().filter(|c| c.is_hd).count();
                    println!("  lineup: {} channel(s), {hd} HD", channels.len());
                }
                Err(e) => {
                    println!("  lineup: {e}");
                    failures += 1;
                }
            }
        }
        if guide {
            match tuner.guide(&client, &config.guide_url, config.schema).await {
                Ok(channels) => {
                    let programs: usize = channels.iter().map(|c| c.programs.len()).sum();
                    let scheduled = channels
                        .iter()
                        .flat_map(|c| &c.programs)
                        .filter(|p| p.recording)
                        .count();
                    println!(
                        "  guide: {} channel(s), {programs} program(s), {scheduled} scheduled to record",
                        channels.len()
                    );
                }
                Err(e) => {
                    println!("  guide: {e}");
                    failures += 1;
                }
            }
        }
    }

    Ok(if failures == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    })
}

async fn run_scrub(config: &SyncConfig) -> Result<ProcessExit> {
    let roots = config.library_roots();
    let mut clean = true;
    for (category, root) in roots.configured() {
        if !catalog_path(root).exists() {
            println!("{category}: no catalog at {}", root.display());
            continue;
        }
        let catalog = Catalog::open(root)
            .await
            .with_context(|| format!("failed to open {category} catalog"))?;
        let report = scrub_library(&catalog, &roots, root).await?;
        catalog.close().await;

        info!(
            category = %category,
            untracked = report.untracked_files.len(),
            missing = report.missing_files.len(),
            "scrubbed library"
        );
        for path in &report.untracked_files {
            println!("{category}: untracked {}", path.display());
        }
        for (id, path) in &report.missing_files {
            println!("{category}: missing {} (episode {id})", path.display());
        }
        clean &= report.is_clean();
    }
    Ok(if clean {
        ProcessExit::Success
    } else {
        ProcessExit::Partial
    })
}
