//! CLI entry point for the mod downloader.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mod_downloader_core::parser::validate_mod_url_for;
use mod_downloader_core::{
    CancellationToken, CoreConfig, CoreDownloader, DownloadPlan, DownloadResult, EngineError,
    JsonModRegistry, ProgressReporter, parse_batch_input,
};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod output;
mod progress_ui;

use app_config::{FileConfig, LogLevel};
use cli::Args;

/// Process outcome mapped onto the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Every requested mod is present (exit 0).
    Success,
    /// Nothing could be done (exit 1).
    Failure,
    /// Some mods succeeded, some failed (exit 2).
    Partial,
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

/// Maps success and failure counts onto the process exit outcome.
fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = app_config::load_default_file_config()?;
    init_tracing(&args, loaded.config.log_level);

    debug!(
        ?args,
        config_path = ?loaded.path,
        from_file = loaded.loaded_from_file,
        "CLI arguments parsed"
    );

    let exit = run(args, &loaded.config).await?;
    Ok(exit.into())
}

/// Installs the stderr subscriber.
///
/// Priority: `RUST_LOG` > `--quiet` > `-v` count > config `log_level` > info.
fn init_tracing(args: &Args, file_level: Option<LogLevel>) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_level.map_or("info", LogLevel::as_str),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args, file_config: &FileConfig) -> Result<ProcessExit> {
    let config = file_config.to_core_config(&args);

    let urls = match read_requested_urls(&args, &config)? {
        Ok(urls) => urls,
        Err(message) => {
            eprintln!("Error: {message}");
            return Ok(ProcessExit::Failure);
        }
    };
    if urls.is_empty() {
        info!("No mod URLs found in batch input");
        return Ok(ProcessExit::Success);
    }

    let show_progress = !args.quiet && !args.json && !args.dry_run && io::stderr().is_terminal();
    let (progress, ui_handle) = if show_progress {
        let (reporter, events) = ProgressReporter::channel();
        (reporter, Some(progress_ui::spawn_progress_ui(events)))
    } else {
        (ProgressReporter::disabled(), None)
    };

    let cancel = CancellationToken::new();
    let signal_handle = spawn_interrupt_handler(cancel.clone());

    let mut core = match CoreDownloader::with_portal(config) {
        Ok(core) => core.with_progress(progress).with_cancellation(cancel),
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return Ok(ProcessExit::Failure);
        }
    };
    if let Some(path) = &args.registry {
        core = core.with_registry(Arc::new(JsonModRegistry::open(path).await));
    }

    let exit = if args.dry_run {
        run_dry_run(&core, &urls, args.json).await
    } else {
        run_download(&core, &urls, args.json).await
    };

    // The renderer stops once the core's progress senders are gone.
    drop(core);
    if let Some(handle) = ui_handle {
        let _ = handle.await;
    }
    signal_handle.abort();
    Ok(exit)
}

/// Returns validated mod URLs, or a user-facing validation message.
///
/// I/O errors reading the batch file propagate as `anyhow` errors.
fn read_requested_urls(
    args: &Args,
    config: &CoreConfig,
) -> Result<std::result::Result<Vec<String>, String>> {
    if let Some(path) = &args.batch {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file '{}'", path.display()))?;
        return Ok(match parse_batch_input(&content, &config.portal_base_url) {
            Ok(batch) => {
                info!(%batch, "Parsed batch input");
                Ok(batch.urls)
            }
            Err(e) => Err(e.to_string()),
        });
    }
    Ok(match &args.url {
        Some(url) => validate_mod_url_for(url, &config.portal_base_url)
            .map(|url| vec![url])
            .map_err(|e| e.to_string()),
        None => Ok(Vec::new()),
    })
}

fn spawn_interrupt_handler(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping downloads (partial files are kept)");
            cancel.cancel();
        }
    })
}

async fn run_dry_run(core: &CoreDownloader, urls: &[String], as_json: bool) -> ProcessExit {
    let mut plan = DownloadPlan::from_mods(Vec::new());
    let mut failures = 0usize;
    for url in urls {
        match core.get_download_plan(url).await {
            Ok(resolved) => plan = plan.merge(resolved),
            Err(e) => {
                failures += 1;
                eprintln!("Error: {}", e.user_message());
                if matches!(e, EngineError::Cancelled) {
                    return ProcessExit::Failure;
                }
            }
        }
    }
    if !plan.is_empty() || failures == 0 {
        output::print_plan(&plan, as_json);
    }
    determine_exit_outcome(urls.len() - failures, failures)
}

async fn run_download(core: &CoreDownloader, urls: &[String], as_json: bool) -> ProcessExit {
    let outcome: Result<DownloadResult, EngineError> = if let [url] = urls {
        core.download_mod(url).await
    } else {
        core.download_batch(urls).await
    };
    match outcome {
        Ok(result) => {
            output::print_result(&result, as_json);
            determine_exit_outcome(result.downloaded.len(), result.failed.len())
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ProcessExit::Failure
        }
    }
}
