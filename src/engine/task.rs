//! Per-mod download worker.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::download::{FileDownloader, ModStatus, ProgressReporter, TransferObserver};
use crate::portal::ModInfo;
use crate::registry::{ModEntry, ModRegistry};

/// State shared by every worker of one run.
pub(crate) struct WorkerContext {
    pub(crate) downloader: FileDownloader,
    pub(crate) progress: ProgressReporter,
    pub(crate) registry: Option<Arc<dyn ModRegistry>>,
    pub(crate) output_dir: PathBuf,
    pub(crate) resume: bool,
    pub(crate) skip_existing: bool,
    pub(crate) fail_fast: bool,
    /// Run-scoped token; cancelled by the first failure under fail-fast.
    pub(crate) run_cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModOutcome {
    Downloaded { name: String, bytes: u64 },
    Failed { name: String, error: String },
}

/// Forwards transfer callbacks onto the progress channel for one mod.
struct ModObserver<'a> {
    progress: &'a ProgressReporter,
    mod_name: &'a str,
}

impl TransferObserver for ModObserver<'_> {
    fn on_bytes(&self, delta: u64) {
        self.progress.bytes(self.mod_name, delta);
    }

    fn on_start(&self, total: Option<u64>, offset: u64) {
        self.progress.started(self.mod_name, total, offset);
    }

    fn on_retry(&self, attempt: u32, max_attempts: u32) {
        self.progress.retrying(self.mod_name, attempt, max_attempts);
    }
}

/// Downloads one mod; never panics and never returns an error.
#[instrument(skip(ctx, mod_info), fields(mod_name = %mod_info.name, version = %mod_info.version))]
pub(crate) async fn download_one(ctx: Arc<WorkerContext>, mod_info: ModInfo) -> ModOutcome {
    let name = mod_info.name.clone();
    let destination = ctx.output_dir.join(mod_info.file_name());

    if ctx.skip_existing && is_file(&destination).await {
        info!(path = %destination.display(), "archive already present; skipping download");
        ctx.progress.status(&name, ModStatus::Succeeded);
        return ModOutcome::Downloaded { name, bytes: 0 };
    }

    ctx.progress.status(&name, ModStatus::Downloading);
    let observer = ModObserver {
        progress: &ctx.progress,
        mod_name: &name,
    };
    let result = ctx
        .downloader
        .download(&mod_info.download_url, &destination, ctx.resume, &observer)
        .await;

    match result.error {
        None => {
            ctx.progress.status(&name, ModStatus::Succeeded);
            if let Some(registry) = &ctx.registry {
                let entry = ModEntry::now(
                    &mod_info.name,
                    &mod_info.version,
                    &result.path,
                    result.bytes_downloaded,
                );
                if let Err(e) = registry.record(entry).await {
                    warn!(error = %e, "failed to record mod in registry");
                }
            }
            ModOutcome::Downloaded {
                name,
                bytes: result.bytes_downloaded,
            }
        }
        Some(error) => {
            ctx.progress.status(&name, ModStatus::Failed);
            if ctx.fail_fast && !ctx.run_cancel.is_cancelled() {
                warn!(error = %error, "fail-fast: cancelling remaining downloads");
                ctx.run_cancel.cancel();
            } else {
                debug!(attempts = result.attempts, "mod download failed");
            }
            ModOutcome::Failed {
                name,
                error: error.user_message(),
            }
        }
    }
}

async fn is_file(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}
