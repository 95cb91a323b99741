//! Download orchestration: resolve, plan, then download in a bounded pool.
//!
//! [`CoreDownloader`] ties the resolver and the file downloader together.
//! Resolution runs sequentially ahead of the download phase; downloads then
//! run on a semaphore-bounded set of Tokio tasks, one per mod.
//!
//! # Concurrency Model
//!
//! - Each mod downloads in its own task, holding one semaphore permit
//! - Every worker writes to its own `{name}_{version}.zip` path
//! - Outcomes are collected by joining the task handles in plan order, so
//!   the aggregate [`DownloadResult`] has a single writer
//! - Cancellation (caller token or fail-fast) stops dispatch and interrupts
//!   in-flight transfers, which keep a flushed `.part` file
//!
//! # Example
//!
//! ```no_run
//! use mod_downloader_core::{CoreConfig, CoreDownloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = CoreDownloader::with_portal(CoreConfig::default())?;
//! let plan = downloader
//!     .get_download_plan("https://mods.factorio.com/mod/flib")
//!     .await?;
//! println!("would download {plan}");
//! let result = downloader.execute_plan(&plan).await?;
//! println!("ok: {}, failed: {}", result.downloaded.len(), result.failed.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod plan;
mod result;
mod task;

pub use error::EngineError;
pub use plan::DownloadPlan;
pub use result::DownloadResult;

use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::CoreConfig;
use crate::download::{DownloadError, FileDownloader, ModStatus, ProgressReporter};
use crate::parser::{mod_name_from_url, validate_mod_url_for};
use crate::portal::{ModSource, PortalFetcher};
use crate::registry::ModRegistry;
use crate::resolver::{DependencyResolver, DependencyTree};
use task::{ModOutcome, WorkerContext, download_one};

/// One planned mod: either running in a worker or never dispatched.
enum Slot {
    Spawned {
        name: String,
        handle: JoinHandle<ModOutcome>,
    },
    Undispatched {
        name: String,
        url: String,
    },
}

/// Resolves mods and downloads them with their dependencies.
pub struct CoreDownloader {
    config: CoreConfig,
    resolver: DependencyResolver,
    downloader: FileDownloader,
    progress: ProgressReporter,
    registry: Option<Arc<dyn ModRegistry>>,
    cancel: CancellationToken,
}

impl fmt::Debug for CoreDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreDownloader")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("has_registry", &self.registry.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl CoreDownloader {
    /// Creates a downloader reading mod metadata from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for an out-of-range config and
    /// [`EngineError::ClientInit`] when the file HTTP client cannot be built.
    pub fn new(config: CoreConfig, source: Arc<dyn ModSource>) -> Result<Self, EngineError> {
        config.validate()?;
        let downloader = FileDownloader::new(&config)
            .map_err(|e| EngineError::client_init(e.to_string()))?;
        info!(
            concurrency = config.concurrent_downloads,
            max_retries = config.max_retries,
            output = %config.default_output_path.display(),
            "creating core downloader"
        );
        Ok(Self {
            resolver: DependencyResolver::new(source),
            downloader,
            progress: ProgressReporter::disabled(),
            registry: None,
            cancel: CancellationToken::new(),
            config,
        })
    }

    /// Creates a downloader backed by the live mod portal.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_portal(config: CoreConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let fetcher =
            PortalFetcher::new(&config).map_err(|e| EngineError::client_init(e.to_string()))?;
        Self::new(config, Arc::new(fetcher))
    }

    /// Sends progress events for resolution and downloads to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.resolver = self.resolver.with_progress(progress.clone());
        self.progress = progress;
        self
    }

    /// Records successful downloads in `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn ModRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Cancels resolution and downloads when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Resolves `mod_url` without downloading anything (dry run).
    ///
    /// Only metadata pages are fetched; nothing touches the file system.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a malformed URL (before any request),
    /// [`EngineError::Resolution`] when the root cannot be resolved.
    #[instrument(skip(self))]
    pub async fn get_download_plan(&self, mod_url: &str) -> Result<DownloadPlan, EngineError> {
        let url = validate_mod_url_for(mod_url, &self.config.portal_base_url)?;
        let tree = self.resolve(&url).await?;
        let plan = DownloadPlan::from_tree(&tree);
        info!(
            mod_count = plan.total_count,
            size = ?plan.total_size_estimate,
            "download plan ready"
        );
        Ok(plan)
    }

    /// Downloads `mod_url` and its dependencies.
    ///
    /// Per-mod failures are recorded in [`DownloadResult::failed`].
    ///
    /// # Errors
    ///
    /// Same as [`get_download_plan`](Self::get_download_plan), plus
    /// [`EngineError::Io`] when the output directory cannot be created.
    #[instrument(skip(self))]
    pub async fn download_mod(&self, mod_url: &str) -> Result<DownloadResult, EngineError> {
        let plan = self.get_download_plan(mod_url).await?;
        self.execute_plan(&plan).await
    }

    /// Downloads several root mods and the union of their dependencies.
    ///
    /// Every URL is validated before any request. A root that fails to
    /// resolve is recorded as failed and the batch continues, unless
    /// `fail_fast` is set, in which case its error is returned.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for the first malformed URL,
    /// [`EngineError::Resolution`] under fail-fast, or [`EngineError::Io`].
    #[instrument(skip(self, mod_urls), fields(count = mod_urls.len()))]
    pub async fn download_batch(&self, mod_urls: &[String]) -> Result<DownloadResult, EngineError> {
        let started = Instant::now();
        let urls = mod_urls
            .iter()
            .map(|url| validate_mod_url_for(url, &self.config.portal_base_url))
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = DownloadResult::default();
        let mut plan = DownloadPlan::from_mods(Vec::new());
        for url in &urls {
            match self.resolve(url).await {
                Ok(tree) => plan = plan.merge(DownloadPlan::from_tree(&tree)),
                Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    let name = mod_name_from_url(url).unwrap_or_else(|| url.clone());
                    warn!(mod_name = %name, error = %e, "root mod could not be resolved");
                    self.progress.status(&name, ModStatus::Failed);
                    result.failed.push((name, e.user_message()));
                }
            }
        }

        info!(
            roots = urls.len(),
            mod_count = plan.total_count,
            unresolved = result.failed.len(),
            "batch plan ready"
        );
        result.absorb(self.execute_plan(&plan).await?);
        result.finish(started.elapsed());
        Ok(result)
    }

    /// Downloads every mod in `plan` with the configured worker pool.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] when the output directory cannot be created,
    /// [`EngineError::SemaphoreClosed`] if the pool shuts down mid-dispatch.
    #[instrument(skip(self, plan), fields(mod_count = plan.total_count))]
    pub async fn execute_plan(&self, plan: &DownloadPlan) -> Result<DownloadResult, EngineError> {
        let started = Instant::now();
        let output_dir = self.config.default_output_path.clone();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| EngineError::io(&output_dir, e))?;

        for mod_info in &plan.mods {
            self.progress.status(&mod_info.name, ModStatus::Pending);
        }

        let run_cancel = self.cancel.child_token();
        let ctx = Arc::new(WorkerContext {
            downloader: self
                .downloader
                .clone()
                .with_cancellation(run_cancel.clone()),
            progress: self.progress.clone(),
            registry: self.registry.clone(),
            output_dir,
            resume: self.config.resume,
            skip_existing: self.config.skip_existing,
            fail_fast: self.config.fail_fast,
            run_cancel: run_cancel.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_downloads));

        info!(
            concurrency = self.config.concurrent_downloads,
            "starting downloads"
        );
        let mut slots = Vec::with_capacity(plan.mods.len());
        for mod_info in &plan.mods {
            let acquired = tokio::select! {
                biased;
                () = run_cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => Some(permit),
            };
            let Some(permit) = acquired else {
                slots.push(Slot::Undispatched {
                    name: mod_info.name.clone(),
                    url: mod_info.download_url.clone(),
                });
                continue;
            };
            let permit = permit.map_err(|_| EngineError::SemaphoreClosed)?;

            let ctx = Arc::clone(&ctx);
            let worker_info = mod_info.clone();
            slots.push(Slot::Spawned {
                name: mod_info.name.clone(),
                handle: tokio::spawn(async move {
                    // Released when the download finishes.
                    let _permit = permit;
                    download_one(ctx, worker_info).await
                }),
            });
        }

        let mut result = DownloadResult::default();
        for slot in slots {
            let outcome = match slot {
                Slot::Spawned { name, handle } => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(mod_name = %name, error = %e, "download worker panicked");
                        self.progress.status(&name, ModStatus::Failed);
                        ModOutcome::Failed {
                            name,
                            error: format!("download worker failed: {e}"),
                        }
                    }
                },
                Slot::Undispatched { name, url } => {
                    self.progress.status(&name, ModStatus::Failed);
                    ModOutcome::Failed {
                        name,
                        error: DownloadError::cancelled(url).user_message(),
                    }
                }
            };
            match outcome {
                ModOutcome::Downloaded { name, bytes } => {
                    result.downloaded.push(name);
                    result.total_bytes += bytes;
                }
                ModOutcome::Failed { name, error } => result.failed.push((name, error)),
            }
        }
        result.finish(started.elapsed());

        info!(
            downloaded = result.downloaded.len(),
            failed = result.failed.len(),
            bytes = result.total_bytes,
            duration_secs = result.duration,
            "download run complete"
        );
        Ok(result)
    }

    async fn resolve(&self, url: &str) -> Result<DependencyTree, EngineError> {
        let policy = self.config.optional_policy();
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(EngineError::Cancelled),
            resolved = self.resolver.resolve_with_policy(url, policy) => {
                resolved.map_err(|e| EngineError::resolution(url, e))
            }
        }
    }
}
