//! Single-file downloader with streaming I/O, resume and fixed-delay retry.
//!
//! Bytes are streamed into `{destination}.part` and the partial file is
//! renamed over the destination once the expected length has arrived. A
//! cancelled or failed transfer leaves a flushed, resumable partial file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::constants::{PROGRESS_INTERVAL, WRITE_BUFFER_BYTES};
use super::error::DownloadError;
use super::recovery::RecoveryManager;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::config::CoreConfig;
use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent;

/// Receives transfer progress from [`FileDownloader::download`].
///
/// Any `Fn(u64)` closure is an observer that only cares about byte deltas.
pub trait TransferObserver: Send + Sync {
    /// Bytes received since the previous call. Batched, at most every 200ms
    /// plus one final flush.
    fn on_bytes(&self, delta: u64);

    /// A transfer attempt started at `offset` of an expected `total`.
    fn on_start(&self, _total: Option<u64>, _offset: u64) {}

    /// Attempt `attempt` of `max_attempts` is about to begin.
    fn on_retry(&self, _attempt: u32, _max_attempts: u32) {}
}

impl<F> TransferObserver for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_bytes(&self, delta: u64) {
        self(delta);
    }
}

/// Outcome of one [`FileDownloader::download`] call.
#[derive(Debug)]
pub struct DownloadFileResult {
    /// Final output path.
    pub path: PathBuf,
    /// Size of the final file (or of the partial file on failure).
    pub bytes_downloaded: u64,
    /// Expected file size when known.
    pub content_length: Option<u64>,
    /// Whether the successful attempt continued from a partial file.
    pub resumed: bool,
    /// Attempts made, including the first.
    pub attempts: u32,
    pub duration: Duration,
    /// Last error when the download failed.
    pub error: Option<DownloadError>,
}

impl DownloadFileResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Bytes accounted for by one successful attempt.
struct AttemptOutcome {
    bytes: u64,
    total: Option<u64>,
    resumed: bool,
}

/// Downloads one file at a time; clone-cheap and shareable across workers.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use mod_downloader_core::CoreConfig;
/// use mod_downloader_core::download::FileDownloader;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = FileDownloader::new(&CoreConfig::default())?;
/// let result = downloader
///     .download(
///         "https://mods-storage.re146.dev/flib/0.13.1.zip",
///         Path::new("./mods/flib_0.13.1.zip"),
///         true,
///         &|delta: u64| println!("+{delta} bytes"),
///     )
///     .await;
/// println!("ok: {}", result.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileDownloader {
    client: Client,
    recovery: RecoveryManager,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl FileDownloader {
    /// Creates a downloader with file timeouts and retry settings from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientInit`] when the HTTP client cannot be built.
    pub fn new(config: &CoreConfig) -> Result<Self, DownloadError> {
        let client = build_http_client(
            "download",
            &user_agent::default_download_user_agent(),
            HttpTimeouts {
                connect_secs: config.download_connect_timeout_secs,
                read_secs: config.download_read_timeout_secs,
            },
        )
        .map_err(DownloadError::client_init)?;

        Ok(Self {
            recovery: RecoveryManager::new(client.clone()),
            client,
            policy: RetryPolicy::new(config.max_retries, config.retry_delay),
            cancel: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stops in-flight and future transfers when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn recovery(&self) -> &RecoveryManager {
        &self.recovery
    }

    /// Downloads `url` to `destination`, retrying network failures.
    ///
    /// Never returns an error directly: a failed download is a result whose
    /// `error` holds the last failure.
    #[instrument(skip(self, observer), fields(url = %url, path = %destination.display()))]
    pub async fn download<O>(
        &self,
        url: &str,
        destination: &Path,
        resume: bool,
        observer: &O,
    ) -> DownloadFileResult
    where
        O: TransferObserver + ?Sized,
    {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        let failed = |error: DownloadError, attempt: u32, bytes: u64| DownloadFileResult {
            path: destination.to_path_buf(),
            bytes_downloaded: bytes,
            content_length: None,
            resumed: false,
            attempts: attempt,
            duration: started.elapsed(),
            error: Some(error),
        };

        if Url::parse(url).is_err() {
            return failed(DownloadError::invalid_url(url), attempt, 0);
        }

        loop {
            if self.cancel.is_cancelled() {
                let bytes = self.recovery.resume_position(destination).await;
                return failed(DownloadError::cancelled(url), attempt, bytes);
            }

            debug!(attempt, max_attempts, "starting download attempt");
            let error = match self.attempt(url, destination, resume, observer).await {
                Ok(outcome) => {
                    let partial = RecoveryManager::partial_path(destination);
                    if let Err(e) = self.recovery.finalize(&partial, destination).await {
                        error!(error = %e, "failed to move partial file into place");
                        return failed(e, attempt, outcome.bytes);
                    }
                    info!(
                        bytes = outcome.bytes,
                        resumed = outcome.resumed,
                        attempts = attempt,
                        "download complete"
                    );
                    return DownloadFileResult {
                        path: destination.to_path_buf(),
                        bytes_downloaded: outcome.bytes,
                        content_length: outcome.total,
                        resumed: outcome.resumed,
                        attempts: attempt,
                        duration: started.elapsed(),
                        error: None,
                    };
                }
                Err(error) => error,
            };

            match self.policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        attempt = next,
                        max_attempts,
                        error = %error,
                        delay_ms = delay.as_millis(),
                        "retrying download"
                    );
                    observer.on_retry(next, max_attempts);
                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            let bytes = self.recovery.resume_position(destination).await;
                            return failed(DownloadError::cancelled(url), attempt, bytes);
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    let bytes = self.recovery.resume_position(destination).await;
                    if matches!(error, DownloadError::Cancelled { .. }) {
                        info!(bytes, "download cancelled; partial file kept");
                    } else {
                        error!(error = %error, attempts = attempt, reason, "download failed");
                    }
                    return failed(error, attempt, bytes);
                }
            }
        }
    }

    /// One GET, streamed into the partial file.
    async fn attempt<O>(
        &self,
        url: &str,
        destination: &Path,
        resume: bool,
        observer: &O,
    ) -> Result<AttemptOutcome, DownloadError>
    where
        O: TransferObserver + ?Sized,
    {
        let partial = RecoveryManager::partial_path(destination);
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let resumable = resume
            && tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(DownloadError::cancelled(url)),
                supported = self.recovery.can_resume(destination, url) => supported,
            };
        let mut offset = if resumable {
            self.recovery.resume_position(destination).await
        } else {
            0
        };

        let mut response = self.send(url, offset).await?;
        if offset > 0 && response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            warn!(
                bytes = offset,
                "server rejected resume offset; discarding partial file"
            );
            self.recovery.cleanup(destination).await?;
            offset = 0;
            response = self.send(url, 0).await?;
        }
        if !response.status().is_success() {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }

        let honored_range = offset > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        if offset > 0 && !honored_range {
            warn!(
                bytes = offset,
                status = response.status().as_u16(),
                "server ignored range request; discarding partial file and restarting"
            );
            offset = 0;
        }

        let total = if honored_range {
            content_range_total(&response)
                .or_else(|| response.content_length().map(|len| offset + len))
        } else {
            response.content_length()
        };
        if let Some(expected) = total
            && offset > expected
        {
            self.recovery.cleanup(destination).await?;
            return Err(DownloadError::integrity(&partial, expected, offset));
        }

        let file = if honored_range {
            OpenOptions::new()
                .append(true)
                .open(&partial)
                .await
                .map_err(|e| DownloadError::io(&partial, e))?
        } else {
            File::create(&partial)
                .await
                .map_err(|e| DownloadError::io(&partial, e))?
        };

        observer.on_start(total, offset);
        let written = self
            .stream_to_file(file, response, url, &partial, observer)
            .await?;
        let final_size = offset + written;

        if let Some(expected) = total
            && expected != final_size
        {
            if final_size > expected {
                self.recovery.cleanup(destination).await?;
            }
            return Err(DownloadError::integrity(&partial, expected, final_size));
        }

        Ok(AttemptOutcome {
            bytes: final_size,
            total,
            resumed: honored_range,
        })
    }

    /// GET until response headers arrive; cancellation interrupts the wait.
    async fn send(&self, url: &str, offset: u64) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DownloadError::cancelled(url)),
            response = request.send() => {
                response.map_err(|e| DownloadError::from_reqwest(url, e))
            }
        }
    }

    /// Streams the response body to `file`, returning bytes written.
    ///
    /// The writer is flushed on every exit path so the partial file always
    /// holds exactly the bytes that were reported.
    async fn stream_to_file<O>(
        &self,
        file: File,
        response: reqwest::Response,
        url: &str,
        partial: &Path,
        observer: &O,
    ) -> Result<u64, DownloadError>
    where
        O: TransferObserver + ?Sized,
    {
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        let mut unreported: u64 = 0;
        let mut last_report = Instant::now();

        let outcome = loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Err(DownloadError::cancelled(url)),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break Ok(());
            };
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => break Err(DownloadError::from_reqwest(url, e)),
            };
            if let Err(e) = writer.write_all(&chunk).await {
                break Err(DownloadError::io(partial, e));
            }
            written += chunk.len() as u64;
            unreported += chunk.len() as u64;
            if last_report.elapsed() >= PROGRESS_INTERVAL {
                observer.on_bytes(unreported);
                unreported = 0;
                last_report = Instant::now();
            }
        };

        let flushed = writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(partial, e));
        observer.on_bytes(unreported);
        outcome?;
        flushed?;
        Ok(written)
    }
}

/// Total length from `Content-Range: bytes start-end/total`.
fn content_range_total(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('/').next())
        .and_then(|total| total.trim().parse().ok())
}
