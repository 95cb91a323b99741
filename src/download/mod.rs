//! File transfer: streaming downloads with resume and retry.
//!
//! # Features
//!
//! - Streaming to `{destination}.part`, renamed into place on completion
//! - Range-request resume guarded by [`RecoveryManager`]
//! - Fixed-delay retry of network failures ([`RetryPolicy`])
//! - Batched byte progress and the [`ProgressReporter`] observer channel
//! - Cancellation that leaves a flushed, resumable partial file

mod client;
mod constants;
mod error;
mod filename;
mod progress;
mod recovery;
mod retry;

pub use client::{DownloadFileResult, FileDownloader, TransferObserver};
pub use constants::{PARTIAL_SUFFIX, PROGRESS_INTERVAL};
pub use error::DownloadError;
pub(crate) use filename::sanitize_filename;
pub use progress::{ModStatus, ProgressEvent, ProgressKind, ProgressReporter};
pub use recovery::RecoveryManager;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
