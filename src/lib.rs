//! Mod Downloader Core Library
//!
//! Resolves a game mod's dependency tree from the mod portal and downloads
//! every archive concurrently, with fixed-delay retry and `.part`-file resume.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Mod URL validation and batch input parsing
//! - [`portal`] - Mod page fetching and scraping behind the [`ModSource`] trait
//! - [`resolver`] - Dependency tree resolution and download-list flattening
//! - [`download`] - Streaming file downloads with resume, retry and progress
//! - [`engine`] - [`CoreDownloader`]: plans and runs the worker pool
//! - [`registry`] - Observer recording successfully downloaded mods
//! - [`config`] - The [`CoreConfig`] snapshot passed in at construction
//! - [`failure`] - Error taxonomy and remedy text

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod engine;
pub mod failure;
pub(crate) mod http_client;
pub mod parser;
pub mod portal;
pub mod registry;
pub mod resolver;
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{CoreConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, default_mods_dir};
pub use download::{
    DownloadError, FileDownloader, ModStatus, ProgressEvent, ProgressKind, ProgressReporter,
    RetryPolicy,
};
pub use engine::{CoreDownloader, DownloadPlan, DownloadResult, EngineError};
pub use failure::ErrorCategory;
pub use parser::{BatchInput, ValidationError, parse_batch_input, validate_mod_url};
pub use portal::{FetchError, ModInfo, ModSource, PortalFetcher};
pub use registry::{JsonModRegistry, ModEntry, ModRegistry, RegistryError};
pub use resolver::{DependencyResolver, DependencyTree, OptionalPolicy, get_download_list};

// Re-export the cancellation token type accepted by CoreDownloader
pub use tokio_util::sync::CancellationToken;
