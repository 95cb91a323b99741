//! Production [`ModSource`] backed by HTTP page fetches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::html;
use super::{DependencyLink, ModInfo, ModSource};
use crate::config::CoreConfig;
use crate::http_client::{HttpTimeouts, build_http_client};
use crate::parser::mod_name_from_url;
use crate::user_agent;

/// Query string of the outgoing-dependencies listing.
pub const DEPENDENCIES_QUERY: &str = "direction=out&sort=idx&filter=all";

/// Delay before the single retry of a page whose layout could not be parsed.
const PARSE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Scrapes mod pages from the portal.
///
/// Network failures are retried with the configured fixed delay up to
/// `max_retries`; a page missing required elements is refetched once after
/// a short pause before giving up.
#[derive(Debug, Clone)]
pub struct PortalFetcher {
    client: Client,
    portal_base: Url,
    download_base: String,
    max_retries: u32,
    retry_delay: Duration,
    parse_retry_delay: Duration,
}

impl PortalFetcher {
    /// Creates a fetcher from the core configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the portal base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &CoreConfig) -> Result<Self, FetchError> {
        let portal_base = Url::parse(&config.portal_base_url)
            .map_err(|e| FetchError::invalid_url(&config.portal_base_url, e.to_string()))?;
        let client = build_http_client(
            "portal",
            &user_agent::default_portal_user_agent(),
            HttpTimeouts {
                connect_secs: config.page_connect_timeout_secs,
                read_secs: config.page_read_timeout_secs,
            },
        )
        .map_err(FetchError::client)?;

        Ok(Self {
            client,
            portal_base,
            download_base: config.download_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            parse_retry_delay: PARSE_RETRY_DELAY,
        })
    }

    /// Overrides the pause before refetching an unparseable page.
    #[must_use]
    pub fn with_parse_retry_delay(mut self, delay: Duration) -> Self {
        self.parse_retry_delay = delay;
        self
    }

    /// Canonical page URL for a mod name on the configured portal.
    #[must_use]
    pub fn mod_page_url(&self, name: &str) -> String {
        format!(
            "{}/mod/{}",
            self.portal_base.as_str().trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }

    /// Dependencies listing URL for a mod page URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `page_url` is not a mod page.
    pub fn dependencies_url(&self, page_url: &str) -> Result<String, FetchError> {
        let name = mod_name_from_url(page_url)
            .ok_or_else(|| FetchError::invalid_url(page_url, "not a mod page URL"))?;
        Ok(format!(
            "{}/dependencies?{DEPENDENCIES_QUERY}",
            self.page_base_for(page_url, &name)
        ))
    }

    /// Keeps the host of `page_url` so mirrors and test servers are honored.
    fn page_base_for(&self, page_url: &str, name: &str) -> String {
        match Url::parse(page_url) {
            Ok(url) => {
                let origin = url.origin().ascii_serialization();
                format!("{origin}/mod/{}", urlencoding::encode(name))
            }
            Err(_) => self.mod_page_url(name),
        }
    }

    fn mirror_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/{}/{}.zip",
            self.download_base,
            urlencoding::encode(name),
            urlencoding::encode(version)
        )
    }

    /// GET with fixed-delay retry of network failures.
    async fn get_page(&self, url: &str) -> Result<String, FetchError> {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.get_page_once(url).await {
                Ok(body) => return Ok(body),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    warn!(
                        url = %url,
                        attempt,
                        max_attempts,
                        error = %error,
                        "retrying page fetch"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn get_page_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }

    fn parse_mod_page(&self, url: &str, body: &str) -> Result<ModInfo, FetchError> {
        let page_url = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e.to_string()))?;
        let name =
            html::extract_mod_name(body).ok_or_else(|| FetchError::parsing(url, "mod name"))?;
        let version = html::extract_latest_version(body)
            .ok_or_else(|| FetchError::parsing(url, "mod version"))?;
        let download_url = html::extract_download_link(body, &page_url)
            .unwrap_or_else(|| self.mirror_url(&name, &version));

        Ok(ModInfo {
            name,
            version,
            portal_url: url.to_string(),
            download_url,
            size: html::extract_size(body),
            is_optional: false,
        })
    }

    fn dependency_url(&self, page_url: &Url, anchor: &html::DependencyAnchor) -> String {
        anchor
            .href
            .as_deref()
            .and_then(|href| html::absolutize_url(href.trim(), page_url))
            .filter(|absolute| mod_name_from_url(absolute).is_some())
            .unwrap_or_else(|| self.page_base_for(page_url.as_str(), &anchor.name))
    }
}

#[async_trait]
impl ModSource for PortalFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<ModInfo, FetchError> {
        let mut parse_retried = false;
        loop {
            let body = self.get_page(url).await?;
            match self.parse_mod_page(url, &body) {
                Ok(info) => {
                    info!(mod_name = %info.name, version = %info.version, "fetched mod info");
                    return Ok(info);
                }
                Err(error @ FetchError::Parsing { .. }) if !parse_retried => {
                    warn!(url = %url, error = %error, "mod page incomplete; retrying once");
                    parse_retried = true;
                    tokio::time::sleep(self.parse_retry_delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_dependencies(&self, url: &str) -> Result<Vec<DependencyLink>, FetchError> {
        let deps_url = self.dependencies_url(url)?;
        let page_url =
            Url::parse(&deps_url).map_err(|e| FetchError::invalid_url(&deps_url, e.to_string()))?;
        let body = self.get_page(&deps_url).await?;

        let links: Vec<DependencyLink> = html::extract_dependency_anchors(&body)
            .iter()
            .map(|anchor| DependencyLink {
                mod_url: self.dependency_url(&page_url, anchor),
                is_optional: anchor.is_optional,
            })
            .collect();

        debug!(count = links.len(), "parsed dependency links");
        Ok(links)
    }
}
