//! Mod portal URL validation and name extraction.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::error::{MAX_URL_LENGTH, ValidationError};
use crate::config::DEFAULT_PORTAL_BASE_URL;

/// Path of a mod page: `/mod/<name>` with an optional `/downloads/<n>` suffix.
#[allow(clippy::expect_used)]
static MOD_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern, safe to panic
    Regex::new(r"^/mod/([A-Za-z0-9_.%-]+)(?:/downloads/\d+)?/?$").expect("mod path regex is valid")
});

/// Validates a mod page URL against the public portal.
///
/// Returns the canonical page URL (`https://mods.factorio.com/mod/<name>`),
/// with any `/downloads/<n>` suffix, query or fragment removed.
///
/// # Errors
///
/// Returns [`ValidationError`] when the URL is malformed, too long, or does
/// not point at a mod page on the portal.
///
/// # Examples
///
/// ```
/// use mod_downloader_core::parser::validate_mod_url;
///
/// let url = validate_mod_url("https://mods.factorio.com/mod/Krastorio2/downloads/12").unwrap();
/// assert_eq!(url, "https://mods.factorio.com/mod/Krastorio2");
/// assert!(validate_mod_url("https://example.com/mod/x").is_err());
/// ```
pub fn validate_mod_url(input: &str) -> Result<String, ValidationError> {
    validate_mod_url_for(input, DEFAULT_PORTAL_BASE_URL)
}

/// Validates a mod page URL against a specific portal base URL.
///
/// # Errors
///
/// See [`validate_mod_url`].
pub fn validate_mod_url_for(input: &str, portal_base: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ValidationError::too_long(trimmed));
    }

    let parsed =
        Url::parse(trimmed).map_err(|e| ValidationError::malformed(trimmed, &e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::malformed(
            trimmed,
            &format!("scheme '{}' is not supported", parsed.scheme()),
        ));
    }

    let base = Url::parse(portal_base)
        .map_err(|e| ValidationError::malformed(portal_base, &e.to_string()))?;
    if parsed.host_str() != base.host_str()
        || parsed.port_or_known_default() != base.port_or_known_default()
    {
        debug!(url = %trimmed, expected_host = ?base.host_str(), "URL host is not the mod portal");
        return Err(ValidationError::not_a_mod_url(trimmed));
    }

    let Some(captures) = MOD_PATH_PATTERN.captures(parsed.path()) else {
        return Err(ValidationError::not_a_mod_url(trimmed));
    };
    let name = &captures[1];

    Ok(format!("{}/mod/{name}", portal_base.trim_end_matches('/')))
}

/// Extracts the decoded mod name from a mod page URL or path.
///
/// Works on absolute URLs and on site-relative hrefs (`/mod/<name>`).
#[must_use]
pub fn mod_name_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "mod" {
            let raw = segments.next()?;
            let decoded = urlencoding::decode(raw)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_else(|_| raw.to_string());
            return (!decoded.is_empty()).then_some(decoded);
        }
    }
    None
}

/// Identity key (case-insensitive mod name) derived from a mod page URL.
#[must_use]
pub fn mod_identity_from_url(url: &str) -> Option<String> {
    mod_name_from_url(url).map(|name| name.to_lowercase())
}
