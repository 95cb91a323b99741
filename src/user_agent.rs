//! Shared User-Agent strings for page and file HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/mod-downloader";

/// User-Agent for file downloads from the mirror.
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("mod-downloader/{version} (+{PROJECT_UA_URL})")
}

/// User-Agent for mod portal page fetches.
#[must_use]
pub(crate) fn default_portal_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("mod-downloader/{version} (portal-scraper; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_format_consistency() {
        let download_ua = default_download_user_agent();
        let portal_ua = default_portal_user_agent();
        assert!(download_ua.contains(PROJECT_UA_URL));
        assert!(portal_ua.contains(PROJECT_UA_URL));
        for ua in [&download_ua, &portal_ua] {
            assert_eq!(
                Some(env!("CARGO_PKG_VERSION")),
                ua.strip_prefix("mod-downloader/")
                    .and_then(|s| s.split(' ').next()),
                "UA must carry crate version: {ua}"
            );
        }
    }
}
