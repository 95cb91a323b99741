//! Mock mod portal and archive mirror served by wiremock.

use std::path::Path;
use std::time::Duration;

use mod_downloader_core::CoreConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mirror prefix under the mock server root.
pub const FILES_PREFIX: &str = "/files";

pub const VERSION: &str = "1.0.0";

/// Mod page in the portal's layout.
#[must_use]
pub fn mod_page(name: &str, size: Option<u64>) -> String {
    let size_dd = size.map_or_else(String::new, |bytes| {
        format!(r#"<dt>Size</dt><dd id="mod-info-size" data-bytes="{bytes}">{bytes} B</dd>"#)
    });
    format!(
        r#"<html><body>
<dl><dt>Name</dt><dd id="mod-info-name">{name}</dd>{size_dd}</dl>
<select id="mod-version">
  <option value="0.9.0">0.9.0</option>
  <option value="{VERSION}">{VERSION} (last)</option>
</select>
</body></html>"#
    )
}

/// Dependencies page listing `(name, is_optional)` anchors in order.
#[must_use]
pub fn dependencies_page(deps: &[(&str, bool)]) -> String {
    let rows: String = deps
        .iter()
        .map(|(dep, optional)| {
            let class = if *optional {
                "mod-dependencies-optional"
            } else {
                "mod-dependencies-required"
            };
            format!(r#"<tr><td><a class="{class}" href="/mod/{dep}">{dep}</a></td></tr>"#)
        })
        .collect();
    format!("<html><body><table>{rows}</table></body></html>")
}

#[must_use]
pub fn page_url(server: &MockServer, name: &str) -> String {
    format!("{}/mod/{name}", server.uri())
}

#[must_use]
pub fn archive_path(name: &str) -> String {
    format!("{FILES_PREFIX}/{name}/{VERSION}.zip")
}

/// Mounts the mod page and dependencies page of `name`.
pub async fn mount_mod(server: &MockServer, name: &str, size: Option<u64>, deps: &[(&str, bool)]) {
    Mock::given(method("GET"))
        .and(path(format!("/mod/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(mod_page(name, size)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/mod/{name}/dependencies")))
        .and(query_param("direction", "out"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dependencies_page(deps)))
        .mount(server)
        .await;
}

/// Mounts the mirror archive of `name`.
pub async fn mount_archive(server: &MockServer, name: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(archive_path(name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Config pointing portal and mirror at the mock server, with fast retries.
#[must_use]
pub fn config(server: &MockServer, output: &Path) -> CoreConfig {
    CoreConfig {
        portal_base_url: server.uri(),
        download_base_url: format!("{}{FILES_PREFIX}", server.uri()),
        default_output_path: output.to_path_buf(),
        max_retries: 1,
        retry_delay: Duration::from_millis(10),
        ..CoreConfig::default()
    }
}
