//! CLI output formatting: plan previews and run summaries on stdout.

use mod_downloader_core::{DownloadPlan, DownloadResult};
use serde_json::{Value, json};

/// Formats a byte count with binary units, e.g. `1.5 MiB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in UNITS.iter().skip(1).copied() {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Human-readable dry-run preview.
#[must_use]
pub fn plan_lines(plan: &DownloadPlan) -> Vec<String> {
    let mut lines = Vec::with_capacity(plan.mods.len() + 2);
    lines.push(format!("Download plan: {} mod(s)", plan.total_count));
    for info in &plan.mods {
        let size = info
            .size
            .map_or_else(|| "unknown size".to_string(), format_bytes);
        let optional = if info.is_optional { " [optional]" } else { "" };
        lines.push(format!(
            "  - {} {} ({size}){optional}",
            info.name, info.version
        ));
    }
    match plan.total_size_estimate {
        Some(bytes) => lines.push(format!("Total size: {}", format_bytes(bytes))),
        None => lines.push("Total size: unknown".to_string()),
    }
    lines.push("Dry run - no files downloaded".to_string());
    lines
}

#[must_use]
pub fn plan_json(plan: &DownloadPlan) -> Value {
    json!({
        "dry_run": true,
        "total_count": plan.total_count,
        "total_size_estimate": plan.total_size_estimate,
        "mods": plan.mods,
    })
}

/// Human-readable run summary; failures enumerate each mod with its remedy.
#[must_use]
pub fn result_lines(result: &DownloadResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Downloaded {} mod(s), {} failed, {} in {:.1}s",
        result.downloaded.len(),
        result.failed.len(),
        format_bytes(result.total_bytes),
        result.duration
    )];
    for name in &result.downloaded {
        lines.push(format!("  [ok] {name}"));
    }
    for (name, error) in &result.failed {
        let mut error_lines = error.lines();
        lines.push(format!(
            "  [failed] {name}: {}",
            error_lines.next().unwrap_or_default()
        ));
        lines.extend(error_lines.map(|line| format!("    {}", line.trim())));
    }
    lines
}

#[must_use]
pub fn result_json(result: &DownloadResult) -> Value {
    let failed: Vec<Value> = result
        .failed
        .iter()
        .map(|(name, error)| json!({ "mod": name, "error": error }))
        .collect();
    json!({
        "success": result.success,
        "downloaded": result.downloaded,
        "failed": failed,
        "total_bytes": result.total_bytes,
        "duration": result.duration,
    })
}

pub fn print_plan(plan: &DownloadPlan, as_json: bool) {
    if as_json {
        println!("{}", plan_json(plan));
    } else {
        for line in plan_lines(plan) {
            println!("{line}");
        }
    }
}

pub fn print_result(result: &DownloadResult, as_json: bool) {
    if as_json {
        println!("{}", result_json(result));
    } else {
        for line in result_lines(result) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use mod_downloader_core::ModInfo;

    use super::*;

    fn info(name: &str, size: Option<u64>, is_optional: bool) -> ModInfo {
        ModInfo {
            name: name.to_string(),
            version: "2.0.1".to_string(),
            portal_url: format!("https://mods.factorio.com/mod/{name}"),
            download_url: format!("https://mods-storage.re146.dev/{name}/2.0.1.zip"),
            size,
            is_optional,
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_plan_lines_mark_optional_and_unknown_size() {
        let plan = DownloadPlan::from_mods([info("app", Some(2048), false), info("x", None, true)]);
        let lines = plan_lines(&plan);
        assert_eq!(lines[0], "Download plan: 2 mod(s)");
        assert_eq!(lines[1], "  - app 2.0.1 (2.0 KiB)");
        assert_eq!(lines[2], "  - x 2.0.1 (unknown size) [optional]");
        assert_eq!(lines[3], "Total size: unknown");
    }

    #[test]
    fn test_result_lines_enumerate_failures_with_suggestion() {
        let result = DownloadResult {
            success: false,
            downloaded: vec!["flib".to_string()],
            failed: vec![(
                "bad".to_string(),
                "HTTP 500 downloading x\n  Suggestion: Check network connectivity".to_string(),
            )],
            total_bytes: 10,
            duration: 1.25,
        };
        let lines = result_lines(&result);
        assert!(lines[0].starts_with("Downloaded 1 mod(s), 1 failed"));
        assert!(lines.contains(&"  [ok] flib".to_string()));
        assert!(lines.contains(&"  [failed] bad: HTTP 500 downloading x".to_string()));
        assert!(lines.contains(&"    Suggestion: Check network connectivity".to_string()));
    }

    #[test]
    fn test_result_json_shape() {
        let result = DownloadResult {
            success: true,
            downloaded: vec!["flib".to_string()],
            ..DownloadResult::default()
        };
        let value = result_json(&result);
        assert_eq!(value["success"], true);
        assert_eq!(value["downloaded"][0], "flib");
        assert!(value["failed"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_plan_json_includes_mods() {
        let plan = DownloadPlan::from_mods([info("app", Some(1), false)]);
        let value = plan_json(&plan);
        assert_eq!(value["total_count"], 1);
        assert_eq!(value["mods"][0]["name"], "app");
        assert_eq!(value["mods"][0]["size"], 1);
    }
}
