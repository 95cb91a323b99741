//! Batch input parsing: JSON object, JSON array, or one URL per line.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::error::ValidationError;
use super::url::validate_mod_url_for;

/// Shape of a batch source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    /// `{"mods": [...]}`
    JsonObject,
    /// `[...]`
    JsonArray,
    /// Line-oriented text; blank lines and `#` comments ignored.
    Lines,
}

impl fmt::Display for BatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonObject => write!(f, "JSON object"),
            Self::JsonArray => write!(f, "JSON array"),
            Self::Lines => write!(f, "text lines"),
        }
    }
}

/// Validated mod URLs read from a batch source, in input order.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub format: BatchFormat,
    /// Canonical page URLs, duplicates removed.
    pub urls: Vec<String>,
    /// Number of duplicate entries dropped.
    pub duplicates: usize,
}

impl BatchInput {
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl fmt::Display for BatchInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mod URLs from {} ({} duplicates)",
            self.urls.len(),
            self.format,
            self.duplicates
        )
    }
}

/// Parses batch content and validates every entry against `portal_base`.
///
/// JSON is detected by a leading `{` or `[`. Entries may be URL strings or
/// objects with a `url` field. The first malformed entry aborts parsing so
/// nothing is downloaded from a half-valid batch.
///
/// # Errors
///
/// Returns [`ValidationError`] for undecodable JSON, entries of the wrong
/// shape, or URLs outside the portal pattern.
#[tracing::instrument(skip(content), fields(content_len = content.len()))]
pub fn parse_batch_input(content: &str, portal_base: &str) -> Result<BatchInput, ValidationError> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    let (format, raw_entries) = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        parse_json_entries(trimmed)?
    } else {
        (BatchFormat::Lines, parse_line_entries(trimmed))
    };

    let mut urls: Vec<String> = Vec::with_capacity(raw_entries.len());
    let mut duplicates = 0;
    for (index, raw) in raw_entries {
        let url = validate_mod_url_for(&raw, portal_base).map_err(|e| match e {
            ValidationError::InvalidUrl { reason, .. } => {
                ValidationError::bad_entry(index, format!("'{raw}': {reason}"))
            }
            other => other,
        })?;
        if urls.iter().any(|existing| existing.eq_ignore_ascii_case(&url)) {
            debug!(url = %url, "dropping duplicate batch entry");
            duplicates += 1;
            continue;
        }
        urls.push(url);
    }

    Ok(BatchInput {
        format,
        urls,
        duplicates,
    })
}

fn parse_json_entries(
    content: &str,
) -> Result<(BatchFormat, Vec<(usize, String)>), ValidationError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ValidationError::bad_batch(format!("malformed JSON: {e}")))?;

    let (format, items) = match value {
        Value::Array(items) => (BatchFormat::JsonArray, items),
        Value::Object(mut map) => match map.remove("mods") {
            Some(Value::Array(items)) => (BatchFormat::JsonObject, items),
            Some(_) => return Err(ValidationError::bad_batch("\"mods\" must be an array")),
            None => return Err(ValidationError::bad_batch("missing \"mods\" array")),
        },
        _ => return Err(ValidationError::bad_batch("expected a JSON object or array")),
    };

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let index = i + 1;
        let url = match item {
            Value::String(s) => s,
            Value::Object(mut obj) => match obj.remove("url") {
                Some(Value::String(s)) => s,
                _ => return Err(ValidationError::bad_entry(index, "object has no string \"url\"")),
            },
            other => {
                return Err(ValidationError::bad_entry(
                    index,
                    format!("expected string or object, found {other}"),
                ));
            }
        };
        entries.push((index, url));
    }
    Ok((format, entries))
}

fn parse_line_entries(content: &str) -> Vec<(usize, String)> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            (!line.is_empty() && !line.starts_with('#')).then(|| (i + 1, line.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PORTAL: &str = "https://mods.factorio.com";

    #[test]
    fn test_parse_json_object_with_mods_array() {
        let input = r#"{"mods": ["https://mods.factorio.com/mod/flib", {"url": "https://mods.factorio.com/mod/Krastorio2"}]}"#;
        let batch = parse_batch_input(input, PORTAL).unwrap();
        assert_eq!(batch.format, BatchFormat::JsonObject);
        assert_eq!(
            batch.urls,
            vec![
                "https://mods.factorio.com/mod/flib",
                "https://mods.factorio.com/mod/Krastorio2"
            ]
        );
    }

    #[test]
    fn test_parse_bare_json_array() {
        let input = r#"["https://mods.factorio.com/mod/flib"]"#;
        let batch = parse_batch_input(input, PORTAL).unwrap();
        assert_eq!(batch.format, BatchFormat::JsonArray);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_parse_lines_skips_blank_and_comments() {
        let input = "# my mods\n\nhttps://mods.factorio.com/mod/flib\n   \n  # disabled\nhttps://mods.factorio.com/mod/stdlib\n";
        let batch = parse_batch_input(input, PORTAL).unwrap();
        assert_eq!(batch.format, BatchFormat::Lines);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_parse_drops_duplicates() {
        let input = "https://mods.factorio.com/mod/flib\nhttps://mods.factorio.com/mod/flib/downloads/3\n";
        let batch = parse_batch_input(input, PORTAL).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.duplicates, 1);
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let input = "https://mods.factorio.com/mod/flib\n\nhttps://example.com/nope\n";
        let err = parse_batch_input(input, PORTAL).unwrap_err();
        match err {
            ValidationError::InvalidBatchEntry { index, .. } => assert_eq!(index, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = parse_batch_input("{\"mods\": [", PORTAL).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBatch { .. }));
    }

    #[test]
    fn test_object_without_mods_is_rejected() {
        let err = parse_batch_input(r#"{"urls": []}"#, PORTAL).unwrap_err();
        assert!(err.to_string().contains("mods"));
    }

    #[test]
    fn test_non_string_entry_is_rejected() {
        let err = parse_batch_input("[42]", PORTAL).unwrap_err();
        match err {
            ValidationError::InvalidBatchEntry { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_yields_empty_batch() {
        let batch = parse_batch_input("\n# nothing\n", PORTAL).unwrap();
        assert!(batch.is_empty());
    }
}
