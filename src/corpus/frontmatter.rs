//! YAML frontmatter: split from the body and read document metadata.
//!
//! ```text
//! ---                          ┐
//! title: Emergency funds       │ raw frontmatter, written back verbatim
//! publishedTime: 2025-01-01    │
//! ---                          ┘
//! Body text ...                  body, the only part the engine sees
//! ```

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_yaml::Value;

/// Naive date-time layouts accepted besides RFC 3339, read as UTC.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Split `source` into `(frontmatter, body)`.
///
/// The frontmatter part includes both `---` fences and the line break after
/// the closing one, so `frontmatter + body == source`. Without a leading
/// fence the frontmatter is empty.
pub fn split(source: &str) -> (&str, &str) {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return ("", source);
    };
    let opening = source.len() - rest.len();

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let end = opening + offset + line.len();
            return source.split_at(end);
        }
        offset += line.len();
    }

    // Unclosed fence: not frontmatter
    ("", source)
}

/// Document metadata read from frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub publish_time: Option<DateTime<Utc>>,
    pub is_draft: bool,
}

/// Read metadata from a raw frontmatter block (fences included).
///
/// The first present key of `publish_fields` (resp. `draft_fields`) wins.
pub fn metadata(raw: &str, publish_fields: &[String], draft_fields: &[String]) -> Result<Metadata> {
    let yaml = raw
        .trim_start_matches("---")
        .trim_end()
        .trim_end_matches("---");
    if yaml.trim().is_empty() {
        return Ok(Metadata::default());
    }

    let value: Value = serde_yaml::from_str(yaml).context("invalid YAML frontmatter")?;
    let Value::Mapping(map) = value else {
        bail!("frontmatter is not a mapping");
    };

    let publish_time = publish_fields
        .iter()
        .find_map(|field| map.get(field.as_str()).map(|v| (field, v)))
        .filter(|(_, value)| !value.is_null())
        .map(|(field, value)| {
            parse_time(value).with_context(|| format!("invalid `{field}` in frontmatter"))
        })
        .transpose()?;

    let is_draft = draft_fields
        .iter()
        .find_map(|field| map.get(field.as_str()).map(|v| (field, v)))
        .map(|(field, value)| match value {
            Value::Bool(flag) => Ok(*flag),
            Value::Null => Ok(false),
            other => bail!("`{field}` must be a boolean, got {other:?}"),
        })
        .transpose()?
        .unwrap_or(false);

    Ok(Metadata {
        publish_time,
        is_draft,
    })
}

fn parse_time(value: &Value) -> Result<DateTime<Utc>> {
    let Some(text) = value.as_str() else {
        bail!("expected a date string, got {value:?}");
    };
    let text = text.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Ok(time.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(time.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(time) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(time.and_utc());
    }

    bail!("unrecognised date `{text}`")
}
