//! Front matter extraction and schema validation for blog posts.
//!
//! The schema mirrors the site's content collection: `title`, `description`
//! and `pubDate` are required, everything else is optional. Unknown keys are
//! ignored so the site can grow new fields without breaking this job.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("front matter opened with `---` but never closed")]
    Unterminated,
    #[error("front matter is not valid YAML: {0}")]
    Yaml(String),
    #[error("front matter must be a YAML mapping")]
    NotAMapping,
    #[error("front matter does not match the post schema: {0}")]
    Schema(String),
    #[error("`{field}` is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },
}

/// Validated post metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub draft: bool,
    pub encrypt: bool,
    pub password: Option<String>,
    pub question: Option<String>,
    pub slug: Option<String>,
}

impl FrontMatter {
    /// The explicit password, if it contains anything besides whitespace.
    /// The value is returned untrimmed.
    pub fn usable_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .filter(|password| !password.trim().is_empty())
    }

    /// Whether the post asks for protection at all.
    pub fn is_protected(&self) -> bool {
        self.encrypt || self.usable_password().is_some()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateValue {
    EpochMillis(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrontMatter {
    title: String,
    description: String,
    pub_date: DateValue,
    #[serde(default)]
    updated_date: Option<DateValue>,
    #[serde(default)]
    draft: Option<bool>,
    #[serde(default)]
    encrypt: Option<bool>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    slug: Option<String>,
}

/// Returns the raw YAML between the opening and closing `---` lines, or
/// `None` when the document has no front matter block.
pub fn split_front_matter(text: &str) -> Result<Option<&str>, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_end() != DELIMITER {
        return Ok(None);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Ok(Some(&text[start..offset]));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

/// Parses and validates a YAML front matter block.
pub fn parse_front_matter(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Yaml(format!("{e}")))?;
    let value = match value {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
        serde_yaml::Value::Mapping(_) => value,
        _ => return Err(FrontMatterError::NotAMapping),
    };

    let raw: RawFrontMatter =
        serde_yaml::from_value(value).map_err(|e| FrontMatterError::Schema(format!("{e}")))?;

    Ok(FrontMatter {
        title: raw.title,
        description: raw.description,
        pub_date: coerce_date("pubDate", raw.pub_date)?,
        updated_date: raw
            .updated_date
            .map(|value| coerce_date("updatedDate", value))
            .transpose()?,
        draft: raw.draft.unwrap_or(false),
        encrypt: raw.encrypt.unwrap_or(false),
        password: raw.password,
        question: raw.question,
        slug: raw.slug,
    })
}

/// Parses a whole markdown document. `Ok(None)` means there is no front matter.
pub fn parse_document(text: &str) -> Result<Option<FrontMatter>, FrontMatterError> {
    split_front_matter(text)?.map(parse_front_matter).transpose()
}

fn coerce_date(field: &'static str, value: DateValue) -> Result<DateTime<Utc>, FrontMatterError> {
    let invalid = |value: String| FrontMatterError::InvalidDate { field, value };

    let text = match value {
        DateValue::EpochMillis(millis) => {
            return DateTime::from_timestamp_millis(millis).ok_or_else(|| invalid(millis.to_string()));
        }
        DateValue::Text(text) => text,
    };
    let trimmed = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| invalid(text))
}
