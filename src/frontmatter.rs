//! Parsing and rendering of the `+++` metadata block.
//!
//! A document opens with a TOML table fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "Trip"
//! date = 2020-05-01
//! tags = ["a", "b"]
//! +++
//! Body text
//! ```
//!
//! [`extract`] decodes the table, [`strip`] drops it from the content and
//! [`render`] turns the metadata back into visible markdown around the body.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;

use crate::error::ImportError;
use crate::models::Frontmatter;

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\+\+\+(.*?)\+\+\+").expect("frontmatter pattern"))
}

/// Shape of the TOML table before the date is normalised.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawFrontmatter {
    title: String,
    description: String,
    date: Option<toml::Value>,
    tags: Vec<String>,
}

/// Decode the first `+++` block of `raw`.
///
/// A missing block is an error rather than empty metadata: the date is
/// needed to build the document's slug.
pub fn extract(raw: &str) -> Result<Frontmatter, ImportError> {
    let block = block_regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ImportError::MalformedFrontmatter("no +++ block found".to_string()))?;

    let parsed: RawFrontmatter = toml::from_str(block.as_str())
        .map_err(|e| ImportError::MalformedFrontmatter(e.to_string()))?;

    let date = match parsed.date {
        Some(value) => parse_date(&value)?,
        None => {
            return Err(ImportError::MalformedFrontmatter(
                "missing date".to_string(),
            ))
        }
    };

    Ok(Frontmatter {
        title: parsed.title,
        description: parsed.description,
        date,
        tags: parsed.tags,
    })
}

/// Calendar date of a TOML date, datetime, or `YYYY-MM-DD` string.
fn parse_date(value: &toml::Value) -> Result<NaiveDate, ImportError> {
    match value {
        toml::Value::Datetime(dt) => {
            let d = dt.date.ok_or_else(|| {
                ImportError::MalformedFrontmatter(format!("date has no calendar part: {}", dt))
            })?;
            NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day))
                .ok_or_else(|| ImportError::MalformedFrontmatter(format!("invalid date: {}", dt)))
        }
        toml::Value::String(s) => {
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|e| ImportError::MalformedFrontmatter(format!("date '{}': {}", s, e)))
        }
        other => Err(ImportError::MalformedFrontmatter(format!(
            "date must be a date, got {}",
            other.type_str()
        ))),
    }
}

/// Remove the first `+++` block from `raw`, along with the line breaks
/// directly after it.
pub fn strip(raw: &str) -> String {
    match block_regex().find(raw) {
        Some(m) => {
            let rest = raw[m.end()..].trim_start_matches(['\r', '\n']);
            format!("{}{}", &raw[..m.start()], rest)
        }
        None => raw.to_string(),
    }
}

/// Build the visible markdown: heading, italic description, body, italic
/// tag line. Each section ends in a blank line; empty sections are left out
/// except the body.
pub fn render(body: &str, fm: &Frontmatter) -> String {
    let mut out = String::new();
    if !fm.title.is_empty() {
        out.push_str(&format!("# {}\n\n", fm.title));
    }
    if !fm.description.is_empty() {
        out.push_str(&format!("*{}*\n\n", fm.description));
    }
    out.push_str(body);
    out.push_str("\n\n");
    if !fm.tags.is_empty() {
        out.push_str(&format!("*{}*\n\n", fm.tags.join(",")));
    }
    out
}
