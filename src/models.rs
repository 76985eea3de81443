//! Core data models used throughout the importer.
//!
//! These types represent the parsed metadata block, the persisted document
//! and the counters produced by a folder import.

use chrono::{DateTime, NaiveDate, Utc};

/// Metadata decoded from the `+++` block at the top of a markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
}

impl Frontmatter {
    /// Frontmatter with only a date set.
    pub fn dated(date: NaiveDate) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            date,
            tags: Vec::new(),
        }
    }
}

/// A rendered document, ready to be handed to a
/// [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub slug: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub domain: String,
}

/// Counters for one `import` run over a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Documents persisted successfully.
    pub imported: u64,
    /// Files whose import returned an error.
    pub failed: u64,
    /// Files ignored because their name does not contain `.md`.
    pub ignored: u64,
    /// Image links left unresolved across all imported documents.
    pub links_skipped: u64,
    /// Image links rewritten to blob references.
    pub links_rewritten: u64,
}
