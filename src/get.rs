//! Document lookup by slug.
//!
//! Used by `mdimport get` to check what an import produced.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Printable view of a stored document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub slug: String,
    pub domain: String,
    pub created: String, // ISO8601
    pub body: String,
}

/// Core get function returning structured data.
pub async fn get_document(
    config: &Config,
    slug: &str,
    domain: Option<&str>,
) -> Result<DocumentResponse> {
    let store = SqliteStore::new(db::connect(config).await?);
    let found = store.latest_by_slug(slug, domain).await;
    store.close().await;

    let doc = match found? {
        Some(doc) => doc,
        None => bail!("document not found: {}", slug),
    };

    Ok(DocumentResponse {
        id: doc.id,
        slug: doc.slug,
        domain: doc.domain,
        created: doc.created.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        body: doc.body,
    })
}

pub async fn run_get(config: &Config, slug: &str, domain: Option<&str>, json: bool) -> Result<()> {
    let doc = get_document(config, slug, domain).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("--- document ---");
    println!("id: {}", doc.id);
    println!("slug: {}", doc.slug);
    println!("domain: {}", doc.domain);
    println!("created: {}", doc.created);
    println!("--- body ---");
    println!("{}", doc.body);

    Ok(())
}
