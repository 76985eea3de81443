//! Import pipeline orchestration.
//!
//! Coordinates the per-file flow: frontmatter → local links → blob
//! ingestion → rewrite → render → save. Link failures are non-fatal (the
//! original reference is kept); a failed save gets exactly one retry after
//! the target domain is provisioned.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use walkdir::WalkDir;

use crate::blob::BlobIngestor;
use crate::config::{Config, ImportConfig};
use crate::db;
use crate::error::ImportError;
use crate::frontmatter;
use crate::links;
use crate::models::{Document, ImportSummary};
use crate::report::{ImportEvent, ImportReporter};
use crate::sqlite_store::SqliteStore;
use crate::store::{BlobStore, DocumentStore, IdGenerator, UuidGenerator};

/// Result of a successful [`Importer::import_document`].
#[derive(Debug, Clone)]
pub struct Imported {
    pub document: Document,
    pub links_rewritten: usize,
    /// Links left untouched because their asset could not be stored.
    pub links_skipped: Vec<String>,
}

/// Imports markdown files into a [`DocumentStore`], storing their local
/// images in a [`BlobStore`].
pub struct Importer<'a> {
    docs: &'a dyn DocumentStore,
    blobs: BlobIngestor<'a>,
    ids: &'a dyn IdGenerator,
    reporter: &'a dyn ImportReporter,
    default_password: String,
    placeholder_text: String,
}

impl<'a> Importer<'a> {
    pub fn new(
        settings: &ImportConfig,
        docs: &'a dyn DocumentStore,
        blobs: &'a dyn BlobStore,
        ids: &'a dyn IdGenerator,
        reporter: &'a dyn ImportReporter,
    ) -> Self {
        Self {
            docs,
            blobs: BlobIngestor::new(settings.asset_root.clone(), blobs),
            ids,
            reporter,
            default_password: settings.default_password.clone(),
            placeholder_text: settings.placeholder_text.clone(),
        }
    }

    /// Import one markdown file's content into `domain`.
    ///
    /// Fails with [`ImportError::MalformedFrontmatter`] when the metadata
    /// block is missing or unreadable, and with
    /// [`ImportError::DocumentPersistFailure`] when the save fails twice.
    pub async fn import_document(
        &self,
        domain: &str,
        filename: &str,
        raw: &str,
    ) -> Result<Imported, ImportError> {
        let mut data = raw.trim();
        if data == self.placeholder_text {
            data = "";
        }

        let fm = frontmatter::extract(data)?;
        let stripped = frontmatter::strip(data);

        let mut body = stripped;
        let mut links_rewritten = 0;
        let mut links_skipped = Vec::new();
        for link in links::find_local_image_links(&body) {
            match self.blobs.ingest(&link).await {
                Ok(reference) => {
                    body = links::rewrite(&body, &link, &reference);
                    links_rewritten += 1;
                    self.reporter.report(ImportEvent::LinkRewritten {
                        file: filename.to_string(),
                        link,
                        reference,
                    });
                }
                Err(e) if e.is_link_level() => {
                    self.reporter.report(ImportEvent::LinkSkipped {
                        file: filename.to_string(),
                        link: link.clone(),
                        reason: e.to_string(),
                    });
                    links_skipped.push(link);
                }
                Err(e) => return Err(e),
            }
        }

        let rendered = frontmatter::render(&body, &fm);
        let slug = format!("{}-{}", fm.date.format("%Y-%m-%d"), filename);
        let document = Document {
            id: self.ids.uuid(),
            body: format!("*{}*\n\n{}", slug, rendered),
            slug,
            created: Utc::now(),
            domain: domain.to_string(),
        };

        self.save_with_retry(filename, &document).await?;

        self.reporter.report(ImportEvent::Imported {
            file: filename.to_string(),
            slug: document.slug.clone(),
        });

        Ok(Imported {
            document,
            links_rewritten,
            links_skipped,
        })
    }

    async fn save_with_retry(&self, filename: &str, document: &Document) -> Result<(), ImportError> {
        let first = match self.docs.save(document).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        self.reporter.report(ImportEvent::SaveRetry {
            file: filename.to_string(),
            domain: document.domain.clone(),
            reason: format!("{:#}", first),
        });

        if let Err(e) = self
            .docs
            .set_domain(&document.domain, &self.default_password)
            .await
        {
            self.reporter.report(ImportEvent::DomainProvisionFailed {
                domain: document.domain.clone(),
                reason: format!("{:#}", e),
            });
        }

        self.docs
            .save(document)
            .await
            .map_err(|source| ImportError::DocumentPersistFailure {
                slug: document.slug.clone(),
                source,
            })
    }

    /// Import every `.md` file one level below each subdirectory of `root`.
    ///
    /// Subdirectories and files are visited in name order. Documents go to
    /// `domain` when given, otherwise to a domain named after their
    /// subdirectory. A failing file is reported and counted; with
    /// `fail_fast` the first failure is returned instead.
    pub async fn import_folder(
        &self,
        root: &Path,
        domain: Option<&str>,
        fail_fast: bool,
    ) -> Result<ImportSummary> {
        if !root.is_dir() {
            bail!("Import folder does not exist: {}", root.display());
        }

        let mut summary = ImportSummary::default();

        let walker = WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.contains(".md") {
                summary.ignored += 1;
                continue;
            }

            let target = match domain {
                Some(d) => d.to_string(),
                None => subdir_name(entry.path()),
            };

            let result = match std::fs::read_to_string(entry.path()) {
                Ok(content) => self
                    .import_document(&target, &filename, &content)
                    .await
                    .map_err(anyhow::Error::from),
                Err(e) => Err(anyhow::Error::from(e)
                    .context(format!("Failed to read {}", entry.path().display()))),
            };

            match result {
                Ok(imported) => {
                    summary.imported += 1;
                    summary.links_rewritten += imported.links_rewritten as u64;
                    summary.links_skipped += imported.links_skipped.len() as u64;
                }
                Err(e) => {
                    if fail_fast {
                        return Err(e.context(format!("Import of {} failed", filename)));
                    }
                    self.reporter.report(ImportEvent::Failed {
                        file: filename,
                        reason: format!("{:#}", e),
                    });
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn subdir_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Entry point of `mdimport import`: import `folder` into the configured
/// SQLite database and print a summary.
pub async fn run_import(
    config: &Config,
    folder: &Path,
    domain: Option<String>,
    fail_fast: bool,
    reporter: &dyn ImportReporter,
) -> Result<ImportSummary> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let ids = UuidGenerator;

    let domain = domain.or_else(|| config.import.domain.clone());
    let importer = Importer::new(&config.import, &store, &store, &ids, reporter);
    let summary = importer
        .import_folder(folder, domain.as_deref(), fail_fast)
        .await
        .with_context(|| format!("Import of {} aborted", folder.display()))?;

    println!("import {}", folder.display());
    println!("  imported documents: {}", summary.imported);
    println!("  failed files: {}", summary.failed);
    println!("  ignored files: {}", summary.ignored);
    println!("  links rewritten: {}", summary.links_rewritten);
    println!("  links skipped: {}", summary.links_skipped);
    if summary.failed == 0 {
        println!("ok");
    }

    store.close().await;
    Ok(summary)
}
