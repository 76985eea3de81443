//! Storage collaborators for the import pipeline.
//!
//! The orchestrator only talks to these traits, so the same pipeline can
//! write to SQLite ([`SqliteStore`](crate::sqlite_store::SqliteStore)) or
//! to memory ([`MemoryStore`]).
//!
//! # Operations
//!
//! | Trait | Method | Purpose |
//! |-------|--------|---------|
//! | [`DocumentStore`] | [`save`](DocumentStore::save) | Persist a document into its domain |
//! | [`DocumentStore`] | [`set_domain`](DocumentStore::set_domain) | Create a domain or reset its password |
//! | [`BlobStore`] | [`save_blob`](BlobStore::save_blob) | Store compressed bytes under a content id |
//! | [`IdGenerator`] | [`uuid`](IdGenerator::uuid) | Mint a document identifier |

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::Document;

/// Persists documents and the domains they belong to.
///
/// `save` must fail when the document's domain does not exist; the
/// importer reacts to that by provisioning the domain and saving again.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save(&self, doc: &Document) -> Result<()>;

    async fn set_domain(&self, name: &str, password: &str) -> Result<()>;
}

/// Persists content-addressed blobs.
///
/// Writing an id that already exists must succeed without changing the
/// stored bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save_blob(&self, id: &str, filename: &str, data: &[u8]) -> Result<()>;
}

/// Source of opaque document identifiers.
pub trait IdGenerator: Send + Sync {
    fn uuid(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// A blob as held by [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub filename: String,
    pub data: Vec<u8>,
}

/// In-memory store for tests and embedding.
///
/// Documents are kept in insertion order; domains map to their password.
pub struct MemoryStore {
    domains: RwLock<HashMap<String, String>>,
    docs: RwLock<Vec<Document>>,
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            domains: RwLock::new(HashMap::new()),
            docs: RwLock::new(Vec::new()),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Store with the given domains already provisioned.
    pub fn with_domains(names: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut domains = store.domains.write().unwrap_or_else(|e| e.into_inner());
            for name in names {
                domains.insert(name.to_string(), String::new());
            }
        }
        store
    }

    pub fn documents(&self) -> Vec<Document> {
        self.docs.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn blob(&self, id: &str) -> Option<StoredBlob> {
        self.blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn domain_password(&self, name: &str) -> Option<String> {
        self.domains
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save(&self, doc: &Document) -> Result<()> {
        let known = self
            .domains
            .read()
            .map_err(|_| anyhow!("domain table poisoned"))?
            .contains_key(&doc.domain);
        if !known {
            bail!("domain '{}' does not exist", doc.domain);
        }
        self.docs
            .write()
            .map_err(|_| anyhow!("document table poisoned"))?
            .push(doc.clone());
        Ok(())
    }

    async fn set_domain(&self, name: &str, password: &str) -> Result<()> {
        if name.is_empty() {
            bail!("domain name must not be empty");
        }
        self.domains
            .write()
            .map_err(|_| anyhow!("domain table poisoned"))?
            .insert(name.to_string(), password.to_string());
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn save_blob(&self, id: &str, filename: &str, data: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .map_err(|_| anyhow!("blob table poisoned"))?
            .entry(id.to_string())
            .or_insert_with(|| StoredBlob {
                filename: filename.to_string(),
                data: data.to_vec(),
            });
        Ok(())
    }
}
