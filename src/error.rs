//! Error kinds raised by the import pipeline.
//!
//! Link-level kinds ([`ImportError::AssetUnreadable`],
//! [`ImportError::BlobPersistFailure`]) are recovered inside the
//! orchestrator. The other two abort the import of a single file and reach
//! the caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The `+++` block is missing, is not valid TOML, or lacks a usable date.
    #[error("malformed frontmatter: {0}")]
    MalformedFrontmatter(String),

    /// A local image path did not resolve to a readable file.
    #[error("cannot read asset {}: {source}", .path.display())]
    AssetUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blob store rejected a write.
    #[error("failed to store blob {id}: {source}")]
    BlobPersistFailure {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The document store rejected the write, including after the
    /// domain-provisioning retry.
    #[error("failed to save document {slug}: {source}")]
    DocumentPersistFailure {
        slug: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ImportError {
    /// Whether the orchestrator skips just the offending link for this error.
    pub fn is_link_level(&self) -> bool {
        matches!(
            self,
            ImportError::AssetUnreadable { .. } | ImportError::BlobPersistFailure { .. }
        )
    }
}
