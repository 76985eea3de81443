//! Content-addressed ingestion of local images.
//!
//! Each asset is identified by `sha256-<hex>` of its raw bytes and stored
//! gzip-compressed, so the same picture referenced from several posts (or
//! imported twice) ends up as a single blob.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::error::ImportError;
use crate::store::BlobStore;

/// Prefix of every reference handed back to the rewriter.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Content identifier for `data`: `sha256-` followed by 64 lowercase hex
/// characters.
pub fn blob_id(data: &[u8]) -> String {
    format!("sha256-{}", hex::encode(Sha256::digest(data)))
}

/// Gzip `data` into a complete stream.
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Reads linked assets from a base directory and hands them to a
/// [`BlobStore`].
pub struct BlobIngestor<'a> {
    asset_root: PathBuf,
    store: &'a dyn BlobStore,
}

impl<'a> BlobIngestor<'a> {
    pub fn new(asset_root: impl Into<PathBuf>, store: &'a dyn BlobStore) -> Self {
        Self {
            asset_root: asset_root.into(),
            store,
        }
    }

    /// Path `link` points to under the asset root. Site-absolute links
    /// (`/images/a.jpg`) resolve below the root, not the filesystem root.
    /// Links with a `..` component have no path under the root.
    pub fn resolve(&self, link: &str) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for component in Path::new(link).components() {
            match component {
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
                Component::ParentDir => return None,
                Component::Normal(part) => relative.push(part),
            }
        }
        Some(self.asset_root.join(relative))
    }

    /// Store the asset behind `link` and return its `/uploads/...` reference.
    pub async fn ingest(&self, link: &str) -> Result<String, ImportError> {
        let path = self
            .resolve(link)
            .ok_or_else(|| ImportError::AssetUnreadable {
                path: PathBuf::from(link),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "path leaves the asset root",
                ),
            })?;
        tracing::debug!(link, path = %path.display(), "ingesting asset");

        let data = std::fs::read(&path).map_err(|source| ImportError::AssetUnreadable {
            path: path.clone(),
            source,
        })?;

        let id = blob_id(&data);
        let compressed = compress(&data).map_err(|e| ImportError::BlobPersistFailure {
            id: id.clone(),
            source: e.into(),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| link.to_string());

        self.store
            .save_blob(&id, &filename, &compressed)
            .await
            .map_err(|source| ImportError::BlobPersistFailure {
                id: id.clone(),
                source,
            })?;

        Ok(format!("{}{}", UPLOADS_PREFIX, id))
    }
}
