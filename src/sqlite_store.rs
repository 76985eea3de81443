//! SQLite-backed [`DocumentStore`] and [`BlobStore`].
//!
//! Documents belong to a row in `domains`; saving into a domain that has
//! no row fails, which is what triggers the importer's provisioning retry.
//! Domain passwords are kept as a random salt plus HMAC-SHA256.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::Document;
use crate::store::{BlobStore, DocumentStore};

type HmacSha256 = Hmac<Sha256>;

/// SQLite implementation of the storage traits.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn domain_id(&self, name: &str) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM domains WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    /// Whether `password` matches the one stored for `name`. Unknown
    /// domains never match.
    pub async fn check_domain_password(&self, name: &str, password: &str) -> Result<bool> {
        let row = sqlx::query("SELECT salt, password_hash FROM domains WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(false);
        };
        let salt: String = row.get("salt");
        let stored: String = row.get("password_hash");
        let expected = hex::decode(stored)?;

        let mut mac =
            HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC can take key of any size");
        mac.update(password.as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    /// Most recently created document with `slug`, optionally restricted to
    /// one domain.
    pub async fn latest_by_slug(&self, slug: &str, domain: Option<&str>) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT d.id, d.slug, d.data, d.created, m.name AS domain
            FROM documents d
            JOIN domains m ON m.id = d.domain_id
            WHERE d.slug = ? AND (? IS NULL OR m.name = ?)
            ORDER BY d.created DESC, d.rowid DESC
            LIMIT 1
            "#,
        )
        .bind(slug)
        .bind(domain)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let created: i64 = row.get("created");
            Document {
                id: row.get("id"),
                slug: row.get("slug"),
                body: row.get("data"),
                created: DateTime::from_timestamp(created, 0).unwrap_or_default(),
                domain: row.get("domain"),
            }
        }))
    }

    /// Stored filename and compressed bytes of blob `id`.
    pub async fn blob(&self, id: &str) -> Result<Option<(String, Vec<u8>)>> {
        let row = sqlx::query("SELECT name, data FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| (row.get("name"), row.get("data"))))
    }

    pub async fn count_documents(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn count_blobs(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC can take key of any size");
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn save(&self, doc: &Document) -> Result<()> {
        let Some(domain_id) = self.domain_id(&doc.domain).await? else {
            bail!("domain '{}' does not exist", doc.domain);
        };

        let now = Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO documents (id, domain_id, slug, data, created, modified)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                domain_id = excluded.domain_id,
                slug = excluded.slug,
                data = excluded.data,
                modified = excluded.modified
            "#,
        )
        .bind(&doc.id)
        .bind(domain_id)
        .bind(&doc.slug)
        .bind(&doc.body)
        .bind(doc.created.timestamp())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_domain(&self, name: &str, password: &str) -> Result<()> {
        if name.trim().is_empty() {
            bail!("domain name must not be empty");
        }
        let salt = Uuid::new_v4().simple().to_string();
        let hash = hash_password(&salt, password);

        sqlx::query(
            r#"
            INSERT INTO domains (name, salt, password_hash, created) VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET salt = excluded.salt, password_hash = excluded.password_hash
            "#,
        )
        .bind(name)
        .bind(&salt)
        .bind(&hash)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for SqliteStore {
    async fn save_blob(&self, id: &str, filename: &str, data: &[u8]) -> Result<()> {
        sqlx::query(
            "INSERT INTO blobs (id, name, data, created) VALUES (?, ?, ?, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(id)
        .bind(filename)
        .bind(data)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
