//! # mdimport
//!
//! Batch importer for folders of markdown posts.
//!
//! Each file carries a TOML metadata block fenced by `+++`. The importer
//! decodes it, stores every local `.jpg`/`.jpeg` image the post links to as
//! a gzip-compressed, content-addressed blob, rewrites the links to
//! `/uploads/sha256-<hex>`, renders the metadata as visible markdown and
//! saves the result as a document in a domain.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Import folder│──▶│ Frontmatter  │──▶│  Link finder  │
//! │ <domain>/*.md│   │   extract    │   │  (jpg/jpeg)   │
//! └──────────────┘   └──────────────┘   └───────┬───────┘
//!                                               ▼
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ DocumentStore│◀──│   Render +   │◀──│ Blob ingestor │──▶ BlobStore
//! │ (+1 retry)   │   │   rewrite    │   │ sha256 + gzip │
//! └──────────────┘   └──────────────┘   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mdimport init                      # create database
//! mdimport import ./posts            # import ./posts/<domain>/*.md
//! mdimport get 2020-05-01-trip.md    # show the stored document
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline error kinds |
//! | [`frontmatter`] | `+++` block extract / strip / render |
//! | [`links`] | Local image link discovery and rewriting |
//! | [`blob`] | Content-addressed blob ingestion |
//! | [`import`] | Per-file and per-folder orchestration |
//! | [`store`] | Storage traits and in-memory store |
//! | [`sqlite_store`] | SQLite storage |
//! | [`report`] | Import event reporters |

pub mod blob;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod frontmatter;
pub mod get;
pub mod import;
pub mod links;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod report;
pub mod sqlite_store;
pub mod store;
