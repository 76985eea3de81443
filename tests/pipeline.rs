use std::fs;
use std::path::Path;

use mdimport::blob::blob_id;
use mdimport::config::{Config, DbConfig, ImportConfig, LogConfig};
use mdimport::error::ImportError;
use mdimport::import::Importer;
use mdimport::migrate;
use mdimport::report::{CollectingReporter, ImportEvent};
use mdimport::sqlite_store::SqliteStore;
use mdimport::store::{BlobStore, DocumentStore, MemoryStore, UuidGenerator};
use tempfile::TempDir;

/// Blob store that refuses one filename and keeps everything else.
struct RefusingBlobs {
    refused: &'static str,
    inner: MemoryStore,
}

#[async_trait::async_trait]
impl BlobStore for RefusingBlobs {
    async fn save_blob(&self, id: &str, filename: &str, data: &[u8]) -> anyhow::Result<()> {
        if filename == self.refused {
            anyhow::bail!("quota exceeded for {}", filename);
        }
        self.inner.save_blob(id, filename, data).await
    }
}

const TRIP: &str =
    "+++\ntitle = \"Trip\"\ndate = 2020-05-01\ntags = [\"a\",\"b\"]\n+++\nBody text ![x](photo.jpg)";

const PHOTO: &[u8] = b"\xff\xd8\xff\xe0 not really a jpeg";

fn settings(asset_root: &Path) -> ImportConfig {
    ImportConfig {
        asset_root: asset_root.to_path_buf(),
        ..ImportConfig::default()
    }
}

#[tokio::test]
async fn trip_end_to_end() {
    let assets = TempDir::new().unwrap();
    fs::write(assets.path().join("photo.jpg"), PHOTO).unwrap();
    let store = MemoryStore::with_domains(&["travel"]);
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    let imported = importer
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();
    let doc = imported.document;

    assert_eq!(doc.slug, "2020-05-01-trip.md");
    assert_eq!(doc.domain, "travel");
    let expected = format!(
        "*2020-05-01-trip.md*\n\n# Trip\n\nBody text ![x](/uploads/{})\n\n*a,b*\n\n",
        blob_id(PHOTO)
    );
    assert_eq!(doc.body, expected);

    let rendered = doc.body.strip_prefix("*2020-05-01-trip.md*\n\n").unwrap();
    assert!(rendered.starts_with("# Trip\n\n"));
    assert!(rendered.ends_with("*a,b*\n\n"));
    assert!(!doc.body.contains("(photo.jpg)"));

    assert_eq!(imported.links_rewritten, 1);
    assert!(imported.links_skipped.is_empty());
    assert_eq!(store.documents(), vec![doc]);
    assert_eq!(store.blob(&blob_id(PHOTO)).unwrap().filename, "photo.jpg");
}

#[tokio::test]
async fn unreadable_image_keeps_original_link() {
    let assets = TempDir::new().unwrap();
    let store = MemoryStore::with_domains(&["travel"]);
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    let imported = importer
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();

    assert!(imported.document.body.contains("Body text ![x](photo.jpg)"));
    assert_eq!(imported.links_skipped, vec!["photo.jpg".to_string()]);
    assert_eq!(store.blob_count(), 0);
    assert_eq!(store.documents().len(), 1);

    let warnings: Vec<_> = reporter
        .events()
        .into_iter()
        .filter(|e| matches!(e, ImportEvent::LinkSkipped { .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
    match &warnings[0] {
        ImportEvent::LinkSkipped { file, link, .. } => {
            assert_eq!(file, "trip.md");
            assert_eq!(link, "photo.jpg");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn rejected_blob_skips_only_that_link() {
    let assets = TempDir::new().unwrap();
    fs::write(assets.path().join("a.jpg"), b"aaa").unwrap();
    fs::write(assets.path().join("b.jpg"), b"bbb").unwrap();
    let docs = MemoryStore::with_domains(&["travel"]);
    let blobs = RefusingBlobs {
        refused: "a.jpg",
        inner: MemoryStore::new(),
    };
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &docs, &blobs, &UuidGenerator, &reporter);

    let imported = importer
        .import_document(
            "travel",
            "x.md",
            "+++\ndate = 2020-01-01\n+++\n![1](a.jpg) ![2](b.jpg)",
        )
        .await
        .unwrap();

    assert_eq!(
        imported.document.body,
        format!(
            "*2020-01-01-x.md*\n\n![1](a.jpg) ![2](/uploads/{})\n\n",
            blob_id(b"bbb")
        )
    );
    assert_eq!(imported.links_skipped, vec!["a.jpg".to_string()]);
    assert_eq!(imported.links_rewritten, 1);
    assert_eq!(blobs.inner.blob_count(), 1);
    assert_eq!(docs.documents().len(), 1);

    let events = reporter.events();
    assert!(events.iter().any(|e| matches!(
        e,
        ImportEvent::LinkSkipped { link, reason, .. }
            if link == "a.jpg" && reason.contains("failed to store blob")
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, ImportEvent::LinkRewritten { link, .. } if link == "b.jpg")));
}

#[tokio::test]
async fn missing_domain_is_provisioned_and_save_retried() {
    let assets = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    importer
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();

    assert_eq!(store.documents().len(), 1);
    assert_eq!(store.domain_password("travel").as_deref(), Some("123"));
    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, ImportEvent::SaveRetry { domain, .. } if domain == "travel")));
}

#[tokio::test]
async fn missing_frontmatter_fails_the_file() {
    let assets = TempDir::new().unwrap();
    let store = MemoryStore::with_domains(&["travel"]);
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    let err = importer
        .import_document("travel", "plain.md", "# Just a heading\n\n![x](photo.jpg)")
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::MalformedFrontmatter(_)));
    assert!(store.documents().is_empty());
}

#[tokio::test]
async fn every_ingested_link_is_rewritten() {
    let assets = TempDir::new().unwrap();
    fs::create_dir_all(assets.path().join("img")).unwrap();
    fs::write(assets.path().join("img/a.jpg"), b"aaa").unwrap();
    fs::write(assets.path().join("b.jpeg"), b"bbb").unwrap();
    let store = MemoryStore::with_domains(&["travel"]);
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    let raw = "+++\ndate = 2020-05-01\n+++\n![1](/img/a.jpg)\n![2](b.jpeg)\n![3](/img/a.jpg)\n![4](https://x.org/c.jpg)";
    let imported = importer
        .import_document("travel", "gallery.md", raw)
        .await
        .unwrap();
    let body = &imported.document.body;

    assert!(!body.contains("](/img/a.jpg)"));
    assert!(!body.contains("](b.jpeg)"));
    assert_eq!(body.matches(&format!("/uploads/{}", blob_id(b"aaa"))).count(), 2);
    assert!(body.contains(&format!("![2](/uploads/{})", blob_id(b"bbb"))));
    assert!(body.contains("![4](https://x.org/c.jpg)"));
    assert_eq!(store.blob_count(), 2);
}

#[tokio::test]
async fn reimport_dedups_blobs_but_not_documents() {
    let assets = TempDir::new().unwrap();
    fs::write(assets.path().join("photo.jpg"), PHOTO).unwrap();
    let store = MemoryStore::with_domains(&["travel"]);
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());

    let first = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter)
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();
    let second = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter)
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();

    assert_eq!(store.blob_count(), 1);
    assert_eq!(first.document.body, second.document.body);
    assert_ne!(first.document.id, second.document.id);
    assert_eq!(store.documents().len(), 2);
}

#[tokio::test]
async fn import_folder_walks_subdirectories() {
    let root = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("travel")).unwrap();
    fs::create_dir_all(root.path().join("food")).unwrap();
    fs::write(root.path().join("travel/trip.md"), TRIP).unwrap();
    fs::write(root.path().join("travel/notes.txt"), "ignored").unwrap();
    fs::write(
        root.path().join("food/soup.md"),
        "+++\ntitle = \"Soup\"\ndate = 2021-01-02\n+++\nHot.",
    )
    .unwrap();
    fs::write(root.path().join("food/broken.md"), "no metadata").unwrap();
    fs::write(root.path().join("top.md"), TRIP).unwrap();

    let store = MemoryStore::new();
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    let summary = importer
        .import_folder(root.path(), None, false)
        .await
        .unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.ignored, 1);
    assert_eq!(summary.links_skipped, 1);

    let docs = store.documents();
    let pairs: Vec<(&str, &str)> = docs
        .iter()
        .map(|d| (d.domain.as_str(), d.slug.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("food", "2021-01-02-soup.md"), ("travel", "2020-05-01-trip.md")]
    );
    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, ImportEvent::Failed { file, .. } if file == "broken.md")));
}

#[tokio::test]
async fn import_folder_fail_fast_and_domain_override() {
    let root = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("2020")).unwrap();
    fs::write(root.path().join("2020/a.md"), TRIP).unwrap();
    fs::write(root.path().join("2020/b.md"), "no metadata").unwrap();

    let store = MemoryStore::new();
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    let err = importer
        .import_folder(root.path(), Some("travel"), true)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("b.md"));

    let docs = store.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].domain, "travel");
}

#[tokio::test]
async fn import_folder_requires_existing_root() {
    let assets = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let reporter = CollectingReporter::new();
    let cfg = settings(assets.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    assert!(importer
        .import_folder(&assets.path().join("missing"), None, false)
        .await
        .is_err());
}

async fn sqlite_store(dir: &Path) -> SqliteStore {
    let config = Config {
        db: DbConfig {
            path: dir.join("data/mdimport.sqlite"),
        },
        import: ImportConfig::default(),
        log: LogConfig::default(),
    };
    migrate::run_migrations(&config).await.unwrap();
    SqliteStore::new(mdimport::db::connect(&config).await.unwrap())
}

#[tokio::test]
async fn sqlite_store_round_trip() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("photo.jpg"), PHOTO).unwrap();
    let store = sqlite_store(tmp.path()).await;
    let reporter = CollectingReporter::new();
    let cfg = settings(tmp.path());
    let importer = Importer::new(&cfg, &store, &store, &UuidGenerator, &reporter);

    // Domain does not exist yet: the retry provisions it.
    let first = importer
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();
    assert!(store.check_domain_password("travel", "123").await.unwrap());
    assert!(!store.check_domain_password("travel", "nope").await.unwrap());

    importer
        .import_document("travel", "trip.md", TRIP)
        .await
        .unwrap();
    assert_eq!(store.count_documents().await.unwrap(), 2);
    assert_eq!(store.count_blobs().await.unwrap(), 1);

    let (name, _data) = store.blob(&blob_id(PHOTO)).await.unwrap().unwrap();
    assert_eq!(name, "photo.jpg");

    let latest = store
        .latest_by_slug("2020-05-01-trip.md", Some("travel"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.body, first.document.body);
    assert!(store
        .latest_by_slug("2020-05-01-trip.md", Some("food"))
        .await
        .unwrap()
        .is_none());

    store.close().await;
}

#[tokio::test]
async fn sqlite_save_into_unknown_domain_fails() {
    let tmp = TempDir::new().unwrap();
    let store = sqlite_store(tmp.path()).await;
    let doc = mdimport::models::Document {
        id: "x".into(),
        slug: "s".into(),
        body: "b".into(),
        created: chrono::Utc::now(),
        domain: "nowhere".into(),
    };

    let err = store.save(&doc).await.unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    store.set_domain("nowhere", "pw").await.unwrap();
    store.save(&doc).await.unwrap();
    assert_eq!(store.count_documents().await.unwrap(), 1);
    store.close().await;
}
