use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;
use crate::store::DocumentStore;

/// Create `name` or replace its password.
pub async fn run_set_domain(config: &Config, name: &str, password: &str) -> Result<()> {
    let store = SqliteStore::new(db::connect(config).await?);
    let result = store.set_domain(name, password).await;
    store.close().await;
    result?;

    println!("domain {} saved", name);
    Ok(())
}
