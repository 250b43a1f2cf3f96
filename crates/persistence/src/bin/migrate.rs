#![deny(warnings)]

//! Upgrade a save file in place to the current schema.

use persistence::{default_save_path, load_document, save_document, JsonFileStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_save_path().to_string());
    let store = JsonFileStore::new(&path);
    let doc = load_document(&store)?;
    save_document(&store, &doc)?;
    info!(path = %path, "migration complete");
    println!("Save migrated to schema v{} at {}", doc.schema_version, path);
    Ok(())
}
