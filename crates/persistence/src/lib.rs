#![deny(warnings)]

//! Persistence layer: save document schema, migrations and file storage.
//!
//! A save is read once at startup, migrated to the current schema, and then
//! written back whole after every change.

pub mod document;
pub mod merge;
pub mod migrate;

pub use document::{
    CraftingPrefs, DisplayFlags, MarketFields, PlayerFields, SaveDocument, CURRENT_SCHEMA_VERSION,
};
pub use merge::{apply_rate_feed, deep_merge};
pub use migrate::{migrate, schema_version, Migration, MIGRATIONS};

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Returns the default path used for local saves.
pub fn default_save_path() -> &'static str {
    "./saves/mining.json"
}

/// Raw key-value storage for the serialised save.
pub trait DocumentStore {
    /// The stored text, or `None` when nothing has been saved yet.
    fn load_raw(&self) -> Result<Option<String>, PersistenceError>;
    fn save_raw(&self, text: &str) -> Result<(), PersistenceError>;
}

/// Stores the save as a single JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn load_raw(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_raw(&self, text: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Decode stored text and migrate it. Unparseable text yields the defaults.
pub fn load_value(text: &str, defaults: &Value) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(raw) => migrate(&raw, defaults),
        Err(e) => {
            warn!(error = %e, "stored save is not valid JSON, using defaults");
            defaults.clone()
        }
    }
}

/// Load, migrate and decode the save held by `store`.
///
/// A missing or corrupt save resolves to [`SaveDocument::default`]; only I/O
/// failures are returned as errors.
pub fn load_document<S: DocumentStore>(store: &S) -> Result<SaveDocument, PersistenceError> {
    let defaults = SaveDocument::default();
    let Some(text) = store.load_raw()? else {
        info!("no save found, starting from defaults");
        return Ok(defaults);
    };
    let migrated = load_value(&text, &defaults.to_value()?);
    match SaveDocument::from_value(migrated) {
        Ok(doc) => {
            info!(schema_version = doc.schema_version, "loaded save");
            Ok(doc)
        }
        Err(e) => {
            warn!(error = %e, "save does not match the current schema, using defaults");
            Ok(defaults)
        }
    }
}

/// Serialise and write the whole document.
pub fn save_document<S: DocumentStore>(store: &S, doc: &SaveDocument) -> Result<(), PersistenceError> {
    let text = serde_json::to_string_pretty(doc)?;
    store.save_raw(&text)?;
    info!(schema_version = doc.schema_version, "saved document");
    Ok(())
}
