//! File-backed document store.
//!
//! # Invariants
//! - One JSON file per `DocumentKind` inside the data directory.
//! - Writes go to a sibling temp file, synced to disk, then renamed into
//!   place.

use super::{DocumentKind, DocumentStore, StoreError, StoreResult};
use log::{error, info};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const TEMP_SUFFIX: &str = "tmp";

/// Stores documents as files under one directory.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    /// Opens `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| {
            error!("event=store_open module=store status=error error_code=create_dir_failed error={source}");
            StoreError::Io {
                path: root.clone(),
                source,
            }
        })?;
        info!("event=store_open module=store status=ok mode=file");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: DocumentKind) -> PathBuf {
        self.root.join(kind.file_name())
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self, kind: DocumentKind) -> StoreResult<Option<String>> {
        let path = self.path_for(kind);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(source) if source.kind() == ErrorKind::NotFound => {
                info!(
                    "event=store_load module=store status=ok document={} found=false",
                    kind.label()
                );
                Ok(None)
            }
            Err(source) => {
                error!(
                    "event=store_load module=store status=error document={} error={source}",
                    kind.label()
                );
                Err(StoreError::Io { path, source })
            }
        }
    }

    fn save(&mut self, kind: DocumentKind, body: &str) -> StoreResult<()> {
        let started_at = Instant::now();
        let path = self.path_for(kind);
        let temp_path = path.with_extension(format!("json.{TEMP_SUFFIX}"));

        let result = write_synced(&temp_path, body)
            .map_err(|source| StoreError::Io {
                path: temp_path.clone(),
                source,
            })
            .and_then(|()| {
                fs::rename(&temp_path, &path).map_err(|source| StoreError::Io {
                    path: path.clone(),
                    source,
                })
            });

        match &result {
            Ok(()) => info!(
                "event=store_save module=store status=ok document={} bytes={} duration_ms={}",
                kind.label(),
                body.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => {
                let _ = fs::remove_file(&temp_path);
                error!(
                    "event=store_save module=store status=error document={} duration_ms={} error={err}",
                    kind.label(),
                    started_at.elapsed().as_millis()
                );
            }
        }
        result
    }
}

// Temp file is flushed to disk before it replaces the previous document.
fn write_synced(path: &Path, body: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(body.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::FileDocumentStore;
    use crate::store::{DocumentKind, DocumentStore};

    #[test]
    fn save_replaces_previous_document_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileDocumentStore::open(dir.path()).unwrap();
        store.save(DocumentKind::FoodLog, "{\"2024-01-01\": []}").unwrap();
        store.save(DocumentKind::FoodLog, "{}").unwrap();

        let on_disk = std::fs::read_to_string(store.path_for(DocumentKind::FoodLog)).unwrap();
        assert_eq!(on_disk, "{}");
        assert!(!dir.path().join("food_log.json.tmp").exists());
    }

    #[test]
    fn missing_document_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert_eq!(store.load(DocumentKind::FoodLog).unwrap(), None);
    }

    #[test]
    fn save_then_load_returns_body_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileDocumentStore::open(dir.path().join("nested")).unwrap();
        store.save(DocumentKind::FoodDatabase, "[]").unwrap();

        assert_eq!(
            store.load(DocumentKind::FoodDatabase).unwrap().as_deref(),
            Some("[]")
        );
        let names: Vec<String> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["food_database.json".to_string()]);
    }
}
