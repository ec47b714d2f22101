//! File-backed station store adapter.
//!
//! Implements [`StorePort`] over a single JSON file mapping station name
//! → document. This is the standalone/bench backend; a yard deployment
//! points the same port at the shared document store instead.
//!
//! # Atomic writes
//!
//! Updates use a write-to-temp-then-rename pattern:
//! 1. Write the full map to `<store>.tmp`
//! 2. fsync the file
//! 3. Rename over `<store>`
//! 4. fsync the directory
//!
//! Readers (including other station processes sharing the file) always
//! see either the old or the new document set, never a partial write.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::{Map, Value};

use crate::app::ports::{StoreError, StorePort};
use crate::record::StationRecord;

/// JSON-file implementation of the station store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the full name → document map. A missing file is an empty
    /// store; a corrupt file is unavailable (never silently truncated).
    fn load_map(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                warn!("store read failed: {}", e);
                return Err(StoreError::Unavailable);
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!("store file {} is not a JSON document map", self.path.display());
                Err(StoreError::Unavailable)
            }
        }
    }

    fn save_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&Value::Object(map.clone()))
            .map_err(|_| StoreError::Unavailable)?;

        let tmp = self.path.with_extension("tmp");
        let write_atomic = || -> std::io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
            fs::rename(&tmp, &self.path)?;
            fsync_parent_dir(&self.path)
        };
        write_atomic().map_err(|e| {
            warn!("store write failed: {}", e);
            let _ = fs::remove_file(&tmp);
            StoreError::Unavailable
        })
    }
}

impl StorePort for FileStore {
    fn fetch_record(&mut self, station_name: &str) -> Result<StationRecord, StoreError> {
        let map = self.load_map()?;
        let doc = map.get(station_name).ok_or(StoreError::NotFound)?;
        serde_json::from_value(doc.clone()).map_err(|e| {
            warn!("station '{}' document malformed: {}", station_name, e);
            StoreError::Unavailable
        })
    }

    fn update_field(
        &mut self,
        station_name: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut map = self.load_map()?;
        match map.get_mut(station_name) {
            Some(Value::Object(doc)) => {
                doc.insert(field.to_string(), value);
            }
            Some(_) => {
                warn!("station '{}' document is not an object", station_name);
                return Err(StoreError::Unavailable);
            }
            None => {
                // Upsert: a station writes itself into existence.
                let mut doc = Map::new();
                doc.insert("name".to_string(), Value::String(station_name.to_string()));
                doc.insert(field.to_string(), value);
                map.insert(station_name.to_string(), Value::Object(doc));
            }
        }
        self.save_map(&map)
    }
}

fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        File::open(dir)?.sync_all()?;
    }
    Ok(())
}
