//! File cache tier (§6): one JSON file per `(server_id, database_id)` pair,
//! written atomically via a temp file + rename so a reader never observes a
//! half-written cache. `tempfile::NamedTempFile` as the write-then-rename
//! primitive is the same pattern a psql-backed schema cache in the broader
//! pack uses for its own on-disk catalog snapshot.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nlq_core::error::ErrorKind;
use nlq_core::types::{SchemaSnapshot, TableDescriptor};

use crate::paths::cache_file_path;

const CACHE_FORMAT_VERSION: u32 = 1;

/// The on-disk shape from §6: a flat `tables` array rather than the
/// in-memory `BTreeMap` `SchemaSnapshot` keeps its tables in.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    server_id: String,
    database_id: String,
    captured_at: DateTime<Utc>,
    fingerprint: String,
    tables: Vec<TableDescriptor>,
}

pub struct FileTier {
    directory: PathBuf,
}

impl FileTier {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Loads and validates a cache file, discarding (returning `None`) rather
    /// than erroring on anything unreadable, malformed, or tampered with —
    /// a corrupt cache file degrades to a cache miss, not a pipeline failure.
    pub fn load(&self, server: &str, database: &str) -> Option<SchemaSnapshot> {
        let path = cache_file_path(&self.directory, server, database);
        let content = std::fs::read_to_string(&path).ok()?;
        let file: CacheFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "discarding unreadable schema cache file");
                return None;
            }
        };

        let tables = file
            .tables
            .into_iter()
            .map(|table| (table.qualified_name(), table))
            .collect();
        let snapshot = SchemaSnapshot::from_cached_parts(file.server_id, file.database_id, file.captured_at, tables);

        if snapshot.fingerprint() != file.fingerprint {
            tracing::warn!(path = %path.display(), "discarding schema cache file with mismatched fingerprint");
            return None;
        }

        Some(snapshot)
    }

    pub fn store(&self, snapshot: &SchemaSnapshot) -> Result<(), ErrorKind> {
        std::fs::create_dir_all(&self.directory)
            .map_err(|err| ErrorKind::CacheCorrupt(format!("could not create cache directory: {err}")))?;

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            server_id: snapshot.server_id().to_string(),
            database_id: snapshot.database_id().to_string(),
            captured_at: snapshot.captured_at(),
            fingerprint: snapshot.fingerprint().to_string(),
            tables: snapshot.tables().values().cloned().collect(),
        };
        let body = serde_json::to_vec_pretty(&file)
            .map_err(|err| ErrorKind::CacheCorrupt(format!("could not serialize schema cache: {err}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.directory)
            .map_err(|err| ErrorKind::CacheCorrupt(format!("could not create temp cache file: {err}")))?;
        tmp.write_all(&body)
            .map_err(|err| ErrorKind::CacheCorrupt(format!("could not write temp cache file: {err}")))?;

        let path = cache_file_path(&self.directory, snapshot.server_id(), snapshot.database_id());
        tmp.persist(path)
            .map_err(|err| ErrorKind::CacheCorrupt(format!("could not persist cache file: {err}")))?;
        Ok(())
    }

    pub fn invalidate(&self, server: &str, database: &str) {
        let _ = std::fs::remove_file(cache_file_path(&self.directory, server, database));
    }

    pub fn clear_all(&self) {
        let Ok(entries) = std::fs::read_dir(&self.directory) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}
