//! In-memory cache tier: a `DashMap` keyed by `(server_id, database_id)`
//! holding the most recently fetched snapshot, grounded on
//! `fraiseql-arrow`'s `QueryCache` (a `DashMap` of entries checked for
//! expiry on read rather than evicted by a background sweep).

use chrono::Utc;
use dashmap::DashMap;

use nlq_core::types::{CacheSource, SchemaCacheEntry, SchemaSnapshot};

type Key = (String, String);

#[derive(Default)]
pub struct MemoryTier {
    entries: DashMap<Key, SchemaCacheEntry>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, server: &str, database: &str, ttl: std::time::Duration) -> Option<SchemaSnapshot> {
        let entry = self.entries.get(&key(server, database))?;
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        entry.is_fresh(Utc::now(), ttl).then(|| entry.snapshot.clone())
    }

    pub fn insert(&self, server: &str, database: &str, snapshot: SchemaSnapshot) {
        let entry = SchemaCacheEntry::new(snapshot, Utc::now(), CacheSource::Memory);
        self.entries.insert(key(server, database), entry);
    }

    pub fn invalidate(&self, server: &str, database: &str) {
        self.entries.remove(&key(server, database));
    }

    pub fn clear_all(&self) {
        self.entries.clear();
    }
}

fn key(server: &str, database: &str) -> Key {
    (server.to_string(), database.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> SchemaSnapshot {
        SchemaSnapshot::new("srv", "db", Utc::now(), vec![])
    }

    #[test]
    fn a_fresh_entry_is_returned() {
        let tier = MemoryTier::new();
        tier.insert("srv", "db", sample_snapshot());
        assert!(tier.get("srv", "db", std::time::Duration::from_secs(60)).is_some());
    }

    #[test]
    fn a_missing_entry_is_none() {
        let tier = MemoryTier::new();
        assert!(tier.get("srv", "db", std::time::Duration::from_secs(60)).is_none());
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let tier = MemoryTier::new();
        tier.insert("srv", "db", sample_snapshot());
        tier.invalidate("srv", "db");
        assert!(tier.get("srv", "db", std::time::Duration::from_secs(60)).is_none());
    }
}
