//! The `SchemaRetrieverPort` implementation: memory tier, then file tier,
//! then a catalog fetch coalesced across concurrent callers for the same
//! `(server, database)` key. Coalescing has no teacher counterpart — the
//! pack has no retriever that fans out to concurrent callers at all — so it
//! is built directly on `tokio::sync::OnceCell`'s `get_or_try_init`, which
//! already gives "only one initializer runs, the rest await its result" for
//! free; `dashmap` supplies the per-key slot the way it does for the memory
//! tier.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::instrument;

use nlq_core::config::SchemaCacheConfig;
use nlq_core::error::{ErrorKind, PipelineError, Stage};
use nlq_core::ports::DatabaseGateway;
use nlq_core::stage_ports::SchemaRetrieverPort;
use nlq_core::types::SchemaSnapshot;

use crate::assemble::assemble_tables;
use crate::file::FileTier;
use crate::memory::MemoryTier;

type Key = (String, String);

pub struct SchemaCache {
    memory: MemoryTier,
    file: FileTier,
    gateway: Arc<dyn DatabaseGateway>,
    config: SchemaCacheConfig,
    inflight: DashMap<Key, Arc<OnceCell<SchemaSnapshot>>>,
}

impl SchemaCache {
    pub fn new(gateway: Arc<dyn DatabaseGateway>, config: SchemaCacheConfig) -> Arc<Self> {
        let file = FileTier::new(config.directory.clone());
        Arc::new(Self {
            memory: MemoryTier::new(),
            file,
            gateway,
            config,
            inflight: DashMap::new(),
        })
    }

    /// Drops both tiers' entries for a key, forcing the next lookup to
    /// refetch from the catalog.
    pub fn invalidate(&self, server: &str, database: &str) {
        self.memory.invalidate(server, database);
        self.file.invalidate(server, database);
    }

    /// Drops every cached entry across both tiers.
    pub fn clear_all(&self) {
        self.memory.clear_all();
        self.file.clear_all();
    }

    async fn fetch_and_store(&self, server: &str, database: &str) -> Result<SchemaSnapshot, PipelineError> {
        let catalog = self
            .gateway
            .describe_catalog(server, database)
            .await
            .map_err(|err| fail(ErrorKind::CatalogFetchFailed(err.to_string())))?;

        let tables = assemble_tables(catalog.columns);
        let snapshot = SchemaSnapshot::new(server, database, Utc::now(), tables);

        if self.config.enabled {
            self.memory.insert(server, database, snapshot.clone());
            if let Err(err) = self.file.store(&snapshot) {
                tracing::warn!(%err, "failed to persist schema cache file tier");
            }
        }

        Ok(snapshot)
    }

    /// Coalesces concurrent fetches for the same key onto a single catalog
    /// call. The inflight slot is always removed after the call resolves —
    /// on success so the next cache miss (once the TTL lapses) starts a
    /// fresh fetch instead of replaying a long-resolved `OnceCell`, and on
    /// failure so a transient error doesn't poison every later lookup.
    async fn fetch_singleflight(&self, server: &str, database: &str) -> Result<SchemaSnapshot, PipelineError> {
        let key = (server.to_string(), database.to_string());
        let cell = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell
            .get_or_try_init(|| self.fetch_and_store(server, database))
            .await
            .map(Clone::clone);
        self.inflight.remove(&key);
        result
    }
}

#[async_trait]
impl SchemaRetrieverPort for SchemaCache {
    #[instrument(skip(self), fields(server = %server, database = %database))]
    async fn schema_for(&self, server: &str, database: &str) -> Result<SchemaSnapshot, PipelineError> {
        if !self.config.enabled {
            return self.fetch_and_store(server, database).await;
        }

        if let Some(snapshot) = self.memory.get(server, database, self.config.ttl) {
            return Ok(snapshot);
        }

        if let Some(snapshot) = self.file.load(server, database) {
            let ttl = chrono::Duration::from_std(self.config.ttl).unwrap_or(chrono::Duration::zero());
            if Utc::now().signed_duration_since(snapshot.captured_at()) < ttl {
                self.memory.insert(server, database, snapshot.clone());
                return Ok(snapshot);
            }
        }

        self.fetch_singleflight(server, database).await
    }
}

fn fail(kind: ErrorKind) -> PipelineError {
    PipelineError::new(Stage::SchemaRetriever, kind)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use nlq_core::ports::{CancelToken, CatalogResult, DatabaseError, QueryStream};

    use super::*;

    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DatabaseGateway for CountingGateway {
        async fn describe_catalog(&self, _server: &str, _database: &str) -> Result<CatalogResult, DatabaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CatalogResult { columns: vec![] })
        }

        async fn run_read_only(
            &self,
            _sql: &str,
            _statement_timeout: Duration,
            _row_cap: usize,
            _cancel: CancelToken,
        ) -> Result<QueryStream, DatabaseError> {
            unimplemented!("not exercised by schema retrieval tests")
        }

        async fn cancel(&self, _token: CancelToken) {}
    }

    fn config(dir: &std::path::Path) -> SchemaCacheConfig {
        SchemaCacheConfig {
            ttl: Duration::from_secs(3600),
            enabled: true,
            directory: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn a_second_lookup_hits_the_memory_tier() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(CountingGateway { calls: AtomicUsize::new(0) });
        let cache = SchemaCache::new(gateway.clone(), config(dir.path()));

        cache.schema_for("srv", "db").await.unwrap();
        cache.schema_for("srv", "db").await.unwrap();

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_for_the_same_key_coalesce_into_one_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(CountingGateway { calls: AtomicUsize::new(0) });
        let cache = SchemaCache::new(gateway.clone(), config(dir.path()));

        let (a, b) = tokio::join!(cache.schema_for("srv", "db"), cache.schema_for("srv", "db"));
        a.unwrap();
        b.unwrap();

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(CountingGateway { calls: AtomicUsize::new(0) });
        let cache = SchemaCache::new(gateway.clone(), config(dir.path()));

        cache.schema_for("srv", "db").await.unwrap();
        cache.invalidate("srv", "db");
        cache.schema_for("srv", "db").await.unwrap();

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_disabled_cache_always_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(CountingGateway { calls: AtomicUsize::new(0) });
        let mut cfg = config(dir.path());
        cfg.enabled = false;
        let cache = SchemaCache::new(gateway.clone(), cfg);

        cache.schema_for("srv", "db").await.unwrap();
        cache.schema_for("srv", "db").await.unwrap();

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }
}
