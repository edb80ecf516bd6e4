use std::sync::Arc;
use std::time::Duration;

use dynafield_core::search_cache::SystemClock;
use dynafield_core::service::FieldService;
use dynafield_db::PgFieldStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dynafield_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Dynamic field service, owning the searchable-field cache.
    pub fields: Arc<FieldService<PgFieldStore>>,
}

impl AppState {
    pub fn new(pool: dynafield_db::DbPool, config: ServerConfig) -> Self {
        let fields = FieldService::with_cache(
            PgFieldStore::new(pool.clone()),
            Arc::new(SystemClock),
            Duration::from_secs(config.search_cache_ttl_secs),
        );
        Self {
            pool,
            config: Arc::new(config),
            fields: Arc::new(fields),
        }
    }
}
