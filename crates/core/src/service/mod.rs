//! Orchestration of registry, values, screens, filtering and transfer over a
//! [`FieldStore`].
//!
//! Every operation validates its input before touching the store. Mutations
//! of field definitions invalidate the searchable-field cache.

mod registry;
mod screens;
mod search;
mod transfer;
mod values;

#[cfg(test)]
pub(crate) mod memory_store;

use std::sync::Arc;
use std::time::Duration;

use crate::error::CoreError;
use crate::search_cache::{Clock, SearchableFieldCache, SystemClock, DEFAULT_CACHE_TTL};
use crate::store::FieldStore;
use crate::types::DbId;

/// Default number of rows returned by distinct-value lookups.
pub const DISTINCT_VALUES_DEFAULT_LIMIT: i64 = 100;

pub struct FieldService<S> {
    store: S,
    cache: SearchableFieldCache,
}

impl<S: FieldStore> FieldService<S> {
    pub fn new(store: S) -> Self {
        Self::with_cache(store, Arc::new(SystemClock), DEFAULT_CACHE_TTL)
    }

    /// Build a service whose searchable-field cache uses `clock` and `ttl`.
    pub fn with_cache(store: S, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            cache: SearchableFieldCache::new(clock, ttl),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn require_field(&self, id: DbId) -> Result<crate::dynamic_field::DynamicField, CoreError> {
        self.store
            .find_field(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "dynamic_field",
                id,
            })
    }
}
