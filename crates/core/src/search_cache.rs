//! Time-bounded read-through cache of the fields search and filter UIs offer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::dynamic_field::DynamicField;
use crate::error::CoreError;
use crate::field_types::ObjectType;
use crate::types::Timestamp;

/// Freshness window of a loaded snapshot.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// A selectable option of a Dropdown/Multiselect field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOption {
    pub key: String,
    pub value: String,
}

/// A field offered for searching, with its options flattened for UI use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchableField {
    pub field: DynamicField,
    /// Empty for non-selection types.
    pub options: Vec<FieldOption>,
}

pub type Snapshot = Arc<Vec<SearchableField>>;

struct CacheEntry {
    loaded_at: Timestamp,
    fields: Snapshot,
}

/// Project loaded fields into the searchable set: valid Ticket fields only.
pub fn project_searchable(fields: Vec<DynamicField>) -> Vec<SearchableField> {
    fields
        .into_iter()
        .filter(|f| f.is_valid && f.object_type == ObjectType::Ticket)
        .map(|field| {
            let options = field
                .config
                .possible_values()
                .map(|values| {
                    values
                        .iter()
                        .map(|(key, value)| FieldOption {
                            key: key.clone(),
                            value: value.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            SearchableField { field, options }
        })
        .collect()
}

/// Lazily refreshed snapshot of searchable fields.
///
/// Readers share the snapshot under a read lock. An expired or absent
/// snapshot is reloaded by the calling reader; the write lock is only taken
/// to publish the result, never across the load. Concurrent reloads are not
/// deduplicated.
pub struct SearchableFieldCache {
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    entry: RwLock<Option<CacheEntry>>,
}

impl SearchableFieldCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            entry: RwLock::new(None),
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(Arc::new(SystemClock), ttl)
    }

    /// Return the current snapshot, reloading through `load` when stale.
    ///
    /// A failed load leaves any previous snapshot in place and propagates.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Snapshot, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<DynamicField>, CoreError>>,
    {
        let now = self.clock.now();
        if let Some(entry) = self.entry.read().await.as_ref() {
            if now.signed_duration_since(entry.loaded_at) < self.ttl {
                return Ok(Arc::clone(&entry.fields));
            }
        }

        tracing::debug!("Reloading searchable dynamic field cache");
        let fields: Snapshot = Arc::new(project_searchable(load().await?));
        *self.entry.write().await = Some(CacheEntry {
            loaded_at: self.clock.now(),
            fields: Arc::clone(&fields),
        });
        Ok(fields)
    }

    /// Drop the snapshot; the next read reloads.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}
