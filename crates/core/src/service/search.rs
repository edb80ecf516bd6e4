use tracing::debug;

use super::FieldService;
use crate::dynamic_field::DynamicField;
use crate::error::CoreError;
use crate::filter::{compile, CompiledFilter, FieldRef, FilterCondition};
use crate::field_types::ObjectType;
use crate::search_cache::Snapshot;
use crate::store::FieldStore;
use crate::types::DbId;

impl<S: FieldStore> FieldService<S> {
    /// Valid Ticket fields with their selectable options, served from the
    /// cache.
    pub async fn searchable_fields(&self) -> Result<Snapshot, CoreError> {
        self.cache
            .get_or_load(|| self.store.list_fields(Some(ObjectType::Ticket), None))
            .await
    }

    pub async fn invalidate_search_cache(&self) {
        self.cache.invalidate().await;
    }

    async fn resolve_field(&self, field: &FieldRef) -> Result<Option<DynamicField>, CoreError> {
        match field {
            FieldRef::Id(id) => self.store.find_field(*id).await,
            FieldRef::Name(name) => self.store.find_field_by_name(name).await,
        }
    }

    /// Resolve each condition's field and compile the lot.
    ///
    /// Conditions on unknown fields are dropped; storage failures during
    /// resolution propagate.
    pub async fn compile_filter(
        &self,
        conditions: &[FilterCondition],
        start_param: usize,
    ) -> Result<CompiledFilter, CoreError> {
        let mut resolved = Vec::with_capacity(conditions.len());
        for condition in conditions {
            match self.resolve_field(&condition.field).await? {
                Some(field) => resolved.push((field, condition)),
                None => debug!(field = ?condition.field, "Skipping filter on unknown dynamic field"),
            }
        }
        Ok(compile(
            resolved.iter().map(|(field, condition)| (field, *condition)),
            start_param,
        ))
    }

    /// Ids from `candidates` (in order) matching all conditions.
    pub async fn filter_objects(
        &self,
        candidates: &[DbId],
        conditions: &[FilterCondition],
    ) -> Result<Vec<DbId>, CoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let compiled = self.compile_filter(conditions, S::FILTER_FIRST_PARAM).await?;
        if compiled.is_empty() {
            return Ok(candidates.to_vec());
        }
        self.store.filter_objects(candidates, &compiled).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use crate::dynamic_field::FieldDraft;
    use crate::field_config::{FieldConfig, SelectionConfig};
    use crate::field_types::{FieldType, ObjectType};
    use crate::field_value::FieldValue;
    use crate::filter::{parse_filter_params, FilterCondition, FilterOperator};
    use crate::search_cache::Clock;
    use crate::service::memory_store::{service, MemoryStore};
    use crate::service::FieldService;
    use crate::store::FieldStore;
    use crate::types::Timestamp;

    fn priority() -> FieldDraft {
        FieldDraft::new("Priority1", "Priority", FieldType::Dropdown, ObjectType::Ticket).with_config(
            FieldConfig::Dropdown(SelectionConfig {
                possible_values: BTreeMap::from([
                    ("1".to_string(), "Low".to_string()),
                    ("2".to_string(), "High".to_string()),
                ]),
                ..Default::default()
            }),
        )
    }

    #[tokio::test]
    async fn gt_filter_on_dropdown_text() {
        let svc = service();
        let f = svc.create_field(priority(), 1).await.unwrap();
        svc.set_value(f.id, 10, Some(FieldValue::Text("2".into()))).await.unwrap();
        svc.set_value(f.id, 11, Some(FieldValue::Text("1".into()))).await.unwrap();

        let conditions = parse_filter_params([("df_Priority1_gt", "1")]);
        let matched = svc.filter_objects(&[10, 11, 12], &conditions).await.unwrap();
        assert_eq!(matched, vec![10]);
    }

    #[tokio::test]
    async fn unknown_fields_are_skipped() {
        let svc = service();
        let conditions = vec![
            FilterCondition::by_name("Missing", FilterOperator::Eq, "x"),
            FilterCondition::by_id(999, FilterOperator::Eq, "x"),
        ];
        let compiled = svc.compile_filter(&conditions, 1).await.unwrap();
        assert!(compiled.is_empty());
        assert_eq!(svc.filter_objects(&[1, 2], &conditions).await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn empty_and_notempty_partition_objects() {
        let svc = service();
        let f = svc
            .create_field(FieldDraft::new("Notes", "Notes", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();
        svc.set_value(f.id, 1, Some(FieldValue::Text("filled".into()))).await.unwrap();
        svc.set_value(f.id, 2, Some(FieldValue::Text(String::new()))).await.unwrap();

        let empty = [FilterCondition::by_name("Notes", FilterOperator::Empty, "1")];
        let not_empty = [FilterCondition::by_name("Notes", FilterOperator::NotEmpty, "1")];
        assert_eq!(svc.filter_objects(&[1, 2, 3], &empty).await.unwrap(), vec![2, 3]);
        assert_eq!(svc.filter_objects(&[1, 2, 3], &not_empty).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn conditions_are_anded() {
        let svc = service();
        let p = svc.create_field(priority(), 1).await.unwrap();
        let urgent = svc
            .create_field(FieldDraft::new("Urgent", "Urgent", FieldType::Checkbox, ObjectType::Ticket), 1)
            .await
            .unwrap();
        svc.set_value(p.id, 1, Some(FieldValue::Text("2".into()))).await.unwrap();
        svc.set_value(p.id, 2, Some(FieldValue::Text("2".into()))).await.unwrap();
        svc.set_value(urgent.id, 1, Some(FieldValue::Integer(1))).await.unwrap();
        svc.set_value(urgent.id, 2, Some(FieldValue::Integer(0))).await.unwrap();

        let conditions = parse_filter_params([("df_Priority1_in", "2,3"), ("df_Urgent", "on")]);
        assert_eq!(svc.filter_objects(&[1, 2], &conditions).await.unwrap(), vec![1]);

        let unchecked = parse_filter_params([("df_Urgent", "0")]);
        assert_eq!(svc.filter_objects(&[1, 2, 3], &unchecked).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn contains_and_ne() {
        let svc = service();
        let f = svc
            .create_field(FieldDraft::new("City", "City", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();
        svc.set_value(f.id, 1, Some(FieldValue::Text("Stockholm".into()))).await.unwrap();
        svc.set_value(f.id, 2, Some(FieldValue::Text("Oslo".into()))).await.unwrap();

        let contains = parse_filter_params([("df_City_contains", "holm")]);
        assert_eq!(svc.filter_objects(&[1, 2], &contains).await.unwrap(), vec![1]);

        let ne = parse_filter_params([("df_City_ne", "Oslo")]);
        assert_eq!(svc.filter_objects(&[1, 2], &ne).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn date_range_filter() {
        let svc = service();
        let f = svc
            .create_field(FieldDraft::new("Due", "Due", FieldType::Date, ObjectType::Ticket), 1)
            .await
            .unwrap();
        let jan = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        svc.set_value(f.id, 1, Some(FieldValue::Date(jan))).await.unwrap();
        svc.set_value(f.id, 2, Some(FieldValue::Date(mar))).await.unwrap();

        let conditions = parse_filter_params([("df_Due_gte", "2026-02-01")]);
        assert_eq!(svc.filter_objects(&[1, 2], &conditions).await.unwrap(), vec![2]);
    }

    struct FakeClock(Mutex<Timestamp>);

    impl Clock for FakeClock {
        fn now(&self) -> Timestamp {
            *self.0.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn searchable_fields_are_cached_until_ttl() {
        let clock = Arc::new(FakeClock(Mutex::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        )));
        let svc = FieldService::with_cache(MemoryStore::default(), clock.clone(), Duration::from_secs(30));
        svc.create_field(priority(), 1).await.unwrap();

        let first = svc.searchable_fields().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].options.len(), 2);

        // A write behind the service's back is not seen within the TTL.
        svc.store()
            .insert_field(
                &FieldDraft::new("Late", "Late", FieldType::Text, ObjectType::Ticket),
                1,
            )
            .await
            .unwrap();
        *clock.0.lock().unwrap() += chrono::Duration::seconds(10);
        let second = svc.searchable_fields().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        *clock.0.lock().unwrap() += chrono::Duration::seconds(25);
        let third = svc.searchable_fields().await.unwrap();
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn registry_mutations_invalidate_cache() {
        let svc = service();
        assert!(svc.searchable_fields().await.unwrap().is_empty());
        svc.create_field(priority(), 1).await.unwrap();
        assert_eq!(svc.searchable_fields().await.unwrap().len(), 1);
    }
}
