//! Postgres implementation of [`FieldStore`].

use dynafield_core::dynamic_field::{DynamicField, FieldDraft};
use dynafield_core::error::CoreError;
use dynafield_core::field_config::encode_config;
use dynafield_core::field_types::{FieldType, ObjectType};
use dynafield_core::field_value::{FieldValue, StoredValue};
use dynafield_core::filter::CompiledFilter;
use dynafield_core::screens::{ScreenConfig, ScreenLevel};
use dynafield_core::store::FieldStore;
use dynafield_core::types::DbId;

use crate::models::dynamic_field::{DynamicFieldRow, ValueSlots};
use crate::repositories::{DynamicFieldRepo, DynamicFieldValueRepo, ScreenConfigRepo};
use crate::DbPool;

/// SQLSTATE class for data exceptions (bad casts of filter input).
const DATA_EXCEPTION_CLASS: &str = "22";

#[derive(Debug, Clone)]
pub struct PgFieldStore {
    pool: DbPool,
}

impl PgFieldStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn to_field(row: DynamicFieldRow) -> Result<DynamicField, CoreError> {
    DynamicField::try_from(row)
}

fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |e| CoreError::storage(context, e)
}

impl FieldStore for PgFieldStore {
    /// `$1` is the candidate id array.
    const FILTER_FIRST_PARAM: usize = 2;

    async fn list_fields(
        &self,
        object_type: Option<ObjectType>,
        field_type: Option<FieldType>,
    ) -> Result<Vec<DynamicField>, CoreError> {
        DynamicFieldRepo::list(
            &self.pool,
            object_type.as_ref().map(ObjectType::as_str),
            field_type.as_ref().map(FieldType::as_str),
        )
        .await
        .map_err(storage("list dynamic fields"))?
        .into_iter()
        .map(to_field)
        .collect()
    }

    async fn find_field(&self, id: DbId) -> Result<Option<DynamicField>, CoreError> {
        DynamicFieldRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage("load dynamic field"))?
            .map(to_field)
            .transpose()
    }

    async fn find_field_by_name(&self, name: &str) -> Result<Option<DynamicField>, CoreError> {
        DynamicFieldRepo::find_by_name(&self.pool, name)
            .await
            .map_err(storage("load dynamic field by name"))?
            .map(to_field)
            .transpose()
    }

    async fn name_exists(&self, name: &str, exclude_id: Option<DbId>) -> Result<bool, CoreError> {
        DynamicFieldRepo::name_exists(&self.pool, name, exclude_id)
            .await
            .map_err(storage("check dynamic field name"))
    }

    async fn insert_field(&self, draft: &FieldDraft, user_id: DbId) -> Result<DynamicField, CoreError> {
        let config = encode_config(Some(&draft.config))?;
        let row = DynamicFieldRepo::insert(&self.pool, draft, &config, user_id)
            .await
            .map_err(storage("insert dynamic field"))?;
        to_field(row)
    }

    async fn update_field(
        &self,
        id: DbId,
        draft: &FieldDraft,
        user_id: DbId,
    ) -> Result<Option<DynamicField>, CoreError> {
        let config = encode_config(Some(&draft.config))?;
        DynamicFieldRepo::update(&self.pool, id, draft, &config, user_id)
            .await
            .map_err(storage("update dynamic field"))?
            .map(to_field)
            .transpose()
    }

    async fn delete_values_for_field(&self, field_id: DbId) -> Result<u64, CoreError> {
        DynamicFieldValueRepo::delete_for_field(&self.pool, field_id)
            .await
            .map_err(storage("delete dynamic field values"))
    }

    async fn delete_field(&self, id: DbId) -> Result<bool, CoreError> {
        DynamicFieldRepo::delete(&self.pool, id)
            .await
            .map_err(storage("delete dynamic field"))
    }

    async fn list_values(&self, object_id: DbId) -> Result<Vec<StoredValue>, CoreError> {
        let rows = DynamicFieldValueRepo::list_for_object(&self.pool, object_id)
            .await
            .map_err(storage("list dynamic field values"))?;
        Ok(rows.into_iter().filter_map(|r| r.into_stored()).collect())
    }

    async fn replace_value(
        &self,
        field_id: DbId,
        object_id: DbId,
        value: Option<&FieldValue>,
    ) -> Result<Option<StoredValue>, CoreError> {
        let row = DynamicFieldValueRepo::replace(&self.pool, field_id, object_id, value.map(ValueSlots::from))
            .await
            .map_err(storage("write dynamic field value"))?;
        Ok(row.and_then(|r| r.into_stored()))
    }

    async fn distinct_text_values(&self, field_id: DbId, limit: i64) -> Result<Vec<String>, CoreError> {
        DynamicFieldValueRepo::distinct_text(&self.pool, field_id, limit)
            .await
            .map_err(storage("list distinct dynamic field values"))
    }

    async fn list_screen_configs(&self, field_ids: &[DbId]) -> Result<Vec<ScreenConfig>, CoreError> {
        ScreenConfigRepo::list_for_fields(&self.pool, field_ids)
            .await
            .map_err(storage("list screen configs"))?
            .into_iter()
            .map(ScreenConfig::try_from)
            .collect()
    }

    async fn replace_screen_configs(
        &self,
        field_id: DbId,
        levels: &[(String, ScreenLevel)],
        user_id: DbId,
    ) -> Result<(), CoreError> {
        let rows: Vec<(String, i16)> = levels
            .iter()
            .filter(|(_, level)| *level != ScreenLevel::Disabled)
            .map(|(key, level)| (key.clone(), level.as_i16()))
            .collect();
        ScreenConfigRepo::replace_for_field(&self.pool, field_id, &rows, user_id)
            .await
            .map_err(storage("replace screen configs"))
    }

    async fn set_screen_config(
        &self,
        field_id: DbId,
        screen_key: &str,
        level: ScreenLevel,
        user_id: DbId,
    ) -> Result<(), CoreError> {
        if level == ScreenLevel::Disabled {
            ScreenConfigRepo::delete(&self.pool, field_id, screen_key)
                .await
                .map_err(storage("delete screen config"))?;
            return Ok(());
        }
        ScreenConfigRepo::upsert(&self.pool, field_id, screen_key, level.as_i16(), user_id)
            .await
            .map_err(storage("upsert screen config"))
    }

    async fn fields_for_screen(
        &self,
        screen_key: &str,
        object_type: ObjectType,
    ) -> Result<Vec<(DynamicField, ScreenLevel)>, CoreError> {
        ScreenConfigRepo::fields_for_screen(&self.pool, screen_key, object_type.as_str())
            .await
            .map_err(storage("list fields for screen"))?
            .into_iter()
            .map(|row| Ok((to_field(row.field)?, ScreenLevel::from_i16(row.config_value)?)))
            .collect()
    }

    async fn filter_objects(
        &self,
        candidates: &[DbId],
        filter: &CompiledFilter,
    ) -> Result<Vec<DbId>, CoreError> {
        if filter.first_param != Self::FILTER_FIRST_PARAM {
            return Err(CoreError::Internal(format!(
                "filter compiled from parameter {} but the object query needs {}",
                filter.first_param,
                Self::FILTER_FIRST_PARAM
            )));
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        DynamicFieldValueRepo::filter_objects(&self.pool, candidates, filter)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db)
                    if db
                        .code()
                        .is_some_and(|code| code.starts_with(DATA_EXCEPTION_CLASS)) =>
                {
                    CoreError::Validation(format!("invalid filter value: {}", db.message()))
                }
                _ => CoreError::storage("filter objects by dynamic field values", e),
            })
    }
}
