//! Storage port of the dynamic field engine.
//!
//! [`FieldStore`] is the only way the service layer touches persistence. The
//! Postgres implementation lives in `dynafield-db`; errors it returns are
//! already wrapped with [`CoreError::Storage`] and the failed operation.

use std::future::Future;

use crate::dynamic_field::{DynamicField, FieldDraft};
use crate::error::CoreError;
use crate::field_types::{FieldType, ObjectType};
use crate::field_value::{FieldValue, StoredValue};
use crate::filter::CompiledFilter;
use crate::screens::{ScreenConfig, ScreenLevel};
use crate::types::DbId;

pub trait FieldStore: Send + Sync {
    /// First parameter number available to compiled filters passed to
    /// [`FieldStore::filter_objects`].
    const FILTER_FIRST_PARAM: usize;

    // -- fields -------------------------------------------------------------

    /// Fields ordered by object type, field order, then name.
    fn list_fields(
        &self,
        object_type: Option<ObjectType>,
        field_type: Option<FieldType>,
    ) -> impl Future<Output = Result<Vec<DynamicField>, CoreError>> + Send;

    fn find_field(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<DynamicField>, CoreError>> + Send;

    fn find_field_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DynamicField>, CoreError>> + Send;

    /// Whether another field (not `exclude_id`) already uses `name`.
    fn name_exists(
        &self,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    /// Insert the row and its encoded config in one write.
    fn insert_field(
        &self,
        draft: &FieldDraft,
        user_id: DbId,
    ) -> impl Future<Output = Result<DynamicField, CoreError>> + Send;

    /// Replace every attribute except `internal`. `None` if the id is unknown.
    fn update_field(
        &self,
        id: DbId,
        draft: &FieldDraft,
        user_id: DbId,
    ) -> impl Future<Output = Result<Option<DynamicField>, CoreError>> + Send;

    /// Returns the number of value rows removed.
    fn delete_values_for_field(
        &self,
        field_id: DbId,
    ) -> impl Future<Output = Result<u64, CoreError>> + Send;

    fn delete_field(&self, id: DbId) -> impl Future<Output = Result<bool, CoreError>> + Send;

    // -- values -------------------------------------------------------------

    /// Values of one object, ordered by field id.
    fn list_values(
        &self,
        object_id: DbId,
    ) -> impl Future<Output = Result<Vec<StoredValue>, CoreError>> + Send;

    /// Delete the (field, object) row, then insert `value` when present.
    fn replace_value(
        &self,
        field_id: DbId,
        object_id: DbId,
        value: Option<&FieldValue>,
    ) -> impl Future<Output = Result<Option<StoredValue>, CoreError>> + Send;

    /// Distinct non-empty text values of a field, sorted.
    fn distinct_text_values(
        &self,
        field_id: DbId,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    // -- screens ------------------------------------------------------------

    fn list_screen_configs(
        &self,
        field_ids: &[DbId],
    ) -> impl Future<Output = Result<Vec<ScreenConfig>, CoreError>> + Send;

    /// Replace all rows of a field with `levels` (non-disabled entries only).
    fn replace_screen_configs(
        &self,
        field_id: DbId,
        levels: &[(String, ScreenLevel)],
        user_id: DbId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Upsert one row; `Disabled` deletes it.
    fn set_screen_config(
        &self,
        field_id: DbId,
        screen_key: &str,
        level: ScreenLevel,
        user_id: DbId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Valid fields of `object_type` enabled or required on `screen_key`,
    /// ordered by field order then name.
    fn fields_for_screen(
        &self,
        screen_key: &str,
        object_type: ObjectType,
    ) -> impl Future<Output = Result<Vec<(DynamicField, ScreenLevel)>, CoreError>> + Send;

    // -- filtering ----------------------------------------------------------

    /// The subset of `candidates` matching every predicate of `filter`, in
    /// candidate order.
    fn filter_objects(
        &self,
        candidates: &[DbId],
        filter: &CompiledFilter,
    ) -> impl Future<Output = Result<Vec<DbId>, CoreError>> + Send;
}
