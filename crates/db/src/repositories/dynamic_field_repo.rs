//! Repository for the `dynamic_field` table.

use dynafield_core::dynamic_field::FieldDraft;
use dynafield_core::types::DbId;
use sqlx::PgPool;

use crate::models::dynamic_field::DynamicFieldRow;

/// Column list for `dynamic_field` queries.
pub(crate) const COLUMNS: &str = "\
    id, internal_field, name, label, field_order, field_type, object_type, \
    config, is_valid, created_at, created_by, updated_at, updated_by";

/// Provides CRUD operations for dynamic field definitions.
pub struct DynamicFieldRepo;

impl DynamicFieldRepo {
    /// List fields, optionally filtered, ordered by object type, field order,
    /// then name.
    pub async fn list(
        pool: &PgPool,
        object_type: Option<&str>,
        field_type: Option<&str>,
    ) -> Result<Vec<DynamicFieldRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dynamic_field \
             WHERE ($1::TEXT IS NULL OR object_type = $1) \
               AND ($2::TEXT IS NULL OR field_type = $2) \
             ORDER BY object_type, field_order, name"
        );
        sqlx::query_as::<_, DynamicFieldRow>(&query)
            .bind(object_type)
            .bind(field_type)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DynamicFieldRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dynamic_field WHERE id = $1");
        sqlx::query_as::<_, DynamicFieldRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<DynamicFieldRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dynamic_field WHERE name = $1");
        sqlx::query_as::<_, DynamicFieldRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Whether a field other than `exclude_id` is named `name`.
    pub async fn name_exists(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (\
                SELECT 1 FROM dynamic_field \
                WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Insert a new field with its encoded config, returning the created row.
    pub async fn insert(
        pool: &PgPool,
        draft: &FieldDraft,
        config: &[u8],
        user_id: DbId,
    ) -> Result<DynamicFieldRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO dynamic_field \
                (internal_field, name, label, field_order, field_type, object_type, \
                 config, is_valid, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DynamicFieldRow>(&query)
            .bind(draft.internal)
            .bind(&draft.name)
            .bind(&draft.label)
            .bind(draft.field_order)
            .bind(draft.field_type.as_str())
            .bind(draft.object_type.as_str())
            .bind(config)
            .bind(draft.is_valid)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Replace all attributes except `internal_field`. Returns `None` if not
    /// found.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        draft: &FieldDraft,
        config: &[u8],
        user_id: DbId,
    ) -> Result<Option<DynamicFieldRow>, sqlx::Error> {
        let query = format!(
            "UPDATE dynamic_field SET \
                name = $2, label = $3, field_order = $4, field_type = $5, \
                object_type = $6, config = $7, is_valid = $8, \
                updated_at = NOW(), updated_by = $9 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DynamicFieldRow>(&query)
            .bind(id)
            .bind(&draft.name)
            .bind(&draft.label)
            .bind(draft.field_order)
            .bind(draft.field_type.as_str())
            .bind(draft.object_type.as_str())
            .bind(config)
            .bind(draft.is_valid)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a field by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dynamic_field WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
