//! Repository for the `dynamic_field_value` table.

use dynafield_core::filter::CompiledFilter;
use dynafield_core::types::DbId;
use sqlx::PgPool;

use crate::filter_sql::{bind_params, render_conditions};
use crate::models::dynamic_field::{DynamicFieldValueRow, ValueSlots};

const COLUMNS: &str = "id, field_id, object_id, value_text, value_date, value_int";

pub struct DynamicFieldValueRepo;

impl DynamicFieldValueRepo {
    /// All value rows of one object, ordered by field.
    pub async fn list_for_object(
        pool: &PgPool,
        object_id: DbId,
    ) -> Result<Vec<DynamicFieldValueRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dynamic_field_value \
             WHERE object_id = $1 ORDER BY field_id"
        );
        sqlx::query_as::<_, DynamicFieldValueRow>(&query)
            .bind(object_id)
            .fetch_all(pool)
            .await
    }

    /// Delete the (field, object) row if present, then insert `slots` when
    /// given, in one transaction.
    pub async fn replace(
        pool: &PgPool,
        field_id: DbId,
        object_id: DbId,
        slots: Option<ValueSlots<'_>>,
    ) -> Result<Option<DynamicFieldValueRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM dynamic_field_value WHERE field_id = $1 AND object_id = $2")
            .bind(field_id)
            .bind(object_id)
            .execute(&mut *tx)
            .await?;

        let inserted = match slots {
            None => None,
            Some(slots) => {
                let query = format!(
                    "INSERT INTO dynamic_field_value \
                        (field_id, object_id, value_text, value_date, value_int) \
                     VALUES ($1, $2, $3, $4, $5) \
                     RETURNING {COLUMNS}"
                );
                let row = sqlx::query_as::<_, DynamicFieldValueRow>(&query)
                    .bind(field_id)
                    .bind(object_id)
                    .bind(slots.text)
                    .bind(slots.date)
                    .bind(slots.int)
                    .fetch_one(&mut *tx)
                    .await?;
                Some(row)
            }
        };

        tx.commit().await?;
        Ok(inserted)
    }

    /// Delete every value of a field. Returns the number of rows removed.
    pub async fn delete_for_field(pool: &PgPool, field_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dynamic_field_value WHERE field_id = $1")
            .bind(field_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Distinct non-empty text values of a field, sorted.
    pub async fn distinct_text(
        pool: &PgPool,
        field_id: DbId,
        limit: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT value_text FROM dynamic_field_value \
             WHERE field_id = $1 AND value_text IS NOT NULL AND value_text <> '' \
             ORDER BY value_text \
             LIMIT $2",
        )
        .bind(field_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// The candidate object ids matching `filter`, in candidate order.
    ///
    /// Candidates are bound as `$1`, so `filter` must be compiled starting at
    /// parameter 2.
    pub async fn filter_objects(
        pool: &PgPool,
        candidates: &[DbId],
        filter: &CompiledFilter,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let query = format!(
            "SELECT t.id FROM UNNEST($1::BIGINT[]) WITH ORDINALITY AS t(id, ord) \
             WHERE {} \
             ORDER BY t.ord",
            render_conditions(filter, "t.id")
        );
        let scalar = sqlx::query_scalar::<_, DbId>(&query).bind(candidates);
        bind_params(scalar, filter).fetch_all(pool).await
    }
}
