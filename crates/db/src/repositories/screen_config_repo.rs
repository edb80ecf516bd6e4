//! Repository for the `dynamic_field_screen_config` table.

use dynafield_core::types::DbId;
use sqlx::PgPool;

use super::dynamic_field_repo::COLUMNS as FIELD_COLUMNS;
use crate::models::dynamic_field::{FieldOnScreenRow, ScreenConfigRow};

const COLUMNS: &str = "\
    id, field_id, screen_key, config_value, created_at, created_by, updated_at, updated_by";

pub struct ScreenConfigRepo;

impl ScreenConfigRepo {
    /// Rows of the given fields, ordered by field then screen key.
    pub async fn list_for_fields(
        pool: &PgPool,
        field_ids: &[DbId],
    ) -> Result<Vec<ScreenConfigRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dynamic_field_screen_config \
             WHERE field_id = ANY($1) \
             ORDER BY field_id, screen_key"
        );
        sqlx::query_as::<_, ScreenConfigRow>(&query)
            .bind(field_ids)
            .fetch_all(pool)
            .await
    }

    /// Replace all rows of a field in one transaction.
    pub async fn replace_for_field(
        pool: &PgPool,
        field_id: DbId,
        levels: &[(String, i16)],
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM dynamic_field_screen_config WHERE field_id = $1")
            .bind(field_id)
            .execute(&mut *tx)
            .await?;

        for (screen_key, level) in levels {
            sqlx::query(
                "INSERT INTO dynamic_field_screen_config \
                    (field_id, screen_key, config_value, created_by, updated_by) \
                 VALUES ($1, $2, $3, $4, $4)",
            )
            .bind(field_id)
            .bind(screen_key)
            .bind(*level)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert or update one (field, screen) row.
    pub async fn upsert(
        pool: &PgPool,
        field_id: DbId,
        screen_key: &str,
        level: i16,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO dynamic_field_screen_config \
                (field_id, screen_key, config_value, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT ON CONSTRAINT uq_dynamic_field_screen_config_field_screen \
             DO UPDATE SET config_value = EXCLUDED.config_value, \
                           updated_at = NOW(), updated_by = EXCLUDED.updated_by",
        )
        .bind(field_id)
        .bind(screen_key)
        .bind(level)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete one (field, screen) row. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, field_id: DbId, screen_key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM dynamic_field_screen_config WHERE field_id = $1 AND screen_key = $2",
        )
        .bind(field_id)
        .bind(screen_key)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Valid fields of an object type with a non-disabled level on a screen,
    /// ordered by field order then name.
    pub async fn fields_for_screen(
        pool: &PgPool,
        screen_key: &str,
        object_type: &str,
    ) -> Result<Vec<FieldOnScreenRow>, sqlx::Error> {
        let field_columns = FIELD_COLUMNS
            .split(',')
            .map(|c| format!("df.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {field_columns}, sc.config_value \
             FROM dynamic_field df \
             JOIN dynamic_field_screen_config sc ON sc.field_id = df.id \
             WHERE sc.screen_key = $1 AND df.object_type = $2 \
               AND df.is_valid AND sc.config_value > 0 \
             ORDER BY df.field_order, df.name"
        );
        sqlx::query_as::<_, FieldOnScreenRow>(&query)
            .bind(screen_key)
            .bind(object_type)
            .fetch_all(pool)
            .await
    }
}
