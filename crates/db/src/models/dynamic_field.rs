//! Row structs for the dynamic field tables and their conversion into
//! domain types.

use dynafield_core::dynamic_field::DynamicField;
use dynafield_core::error::CoreError;
use dynafield_core::field_config::decode_config;
use dynafield_core::field_types::{FieldType, ObjectType};
use dynafield_core::field_value::{FieldValue, StoredValue};
use dynafield_core::screens::{ScreenConfig, ScreenLevel};
use dynafield_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `dynamic_field` table.
#[derive(Debug, Clone, FromRow)]
pub struct DynamicFieldRow {
    pub id: DbId,
    pub internal_field: bool,
    pub name: String,
    pub label: String,
    pub field_order: i32,
    pub field_type: String,
    pub object_type: String,
    /// YAML-encoded [`dynafield_core::field_config::FieldConfig`].
    pub config: Vec<u8>,
    pub is_valid: bool,
    pub created_at: Timestamp,
    pub created_by: DbId,
    pub updated_at: Timestamp,
    pub updated_by: DbId,
}

impl TryFrom<DynamicFieldRow> for DynamicField {
    type Error = CoreError;

    fn try_from(row: DynamicFieldRow) -> Result<Self, Self::Error> {
        let field_type = FieldType::parse(&row.field_type).map_err(|_| {
            CoreError::Parse(format!(
                "dynamic_field {} has unknown field type '{}'",
                row.id, row.field_type
            ))
        })?;
        let object_type = ObjectType::parse(&row.object_type).map_err(|_| {
            CoreError::Parse(format!(
                "dynamic_field {} has unknown object type '{}'",
                row.id, row.object_type
            ))
        })?;
        let config = decode_config(field_type, &row.config)?;

        Ok(DynamicField {
            id: row.id,
            internal: row.internal_field,
            name: row.name,
            label: row.label,
            field_order: row.field_order,
            field_type,
            object_type,
            config,
            is_valid: row.is_valid,
            created_at: row.created_at,
            created_by: row.created_by,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        })
    }
}

/// A row from `dynamic_field_value`. At most one typed slot is populated.
#[derive(Debug, Clone, FromRow)]
pub struct DynamicFieldValueRow {
    pub id: DbId,
    pub field_id: DbId,
    pub object_id: DbId,
    pub value_text: Option<String>,
    pub value_date: Option<Timestamp>,
    pub value_int: Option<i64>,
}

impl DynamicFieldValueRow {
    /// The typed value, or `None` for a row with every slot NULL.
    pub fn value(&self) -> Option<FieldValue> {
        match (&self.value_text, self.value_date, self.value_int) {
            (Some(text), _, _) => Some(FieldValue::Text(text.clone())),
            (None, Some(date), _) => Some(FieldValue::Date(date)),
            (None, None, Some(n)) => Some(FieldValue::Integer(n)),
            (None, None, None) => None,
        }
    }

    pub fn into_stored(self) -> Option<StoredValue> {
        let value = self.value()?;
        Some(StoredValue {
            id: self.id,
            field_id: self.field_id,
            object_id: self.object_id,
            value,
        })
    }
}

/// Physical slots for a value insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSlots<'a> {
    pub text: Option<&'a str>,
    pub date: Option<Timestamp>,
    pub int: Option<i64>,
}

impl<'a> From<&'a FieldValue> for ValueSlots<'a> {
    fn from(value: &'a FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Self {
                text: Some(s),
                ..Default::default()
            },
            FieldValue::Date(d) => Self {
                date: Some(*d),
                ..Default::default()
            },
            FieldValue::Integer(n) => Self {
                int: Some(*n),
                ..Default::default()
            },
        }
    }
}

/// A row from `dynamic_field_screen_config`.
#[derive(Debug, Clone, FromRow)]
pub struct ScreenConfigRow {
    pub id: DbId,
    pub field_id: DbId,
    pub screen_key: String,
    pub config_value: i16,
    pub created_at: Timestamp,
    pub created_by: DbId,
    pub updated_at: Timestamp,
    pub updated_by: DbId,
}

impl TryFrom<ScreenConfigRow> for ScreenConfig {
    type Error = CoreError;

    fn try_from(row: ScreenConfigRow) -> Result<Self, Self::Error> {
        Ok(ScreenConfig {
            field_id: row.field_id,
            screen_key: row.screen_key,
            level: ScreenLevel::from_i16(row.config_value)?,
        })
    }
}

/// A field joined with its level on one screen.
#[derive(Debug, Clone, FromRow)]
pub struct FieldOnScreenRow {
    #[sqlx(flatten)]
    pub field: DynamicFieldRow,
    pub config_value: i16,
}
