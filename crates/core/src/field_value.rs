//! Typed dynamic field values, display formatting, and form submission
//! decoding.
//!
//! A value is exactly one of [`FieldValue::Text`], [`FieldValue::Integer`] or
//! [`FieldValue::Date`]. The three nullable physical columns only exist in the
//! storage adapter.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dynamic_field::DynamicField;
use crate::error::CoreError;
use crate::field_types::{FieldType, ObjectType, ValueColumn};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Separator between selected keys of a stored Multiselect value.
pub const MULTISELECT_DELIMITER: &str = "||";

/// Display placeholder for a field without a value.
pub const EMPTY_DISPLAY: &str = "-";

/// Checkbox submissions that count as checked.
pub const CHECKBOX_TRUTHY: &[&str] = &["1", "on", "true"];

/// Form key prefix for ticket screens.
pub const TICKET_FORM_PREFIX: &str = "DynamicField_";

/// Form key prefix for article screens.
pub const ARTICLE_FORM_PREFIX: &str = "ArticleDynamicField_";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Accepted DateTime submission formats, tried in order.
const DATETIME_INPUT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// A single typed dynamic field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Date(Timestamp),
}

impl FieldValue {
    /// The serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Date(_) => "date",
        }
    }
}

/// A value row as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredValue {
    pub id: DbId,
    pub field_id: DbId,
    pub object_id: DbId,
    pub value: FieldValue,
}

/// A field paired with its (possibly absent) value and display string.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDisplay {
    pub field: DynamicField,
    pub value: Option<FieldValue>,
    pub display_value: String,
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Render a stored value for humans according to the field's type.
///
/// A value held in a slot the type does not read (e.g. raw text kept for an
/// unparsable date) renders like an absent value.
pub fn display_value(field: &DynamicField, value: Option<&FieldValue>) -> String {
    let Some(value) = value else {
        return EMPTY_DISPLAY.to_string();
    };
    match (field.field_type, value) {
        (FieldType::Text | FieldType::TextArea, FieldValue::Text(s)) => s.clone(),
        (FieldType::Dropdown, FieldValue::Text(key)) => field.label_for_key(key).to_string(),
        (FieldType::Multiselect, FieldValue::Text(joined)) => joined
            .split(MULTISELECT_DELIMITER)
            .map(|key| field.label_for_key(key))
            .collect::<Vec<_>>()
            .join(", "),
        (FieldType::Checkbox, FieldValue::Integer(n)) => {
            if *n == 1 { "Yes" } else { "No" }.to_string()
        }
        (FieldType::Date, FieldValue::Date(d)) => d.format(DATE_FORMAT).to_string(),
        (FieldType::DateTime, FieldValue::Date(d)) => d.format(DATETIME_DISPLAY_FORMAT).to_string(),
        _ => EMPTY_DISPLAY.to_string(),
    }
}

/// Pair each field with its value from `values`, in field order.
pub fn build_display(fields: Vec<DynamicField>, values: &[StoredValue]) -> Vec<FieldDisplay> {
    let by_field: HashMap<DbId, &FieldValue> =
        values.iter().map(|v| (v.field_id, &v.value)).collect();
    fields
        .into_iter()
        .map(|field| {
            let value = by_field.get(&field.id).copied();
            let display_value = display_value(&field, value);
            FieldDisplay {
                value: value.cloned(),
                display_value,
                field,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Form submission
// ---------------------------------------------------------------------------

/// Posted form values; a key may repeat (multi-valued inputs).
pub type FormValues = HashMap<String, Vec<String>>;

/// Form key prefix used by screens of an object type.
pub fn form_prefix(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::Ticket => TICKET_FORM_PREFIX,
        ObjectType::Article => ARTICLE_FORM_PREFIX,
        ObjectType::CustomerUser => "CustomerUserDynamicField_",
        ObjectType::CustomerCompany => "CustomerCompanyDynamicField_",
    }
}

/// Group `(key, value)` pairs from a urlencoded body into [`FormValues`].
pub fn group_form_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> FormValues {
    let mut form = FormValues::new();
    for (key, value) in pairs {
        form.entry(key).or_default().push(value);
    }
    form
}

pub fn is_truthy(token: &str) -> bool {
    CHECKBOX_TRUTHY.contains(&token)
}

/// Submitted values for a field: `<prefix><name>`, else `<prefix><name>[]`.
fn submitted<'a>(form: &'a FormValues, prefix: &str, name: &str) -> Option<&'a [String]> {
    form.get(&format!("{prefix}{name}"))
        .or_else(|| form.get(&format!("{prefix}{name}[]")))
        .map(Vec::as_slice)
}

/// Decode submitted strings into the value a field of `field_type` stores.
///
/// Returns `None` when nothing usable was submitted (no values, or an empty
/// first value).
pub fn value_from_submission(field_type: FieldType, values: &[String]) -> Option<FieldValue> {
    let first = values.first().filter(|v| !v.is_empty())?;
    let value = match field_type {
        FieldType::Text | FieldType::TextArea | FieldType::Dropdown => {
            FieldValue::Text(first.clone())
        }
        FieldType::Multiselect => FieldValue::Text(values.join(MULTISELECT_DELIMITER)),
        FieldType::Checkbox => FieldValue::Integer(i64::from(is_truthy(first))),
        FieldType::Date => parse_date(first)
            .map(FieldValue::Date)
            .unwrap_or_else(|| FieldValue::Text(first.clone())),
        FieldType::DateTime => parse_datetime(first)
            .map(FieldValue::Date)
            .unwrap_or_else(|| FieldValue::Text(first.clone())),
    };
    Some(value)
}

/// Reject a value whose kind does not fit the field's value column. Date and
/// DateTime fields also accept text, which keeps unparsable submissions.
pub fn check_value_kind(field: &DynamicField, value: &FieldValue) -> Result<(), CoreError> {
    let fits = matches!(
        (field.field_type.value_column(), value),
        (ValueColumn::Text, FieldValue::Text(_))
            | (ValueColumn::Int, FieldValue::Integer(_))
            | (ValueColumn::Date, FieldValue::Date(_) | FieldValue::Text(_))
    );
    if fits {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "value: a {} field cannot hold {}",
            field.field_type,
            value.kind()
        )))
    }
}

/// Values to write for every field that was submitted. Fields absent from the
/// form are not included (and therefore left untouched).
pub fn collect_form_values(
    fields: &[DynamicField],
    form: &FormValues,
    prefix: &str,
) -> Vec<(DbId, FieldValue)> {
    fields
        .iter()
        .filter_map(|field| {
            let values = submitted(form, prefix, &field.name)?;
            value_from_submission(field.field_type, values).map(|v| (field.id, v))
        })
        .collect()
}

fn parse_date(raw: &str) -> Option<Timestamp> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_datetime(raw: &str) -> Option<Timestamp> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}
