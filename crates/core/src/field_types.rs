//! Closed vocabularies for dynamic fields: field types, object types, and the
//! physical value column each field type stores into.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// The kind of input a dynamic field renders and the shape of its config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    TextArea,
    Checkbox,
    Dropdown,
    Multiselect,
    Date,
    DateTime,
}

impl FieldType {
    /// Every supported field type, in admin display order.
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::TextArea,
        FieldType::Checkbox,
        FieldType::Dropdown,
        FieldType::Multiselect,
        FieldType::Date,
        FieldType::DateTime,
    ];

    /// Stable string form, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::TextArea => "TextArea",
            Self::Checkbox => "Checkbox",
            Self::Dropdown => "Dropdown",
            Self::Multiselect => "Multiselect",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
        }
    }

    /// Parse a stored or submitted field type name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("field_type: invalid field type '{s}'")))
    }

    /// Dropdown and Multiselect carry an enumerated key -> label mapping.
    pub fn is_selection(&self) -> bool {
        matches!(self, Self::Dropdown | Self::Multiselect)
    }

    /// Whether the type can be configured with [`crate::field_config::FieldConfig::auto`].
    pub fn supports_auto_config(&self) -> bool {
        !self.is_selection()
    }

    /// The typed slot values of this field type are stored in.
    pub fn value_column(&self) -> ValueColumn {
        match self {
            Self::Checkbox => ValueColumn::Int,
            Self::Date | Self::DateTime => ValueColumn::Date,
            Self::Text | Self::TextArea | Self::Dropdown | Self::Multiselect => ValueColumn::Text,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Object type
// ---------------------------------------------------------------------------

/// The kind of domain object a dynamic field attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    Ticket,
    Article,
    CustomerUser,
    CustomerCompany,
}

impl ObjectType {
    pub const ALL: [ObjectType; 4] = [
        ObjectType::Ticket,
        ObjectType::Article,
        ObjectType::CustomerUser,
        ObjectType::CustomerCompany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "Ticket",
            Self::Article => "Article",
            Self::CustomerUser => "CustomerUser",
            Self::CustomerCompany => "CustomerCompany",
        }
    }

    /// Parse a stored or submitted object type name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!("object_type: invalid object type '{s}'"))
            })
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Value column
// ---------------------------------------------------------------------------

/// One of the three typed slots of a `dynamic_field_value` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueColumn {
    Text,
    Int,
    Date,
}

impl ValueColumn {
    /// Physical column name in `dynamic_field_value`.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Text => "value_text",
            Self::Int => "value_int",
            Self::Date => "value_date",
        }
    }
}
