//! Type-specific dynamic field configuration and its storage codec.
//!
//! Each [`FieldType`] owns exactly one [`FieldConfig`] variant. Configs are
//! persisted as YAML blobs with PascalCase keys and `0`/`1` integer flags so
//! that stored rows and export bundles stay readable and diffable.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CoreError;
use crate::field_types::FieldType;

// ---------------------------------------------------------------------------
// Auto-config defaults
// ---------------------------------------------------------------------------

/// Max length applied to auto-configured Text fields.
pub const AUTO_TEXT_MAX_LENGTH: u32 = 200;

/// Rows applied to auto-configured TextArea fields.
pub const AUTO_TEXTAREA_ROWS: u32 = 4;

/// Columns applied to auto-configured TextArea fields.
pub const AUTO_TEXTAREA_COLS: u32 = 60;

/// Year window (both directions) applied to auto-configured Date/DateTime fields.
pub const AUTO_DATE_YEARS: u32 = 5;

// ---------------------------------------------------------------------------
// Variant payloads
// ---------------------------------------------------------------------------

/// A validation pattern attached to a Text/TextArea field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RegexRule {
    pub value: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TextConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub max_length: u32,
    #[serde(rename = "RegExList", skip_serializing_if = "Vec::is_empty")]
    pub regex_list: Vec<RegexRule>,
    /// URL template rendered around the value, e.g. `https://crm/{value}`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link_preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TextAreaConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub max_length: u32,
    #[serde(rename = "RegExList", skip_serializing_if = "Vec::is_empty")]
    pub regex_list: Vec<RegexRule>,
    #[serde(skip_serializing_if = "is_zero")]
    pub rows: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub cols: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CheckboxConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_value: String,
}

/// Config shared by Dropdown and Multiselect fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SelectionConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    /// Stored key -> display label.
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "scalar_map"
    )]
    pub possible_values: BTreeMap<String, String>,
    #[serde(with = "flag", skip_serializing_if = "is_false")]
    pub possible_none: bool,
    #[serde(with = "flag", skip_serializing_if = "is_false")]
    pub translatable_values: bool,
    #[serde(with = "flag", skip_serializing_if = "is_false")]
    pub tree_view: bool,
}

/// Which dates a Date/DateTime picker refuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRestriction {
    #[default]
    None,
    DisablePastDates,
    DisableFutureDates,
}

impl DateRestriction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DisablePastDates => "DisablePastDates",
            Self::DisableFutureDates => "DisableFutureDates",
        }
    }

    fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl Serialize for DateRestriction {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DateRestriction {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let Scalar(raw) = Scalar::deserialize(d)?;
        match raw.as_str() {
            "" | "none" | "None" => Ok(Self::None),
            "DisablePastDates" => Ok(Self::DisablePastDates),
            "DisableFutureDates" => Ok(Self::DisableFutureDates),
            other => Err(de::Error::custom(format!(
                "unknown date restriction '{other}'"
            ))),
        }
    }
}

/// Config shared by Date and DateTime fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DateConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub years_in_past: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub years_in_future: u32,
    #[serde(with = "flag", skip_serializing_if = "is_false")]
    pub years_period: bool,
    #[serde(skip_serializing_if = "DateRestriction::is_none")]
    pub date_restriction: DateRestriction,
}

// ---------------------------------------------------------------------------
// Tagged config
// ---------------------------------------------------------------------------

/// Configuration of a dynamic field, one variant per [`FieldType`].
///
/// Serializes as the bare variant payload: the tag lives in the owning
/// field's `field_type`. Use [`FieldConfig::deserialize_for`] to read one back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Text(TextConfig),
    TextArea(TextAreaConfig),
    Checkbox(CheckboxConfig),
    Dropdown(SelectionConfig),
    Multiselect(SelectionConfig),
    Date(DateConfig),
    DateTime(DateConfig),
}

impl FieldConfig {
    /// The field type this variant belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::TextArea(_) => FieldType::TextArea,
            Self::Checkbox(_) => FieldType::Checkbox,
            Self::Dropdown(_) => FieldType::Dropdown,
            Self::Multiselect(_) => FieldType::Multiselect,
            Self::Date(_) => FieldType::Date,
            Self::DateTime(_) => FieldType::DateTime,
        }
    }

    /// Zero-valued config for a field type.
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => Self::Text(TextConfig::default()),
            FieldType::TextArea => Self::TextArea(TextAreaConfig::default()),
            FieldType::Checkbox => Self::Checkbox(CheckboxConfig::default()),
            FieldType::Dropdown => Self::Dropdown(SelectionConfig::default()),
            FieldType::Multiselect => Self::Multiselect(SelectionConfig::default()),
            FieldType::Date => Self::Date(DateConfig::default()),
            FieldType::DateTime => Self::DateTime(DateConfig::default()),
        }
    }

    /// Sensible defaults for types that can skip manual configuration.
    ///
    /// Returns `None` for Dropdown/Multiselect, which need explicit values.
    pub fn auto(field_type: FieldType) -> Option<Self> {
        let config = match field_type {
            FieldType::Text => Self::Text(TextConfig {
                max_length: AUTO_TEXT_MAX_LENGTH,
                ..Default::default()
            }),
            FieldType::TextArea => Self::TextArea(TextAreaConfig {
                rows: AUTO_TEXTAREA_ROWS,
                cols: AUTO_TEXTAREA_COLS,
                ..Default::default()
            }),
            FieldType::Checkbox => Self::Checkbox(CheckboxConfig {
                default_value: "0".to_string(),
            }),
            FieldType::Date => Self::Date(auto_date_config()),
            FieldType::DateTime => Self::DateTime(auto_date_config()),
            FieldType::Dropdown | FieldType::Multiselect => return None,
        };
        Some(config)
    }

    pub fn default_value(&self) -> &str {
        match self {
            Self::Text(c) => &c.default_value,
            Self::TextArea(c) => &c.default_value,
            Self::Checkbox(c) => &c.default_value,
            Self::Dropdown(c) | Self::Multiselect(c) => &c.default_value,
            Self::Date(c) | Self::DateTime(c) => &c.default_value,
        }
    }

    pub fn set_default_value(&mut self, value: String) {
        match self {
            Self::Text(c) => c.default_value = value,
            Self::TextArea(c) => c.default_value = value,
            Self::Checkbox(c) => c.default_value = value,
            Self::Dropdown(c) | Self::Multiselect(c) => c.default_value = value,
            Self::Date(c) | Self::DateTime(c) => c.default_value = value,
        }
    }

    /// Key -> label mapping for selection types, `None` otherwise.
    pub fn possible_values(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Dropdown(c) | Self::Multiselect(c) => Some(&c.possible_values),
            _ => None,
        }
    }

    /// Deserialize the payload of the variant selected by `field_type`.
    pub fn deserialize_for<'de, D>(field_type: FieldType, d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match field_type {
            FieldType::Text => Self::Text(TextConfig::deserialize(d)?),
            FieldType::TextArea => Self::TextArea(TextAreaConfig::deserialize(d)?),
            FieldType::Checkbox => Self::Checkbox(CheckboxConfig::deserialize(d)?),
            FieldType::Dropdown => Self::Dropdown(SelectionConfig::deserialize(d)?),
            FieldType::Multiselect => Self::Multiselect(SelectionConfig::deserialize(d)?),
            FieldType::Date => Self::Date(DateConfig::deserialize(d)?),
            FieldType::DateTime => Self::DateTime(DateConfig::deserialize(d)?),
        })
    }

    /// Read a config payload submitted as JSON (API input).
    ///
    /// `null` yields the empty config for the type.
    pub fn from_json(field_type: FieldType, value: serde_json::Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::empty(field_type));
        }
        Self::deserialize_for(field_type, value)
            .map_err(|e| CoreError::Validation(format!("config: {e}")))
    }

    /// Read a config payload from a YAML node (export bundles).
    pub fn from_yaml(field_type: FieldType, value: serde_yaml::Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::empty(field_type));
        }
        Self::deserialize_for(field_type, value)
            .map_err(|e| CoreError::Parse(format!("{field_type} config: {e}")))
    }
}

fn auto_date_config() -> DateConfig {
    DateConfig {
        years_in_past: AUTO_DATE_YEARS,
        years_in_future: AUTO_DATE_YEARS,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Serialize a config for the `dynamic_field.config` column.
///
/// `None` produces an empty blob.
pub fn encode_config(config: Option<&FieldConfig>) -> Result<Vec<u8>, CoreError> {
    match config {
        None => Ok(Vec::new()),
        Some(c) => serde_yaml::to_string(c)
            .map(String::into_bytes)
            .map_err(|e| CoreError::Internal(format!("failed to serialize field config: {e}"))),
    }
}

/// Parse a stored config blob for a field of `field_type`.
///
/// An empty (or blank / null) blob yields the zero-valued variant; anything
/// else that is not a well-formed config fails with [`CoreError::Parse`].
pub fn decode_config(field_type: FieldType, blob: &[u8]) -> Result<FieldConfig, CoreError> {
    let text = std::str::from_utf8(blob)
        .map_err(|e| CoreError::Parse(format!("field config is not valid UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Ok(FieldConfig::empty(field_type));
    }
    let node: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| CoreError::Parse(format!("failed to parse dynamic field config: {e}")))?;
    FieldConfig::from_yaml(field_type, node)
}

/// Parse admin-entered possible values: one option per line, either
/// `key=label` or a bare `key` (label = key). Blank lines are ignored.
pub fn parse_possible_values(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('=') {
            Some((key, label)) => (key.trim().to_string(), label.trim().to_string()),
            None => (line.to_string(), line.to_string()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

fn is_zero(n: &u32) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Any YAML/JSON scalar read back as its string form. Stored blobs written by
/// other tools use bare integers for keys and flags.
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number, or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar(String::new()))
            }

            fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar(String::new()))
            }
        }

        d.deserialize_any(ScalarVisitor)
    }
}

fn scalar_map<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<ScalarKey, Scalar>> = Option::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k.0, v.0))
        .collect())
}

/// Ordered wrapper so [`Scalar`] can key a map during deserialization.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ScalarKey(String);

impl<'de> Deserialize<'de> for ScalarKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Scalar::deserialize(d).map(|Scalar(s)| ScalarKey(s))
    }
}

/// `bool` stored as `0`/`1`, also accepting `true`/`false`.
mod flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Scalar;

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let Scalar(raw) = Scalar::deserialize(d)?;
        match raw.as_str() {
            "1" | "true" => Ok(true),
            "" | "0" | "false" => Ok(false),
            other => Err(de::Error::custom(format!("expected 0 or 1, got '{other}'"))),
        }
    }
}
