//! Dynamic field definitions and the validation contract applied before any
//! create or update reaches storage.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field_config::FieldConfig;
use crate::field_types::{FieldType, ObjectType};
use crate::types::{DbId, Timestamp};

/// Field names are restricted to ASCII letters and digits.
static NAME_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9]+$").expect("valid regex"));

/// Order key applied when a caller supplies none (or a non-positive one).
pub const DEFAULT_FIELD_ORDER: i32 = 1;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A stored dynamic field definition with its decoded config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicField {
    pub id: DbId,
    /// System-owned fields cannot be deleted.
    pub internal: bool,
    pub name: String,
    pub label: String,
    pub field_order: i32,
    pub field_type: FieldType,
    pub object_type: ObjectType,
    pub config: FieldConfig,
    pub is_valid: bool,
    pub created_at: Timestamp,
    pub created_by: DbId,
    pub updated_at: Timestamp,
    pub updated_by: DbId,
}

impl DynamicField {
    /// Resolve a stored key to its display label, falling back to the key.
    pub fn label_for_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.config
            .possible_values()
            .and_then(|values| values.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }
}

// ---------------------------------------------------------------------------
// Draft (create / update input)
// ---------------------------------------------------------------------------

/// Input for creating or fully replacing a dynamic field.
///
/// Updates replace every attribute; the `internal` flag is only honoured on
/// create.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDraft {
    pub name: String,
    pub label: String,
    pub field_order: i32,
    pub field_type: FieldType,
    pub object_type: ObjectType,
    pub is_valid: bool,
    pub internal: bool,
    pub config: FieldConfig,
}

impl FieldDraft {
    /// Start a draft with the empty config for `field_type`.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        object_type: ObjectType,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_order: DEFAULT_FIELD_ORDER,
            field_type,
            object_type,
            is_valid: true,
            internal: false,
            config: FieldConfig::empty(field_type),
        }
    }

    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the config with the type's auto-config defaults, keeping any
    /// default value already set. A no-op for types without auto-config.
    pub fn apply_auto_config(&mut self) {
        if let Some(mut auto) = FieldConfig::auto(self.field_type) {
            let default_value = self.config.default_value();
            if !default_value.is_empty() {
                auto.set_default_value(default_value.to_string());
            }
            self.config = auto;
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a field name: required, ASCII alphanumeric only.
pub fn validate_field_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation("name: name is required".to_string()));
    }
    if !NAME_RE.is_match(name) {
        return Err(CoreError::Validation(
            "name: name must contain only alphanumeric characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate the per-type config of a field.
pub fn validate_field_config(field_type: FieldType, config: &FieldConfig) -> Result<(), CoreError> {
    if config.field_type() != field_type {
        return Err(CoreError::Validation(format!(
            "config: {} config supplied for a {field_type} field",
            config.field_type()
        )));
    }
    if let Some(values) = config.possible_values() {
        if values.is_empty() {
            return Err(CoreError::Validation(format!(
                "config: {field_type} field requires at least one possible value"
            )));
        }
    }
    Ok(())
}

/// Full create/update validation contract for a draft.
pub fn validate_draft(draft: &FieldDraft) -> Result<(), CoreError> {
    validate_field_name(&draft.name)?;
    if draft.label.trim().is_empty() {
        return Err(CoreError::Validation("label: label is required".to_string()));
    }
    validate_field_config(draft.field_type, &draft.config)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;

    use super::*;
    use crate::field_config::{SelectionConfig, TextConfig};

    fn dropdown_draft(values: &[(&str, &str)]) -> FieldDraft {
        FieldDraft::new("Priority1", "Priority", FieldType::Dropdown, ObjectType::Ticket)
            .with_config(FieldConfig::Dropdown(SelectionConfig {
                possible_values: values
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
                ..Default::default()
            }))
    }

    #[test]
    fn dropdown_with_values_is_valid() {
        assert!(validate_draft(&dropdown_draft(&[("1", "Low"), ("2", "High")])).is_ok());
    }

    #[test]
    fn dropdown_without_values_is_rejected() {
        let err = validate_draft(&dropdown_draft(&[])).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("possible value"));
    }

    #[test]
    fn name_must_be_alphanumeric() {
        assert!(validate_field_name("CustomerTier2").is_ok());
        assert_matches!(
            validate_field_name("customer_tier"),
            Err(CoreError::Validation(msg)) if msg.starts_with("name")
        );
        assert_matches!(validate_field_name("Tier 2"), Err(CoreError::Validation(_)));
        assert_matches!(validate_field_name("Größe"), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_field_name(""),
            Err(CoreError::Validation(msg)) if msg.contains("required")
        );
    }

    #[test]
    fn label_is_required() {
        let draft = FieldDraft::new("Notes", "  ", FieldType::TextArea, ObjectType::Article);
        assert_matches!(
            validate_draft(&draft),
            Err(CoreError::Validation(msg)) if msg.starts_with("label")
        );
    }

    #[test]
    fn config_variant_must_match_type() {
        let draft = FieldDraft::new("Notes", "Notes", FieldType::TextArea, ObjectType::Ticket)
            .with_config(FieldConfig::Text(TextConfig::default()));
        assert_matches!(
            validate_draft(&draft),
            Err(CoreError::Validation(msg)) if msg.starts_with("config")
        );
    }

    #[test]
    fn auto_config_keeps_default_value() {
        let mut draft = FieldDraft::new("Flag", "Flag", FieldType::Checkbox, ObjectType::Ticket);
        draft.apply_auto_config();
        assert_eq!(draft.config.default_value(), "0");

        let mut draft = FieldDraft::new("Code", "Code", FieldType::Text, ObjectType::Ticket);
        draft.config.set_default_value("ABC".to_string());
        draft.apply_auto_config();
        assert_eq!(draft.config.default_value(), "ABC");
        assert_matches!(&draft.config, FieldConfig::Text(TextConfig { max_length: 200, .. }));
    }

    #[test]
    fn auto_config_leaves_selection_types_alone() {
        let mut draft = dropdown_draft(&[("a", "A")]);
        let before = draft.config.clone();
        draft.apply_auto_config();
        assert_eq!(draft.config, before);
    }
}
