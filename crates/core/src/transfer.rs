//! Portable field + screen definition bundles (YAML) and import bookkeeping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dynamic_field::{DynamicField, FieldDraft, DEFAULT_FIELD_ORDER};
use crate::error::CoreError;
use crate::field_config::FieldConfig;
use crate::field_types::{FieldType, ObjectType};
use crate::screens::{ScreenConfig, ScreenLevel};
use crate::types::{DbId, Timestamp};

/// `strftime` pattern of the timestamp embedded in export file names.
const EXPORT_FILE_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";

// ---------------------------------------------------------------------------
// Bundle document
// ---------------------------------------------------------------------------

/// One field definition inside a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExportedField")]
pub struct ExportedField {
    pub name: String,
    pub label: String,
    pub field_order: i32,
    pub field_type: FieldType,
    pub object_type: ObjectType,
    pub is_valid: bool,
    pub config: FieldConfig,
}

/// Wire shape of [`ExportedField`]; the config can only be typed once the
/// field type is known.
#[derive(Deserialize)]
struct RawExportedField {
    name: String,
    label: String,
    #[serde(default = "default_field_order")]
    field_order: i32,
    field_type: FieldType,
    object_type: ObjectType,
    #[serde(default = "default_true")]
    is_valid: bool,
    #[serde(default)]
    config: serde_yaml::Value,
}

fn default_field_order() -> i32 {
    DEFAULT_FIELD_ORDER
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawExportedField> for ExportedField {
    type Error = CoreError;

    fn try_from(raw: RawExportedField) -> Result<Self, Self::Error> {
        let config = FieldConfig::from_yaml(raw.field_type, raw.config)?;
        Ok(Self {
            name: raw.name,
            label: raw.label,
            field_order: raw.field_order,
            field_type: raw.field_type,
            object_type: raw.object_type,
            is_valid: raw.is_valid,
            config,
        })
    }
}

impl ExportedField {
    pub fn from_field(field: &DynamicField) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            field_order: field.field_order,
            field_type: field.field_type,
            object_type: field.object_type,
            is_valid: field.is_valid,
            config: field.config.clone(),
        }
    }

    /// Draft for creating or overwriting a field. Imported fields are never
    /// internal.
    pub fn to_draft(&self) -> FieldDraft {
        FieldDraft {
            name: self.name.clone(),
            label: self.label.clone(),
            field_order: self.field_order,
            field_type: self.field_type,
            object_type: self.object_type,
            is_valid: self.is_valid,
            internal: false,
            config: self.config.clone(),
        }
    }

    /// Draft for overwriting `existing`: label, order, valid flag and config
    /// come from the bundle; name, object type, field type and the internal
    /// flag stay as stored.
    pub fn overwrite_draft(&self, existing: &DynamicField) -> FieldDraft {
        FieldDraft {
            name: existing.name.clone(),
            label: self.label.clone(),
            field_order: self.field_order,
            field_type: existing.field_type,
            object_type: existing.object_type,
            is_valid: self.is_valid,
            internal: existing.internal,
            config: self.config.clone(),
        }
    }
}

/// One screen matrix row inside a bundle, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedScreenConfig {
    pub field: String,
    pub screen: String,
    pub level: ScreenLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub fields: Vec<ExportedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<Vec<ExportedScreenConfig>>,
}

impl ExportBundle {
    /// Build a bundle from fields and their stored screen rows.
    ///
    /// Screen rows are only included when `include_screens` is set; rows of
    /// fields not in `fields` are dropped.
    pub fn build(fields: &[DynamicField], configs: &[ScreenConfig], include_screens: bool) -> Self {
        let screens = include_screens.then(|| {
            let names: HashMap<DbId, &str> =
                fields.iter().map(|f| (f.id, f.name.as_str())).collect();
            configs
                .iter()
                .filter(|c| c.level != ScreenLevel::Disabled)
                .filter_map(|c| {
                    names.get(&c.field_id).map(|name| ExportedScreenConfig {
                        field: (*name).to_string(),
                        screen: c.screen_key.clone(),
                        level: c.level,
                    })
                })
                .collect()
        });
        Self {
            fields: fields.iter().map(ExportedField::from_field).collect(),
            screens,
        }
    }

    pub fn to_yaml(&self) -> Result<String, CoreError> {
        serde_yaml::to_string(self)
            .map_err(|e| CoreError::Internal(format!("failed to serialize export bundle: {e}")))
    }

    pub fn from_yaml(text: &str) -> Result<Self, CoreError> {
        serde_yaml::from_str(text)
            .map_err(|e| CoreError::Parse(format!("invalid import document: {e}")))
    }

    /// Screen rows of one field, restricted to `selected` screen keys.
    pub fn screens_for<'a>(
        &'a self,
        field: &'a str,
        selected: &'a [String],
    ) -> impl Iterator<Item = &'a ExportedScreenConfig> + 'a {
        self.screens
            .iter()
            .flatten()
            .filter(move |s| s.field == field && selected.contains(&s.screen))
    }

    /// Distinct screen keys referenced by the bundle, in document order.
    pub fn screen_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for row in self.screens.iter().flatten() {
            if !keys.contains(&row.screen) {
                keys.push(row.screen.clone());
            }
        }
        keys
    }
}

pub fn export_file_name(at: Timestamp) -> String {
    format!("Export_DynamicFields_{}.yml", at.format(EXPORT_FILE_TIMESTAMP))
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// What an import would do with one field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportAction {
    Create,
    Update,
    Reject,
}

impl ImportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportPreviewEntry {
    pub name: String,
    pub field_type: FieldType,
    pub object_type: ObjectType,
    pub action: ImportAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Dry-run analysis of a bundle against the current registry.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub total_fields: usize,
    pub to_create: Vec<ImportPreviewEntry>,
    pub to_update: Vec<ImportPreviewEntry>,
    pub invalid: Vec<ImportPreviewEntry>,
    pub screens: Vec<String>,
}

impl ImportPreview {
    pub fn new(total_fields: usize, screens: Vec<String>) -> Self {
        Self {
            total_fields,
            to_create: Vec::new(),
            to_update: Vec::new(),
            invalid: Vec::new(),
            screens,
        }
    }

    pub fn push(&mut self, entry: ImportPreviewEntry) {
        match entry.action {
            ImportAction::Create => self.to_create.push(entry),
            ImportAction::Update => self.to_update.push(entry),
            ImportAction::Reject => self.invalid.push(entry),
        }
    }
}

/// Message for an incoming field whose type differs from the stored one.
pub fn type_conflict(incoming: &ExportedField, existing: &DynamicField) -> Option<String> {
    (incoming.field_type != existing.field_type).then(|| {
        format!(
            "field '{}' exists as {}, cannot import as {}",
            incoming.name, existing.field_type, incoming.field_type
        )
    })
}

/// Classify one incoming field against its existing namesake, if any.
pub fn preview_entry(incoming: &ExportedField, existing: Option<&DynamicField>) -> ImportPreviewEntry {
    let (action, message) = match existing {
        None => (ImportAction::Create, None),
        Some(current) => match type_conflict(incoming, current) {
            Some(msg) => (ImportAction::Reject, Some(msg)),
            None => (ImportAction::Update, None),
        },
    };
    ImportPreviewEntry {
        name: incoming.name.clone(),
        field_type: incoming.field_type,
        object_type: incoming.object_type,
        action,
        existing_id: existing.map(|f| f.id),
        message,
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Caller's choice of what to apply from a bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSelection {
    /// Field names to import.
    pub fields: Vec<String>,
    /// Screen keys whose rows should be applied.
    #[serde(default)]
    pub screens: Vec<String>,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Created,
    Updated,
    Skipped,
    Failed,
}

impl ImportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldImportResult {
    pub name: String,
    pub outcome: ImportOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenImportResult {
    pub field: String,
    pub applied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item report of an import commit, in document order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub fields: Vec<FieldImportResult>,
    pub screens: Vec<ScreenImportResult>,
}

impl ImportResult {
    pub fn record(
        &mut self,
        name: &str,
        outcome: ImportOutcome,
        field_id: Option<DbId>,
        message: Option<String>,
    ) {
        self.fields.push(FieldImportResult {
            name: name.to_string(),
            outcome,
            field_id,
            message,
        });
    }

    /// Names of the fields with the given outcome.
    pub fn names(&self, outcome: ImportOutcome) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|r| r.outcome == outcome)
            .map(|r| r.name.as_str())
            .collect()
    }
}
