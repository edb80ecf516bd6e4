//! Screen definitions and the field x screen visibility matrix.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::dynamic_field::DynamicField;
use crate::error::CoreError;
use crate::field_types::ObjectType;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Screen level
// ---------------------------------------------------------------------------

/// Visibility of a field on a screen. Stored as 0/1/2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ScreenLevel {
    #[default]
    Disabled,
    Enabled,
    Required,
}

impl ScreenLevel {
    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
            Self::Required => 2,
        }
    }

    pub fn from_i16(value: i16) -> Result<Self, CoreError> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Enabled),
            2 => Ok(Self::Required),
            other => Err(CoreError::Validation(format!(
                "level: invalid screen level {other}, expected 0, 1 or 2"
            ))),
        }
    }
}

impl TryFrom<i16> for ScreenLevel {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_i16(value)
    }
}

impl From<ScreenLevel> for i16 {
    fn from(level: ScreenLevel) -> Self {
        level.as_i16()
    }
}

// ---------------------------------------------------------------------------
// Static screen definitions
// ---------------------------------------------------------------------------

/// A UI screen that can show dynamic fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub object_type: ObjectType,
    pub supports_required: bool,
    /// Display-only screens show values but never collect input.
    pub is_display_only: bool,
}

const fn input(key: &'static str, name: &'static str, object_type: ObjectType) -> ScreenDefinition {
    ScreenDefinition {
        key,
        name,
        object_type,
        supports_required: true,
        is_display_only: false,
    }
}

const fn display(key: &'static str, name: &'static str, object_type: ObjectType) -> ScreenDefinition {
    ScreenDefinition {
        key,
        name,
        object_type,
        supports_required: false,
        is_display_only: true,
    }
}

/// Every screen known to the engine.
pub static SCREENS: &[ScreenDefinition] = &[
    input("AgentTicketPhone", "New Phone Ticket", ObjectType::Ticket),
    input("AgentTicketEmail", "New Email Ticket", ObjectType::Ticket),
    display("AgentTicketZoom", "Ticket Zoom", ObjectType::Ticket),
    input("AgentTicketClose", "Close Ticket", ObjectType::Ticket),
    input("AgentTicketNote", "Add Note", ObjectType::Ticket),
    input("AgentTicketMove", "Move Ticket", ObjectType::Ticket),
    input("AgentTicketOwner", "Change Owner", ObjectType::Ticket),
    input("AgentTicketPriority", "Change Priority", ObjectType::Ticket),
    input("CustomerTicketMessage", "Customer New Ticket", ObjectType::Ticket),
    display("CustomerTicketZoom", "Customer Ticket View", ObjectType::Ticket),
    display("AgentArticleZoom", "Article View", ObjectType::Article),
    input("AgentArticleNote", "Agent Note Article", ObjectType::Article),
    input("AgentArticleClose", "Close Note Article", ObjectType::Article),
    input("AgentArticleReply", "Agent Reply Article", ObjectType::Article),
    input("CustomerArticleReply", "Customer Reply Article", ObjectType::Article),
];

pub fn find_screen(key: &str) -> Option<&'static ScreenDefinition> {
    SCREENS.iter().find(|s| s.key == key)
}

/// Screens declared for an object type, in definition order.
pub fn screens_for(object_type: ObjectType) -> Vec<&'static ScreenDefinition> {
    SCREENS.iter().filter(|s| s.object_type == object_type).collect()
}

/// Check that `level` may be set for `field` on `screen_key`.
pub fn validate_screen_level(
    field: &DynamicField,
    screen_key: &str,
    level: ScreenLevel,
) -> Result<&'static ScreenDefinition, CoreError> {
    let screen = find_screen(screen_key)
        .ok_or_else(|| CoreError::Validation(format!("screen: unknown screen '{screen_key}'")))?;
    if screen.object_type != field.object_type {
        return Err(CoreError::Validation(format!(
            "screen: screen '{}' is for {} objects, field '{}' is a {} field",
            screen.key, screen.object_type, field.name, field.object_type
        )));
    }
    if level == ScreenLevel::Required {
        if screen.is_display_only {
            return Err(CoreError::Validation(format!(
                "level: screen '{}' is display-only and cannot require fields",
                screen.key
            )));
        }
        if !screen.supports_required {
            return Err(CoreError::Validation(format!(
                "level: screen '{}' does not support required fields",
                screen.key
            )));
        }
    }
    Ok(screen)
}

// ---------------------------------------------------------------------------
// Stored config and matrix
// ---------------------------------------------------------------------------

/// One stored (field, screen) -> level row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenConfig {
    pub field_id: DbId,
    pub screen_key: String,
    pub level: ScreenLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixRow {
    pub field: DynamicField,
    /// Level per screen key; every declared screen is present.
    pub levels: BTreeMap<&'static str, ScreenLevel>,
}

/// Full grid of fields x screens for one object type.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenMatrix {
    pub object_type: ObjectType,
    pub screens: Vec<&'static ScreenDefinition>,
    pub rows: Vec<MatrixRow>,
}

impl ScreenMatrix {
    pub fn level(&self, field_id: DbId, screen_key: &str) -> Option<ScreenLevel> {
        self.rows
            .iter()
            .find(|r| r.field.id == field_id)
            .and_then(|r| r.levels.get(screen_key).copied())
    }
}

/// Build the matrix for `object_type`. Fields of other object types and rows
/// for screens of other object types are ignored; missing cells are Disabled.
pub fn build_matrix(
    object_type: ObjectType,
    fields: Vec<DynamicField>,
    configs: &[ScreenConfig],
) -> ScreenMatrix {
    let screens = screens_for(object_type);
    let stored: HashMap<(DbId, &str), ScreenLevel> = configs
        .iter()
        .map(|c| ((c.field_id, c.screen_key.as_str()), c.level))
        .collect();

    let rows = fields
        .into_iter()
        .filter(|f| f.object_type == object_type)
        .map(|field| {
            let levels = screens
                .iter()
                .map(|s| {
                    let level = stored.get(&(field.id, s.key)).copied().unwrap_or_default();
                    (s.key, level)
                })
                .collect();
            MatrixRow { field, levels }
        })
        .collect();

    ScreenMatrix {
        object_type,
        screens,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;
    use crate::field_config::FieldConfig;
    use crate::field_types::FieldType;

    fn field(id: DbId, object_type: ObjectType) -> DynamicField {
        let now = Utc::now();
        DynamicField {
            id,
            internal: false,
            name: format!("Field{id}"),
            label: format!("Field {id}"),
            field_order: 1,
            field_type: FieldType::Text,
            object_type,
            config: FieldConfig::empty(FieldType::Text),
            is_valid: true,
            created_at: now,
            created_by: 1,
            updated_at: now,
            updated_by: 1,
        }
    }

    #[test]
    fn screen_keys_are_unique() {
        let mut keys: Vec<_> = SCREENS.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), SCREENS.len());
    }

    #[test]
    fn display_only_screens_never_support_required() {
        assert!(SCREENS
            .iter()
            .filter(|s| s.is_display_only)
            .all(|s| !s.supports_required));
        assert!(find_screen("CustomerTicketZoom").unwrap().is_display_only);
        assert!(find_screen("CustomerArticleReply").unwrap().supports_required);
    }

    #[test]
    fn level_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ScreenLevel::Required).unwrap(), "2");
        let level: ScreenLevel = serde_json::from_str("1").unwrap();
        assert_eq!(level, ScreenLevel::Enabled);
        assert!(serde_json::from_str::<ScreenLevel>("3").is_err());
    }

    #[test]
    fn required_on_display_only_screen_is_rejected() {
        let f = field(1, ObjectType::Ticket);
        assert_matches!(
            validate_screen_level(&f, "AgentTicketZoom", ScreenLevel::Required),
            Err(CoreError::Validation(msg)) if msg.contains("display-only")
        );
        assert!(validate_screen_level(&f, "AgentTicketZoom", ScreenLevel::Enabled).is_ok());
        assert!(validate_screen_level(&f, "AgentTicketPhone", ScreenLevel::Required).is_ok());
    }

    #[test]
    fn unknown_screen_and_object_mismatch_are_rejected() {
        let f = field(1, ObjectType::Ticket);
        assert_matches!(
            validate_screen_level(&f, "NoSuchScreen", ScreenLevel::Enabled),
            Err(CoreError::Validation(msg)) if msg.contains("unknown screen")
        );
        assert_matches!(
            validate_screen_level(&f, "AgentArticleNote", ScreenLevel::Enabled),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn matrix_defaults_missing_cells_to_disabled() {
        let fields = vec![field(1, ObjectType::Ticket), field(2, ObjectType::Article)];
        let configs = vec![
            ScreenConfig {
                field_id: 1,
                screen_key: "AgentTicketPhone".into(),
                level: ScreenLevel::Required,
            },
            ScreenConfig {
                field_id: 1,
                screen_key: "AgentArticleNote".into(),
                level: ScreenLevel::Enabled,
            },
        ];
        let matrix = build_matrix(ObjectType::Ticket, fields, &configs);

        assert_eq!(matrix.screens.len(), 10);
        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.level(1, "AgentTicketPhone"), Some(ScreenLevel::Required));
        assert_eq!(matrix.level(1, "AgentTicketClose"), Some(ScreenLevel::Disabled));
        assert_eq!(matrix.level(1, "AgentArticleNote"), None);
    }
}
