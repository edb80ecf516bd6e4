use std::collections::BTreeMap;

use tracing::info;

use super::FieldService;
use crate::dynamic_field::DynamicField;
use crate::error::CoreError;
use crate::field_types::ObjectType;
use crate::screens::{build_matrix, find_screen, validate_screen_level, ScreenLevel, ScreenMatrix};
use crate::store::FieldStore;
use crate::types::DbId;

impl<S: FieldStore> FieldService<S> {
    /// Fields of `object_type` against every screen declared for it.
    pub async fn screen_matrix(&self, object_type: ObjectType) -> Result<ScreenMatrix, CoreError> {
        let fields = self.store.list_fields(Some(object_type), None).await?;
        let ids: Vec<DbId> = fields.iter().map(|f| f.id).collect();
        let configs = self.store.list_screen_configs(&ids).await?;
        Ok(build_matrix(object_type, fields, &configs))
    }

    /// Replace a field's levels across screens in one pass. Screens missing
    /// from `levels` become Disabled.
    pub async fn set_field_screens(
        &self,
        field_id: DbId,
        levels: &BTreeMap<String, ScreenLevel>,
        user_id: DbId,
    ) -> Result<(), CoreError> {
        let field = self.require_field(field_id).await?;
        for (screen_key, level) in levels {
            validate_screen_level(&field, screen_key, *level)?;
        }
        let rows: Vec<(String, ScreenLevel)> = levels
            .iter()
            .filter(|(_, level)| **level != ScreenLevel::Disabled)
            .map(|(key, level)| (key.clone(), *level))
            .collect();

        self.store
            .replace_screen_configs(field_id, &rows, user_id)
            .await?;
        info!(field_id, screens = rows.len(), user_id, "Dynamic field screens replaced");
        Ok(())
    }

    /// Set a single (field, screen) level.
    pub async fn set_screen_level(
        &self,
        field_id: DbId,
        screen_key: &str,
        level: ScreenLevel,
        user_id: DbId,
    ) -> Result<(), CoreError> {
        let field = self.require_field(field_id).await?;
        validate_screen_level(&field, screen_key, level)?;
        self.store
            .set_screen_config(field_id, screen_key, level, user_id)
            .await?;
        info!(field_id, screen = screen_key, level = level.as_i16(), user_id, "Dynamic field screen level set");
        Ok(())
    }

    /// Valid fields enabled or required on a screen, with their level.
    pub async fn fields_for_screen(
        &self,
        screen_key: &str,
        object_type: ObjectType,
    ) -> Result<Vec<(DynamicField, ScreenLevel)>, CoreError> {
        if find_screen(screen_key).is_none() {
            return Err(CoreError::Validation(format!(
                "screen: unknown screen '{screen_key}'"
            )));
        }
        self.store.fields_for_screen(screen_key, object_type).await
    }
}
