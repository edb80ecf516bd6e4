use std::collections::BTreeMap;

use tracing::info;

use super::FieldService;
use crate::dynamic_field::{validate_draft, DynamicField, FieldDraft};
use crate::error::CoreError;
use crate::field_types::{FieldType, ObjectType};
use crate::store::FieldStore;
use crate::types::DbId;

impl<S: FieldStore> FieldService<S> {
    pub async fn list_fields(
        &self,
        object_type: Option<ObjectType>,
        field_type: Option<FieldType>,
    ) -> Result<Vec<DynamicField>, CoreError> {
        self.store.list_fields(object_type, field_type).await
    }

    /// All fields keyed by object type; every object type has an entry.
    pub async fn list_grouped(&self) -> Result<BTreeMap<ObjectType, Vec<DynamicField>>, CoreError> {
        let mut grouped: BTreeMap<ObjectType, Vec<DynamicField>> =
            ObjectType::ALL.into_iter().map(|t| (t, Vec::new())).collect();
        for field in self.store.list_fields(None, None).await? {
            grouped.entry(field.object_type).or_default().push(field);
        }
        Ok(grouped)
    }

    pub async fn get_field(&self, id: DbId) -> Result<DynamicField, CoreError> {
        self.require_field(id).await
    }

    pub async fn get_field_by_name(&self, name: &str) -> Result<Option<DynamicField>, CoreError> {
        self.store.find_field_by_name(name).await
    }

    pub async fn name_exists(&self, name: &str, exclude_id: Option<DbId>) -> Result<bool, CoreError> {
        self.store.name_exists(name, exclude_id).await
    }

    pub async fn create_field(
        &self,
        draft: FieldDraft,
        user_id: DbId,
    ) -> Result<DynamicField, CoreError> {
        validate_draft(&draft)?;
        if self.store.name_exists(&draft.name, None).await? {
            return Err(CoreError::Conflict(format!(
                "A dynamic field named '{}' already exists",
                draft.name
            )));
        }

        let field = self.store.insert_field(&draft, user_id).await?;
        self.cache.invalidate().await;
        info!(
            field_id = field.id,
            name = %field.name,
            field_type = %field.field_type,
            user_id,
            "Dynamic field created"
        );
        Ok(field)
    }

    /// Replace a field's attributes. The stored `internal` flag is kept.
    pub async fn update_field(
        &self,
        id: DbId,
        mut draft: FieldDraft,
        user_id: DbId,
    ) -> Result<DynamicField, CoreError> {
        validate_draft(&draft)?;
        let existing = self.require_field(id).await?;
        if self.store.name_exists(&draft.name, Some(id)).await? {
            return Err(CoreError::Conflict(format!(
                "A dynamic field named '{}' already exists",
                draft.name
            )));
        }
        draft.internal = existing.internal;

        let field = self
            .store
            .update_field(id, &draft, user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "dynamic_field",
                id,
            })?;
        self.cache.invalidate().await;
        info!(field_id = id, name = %field.name, user_id, "Dynamic field updated");
        Ok(field)
    }

    /// Delete a non-internal field and all of its values.
    pub async fn delete_field(&self, id: DbId, user_id: DbId) -> Result<(), CoreError> {
        let field = self.require_field(id).await?;
        if field.internal {
            return Err(CoreError::Forbidden(format!(
                "Dynamic field '{}' is internal and cannot be deleted",
                field.name
            )));
        }

        let removed_values = self.store.delete_values_for_field(id).await?;
        if !self.store.delete_field(id).await? {
            return Err(CoreError::NotFound {
                entity: "dynamic_field",
                id,
            });
        }
        self.cache.invalidate().await;
        info!(field_id = id, name = %field.name, removed_values, user_id, "Dynamic field deleted");
        Ok(())
    }
}
