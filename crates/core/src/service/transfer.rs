use tracing::{info, warn};

use super::FieldService;
use crate::error::CoreError;
use crate::screens::validate_screen_level;
use crate::store::FieldStore;
use crate::transfer::{
    preview_entry, type_conflict, ExportBundle, ExportedField, ImportOutcome, ImportPreview,
    ImportResult, ImportSelection, ScreenImportResult,
};
use crate::types::DbId;

impl<S: FieldStore> FieldService<S> {
    /// Bundle the named fields (unknown names are ignored), optionally with
    /// their screen rows.
    pub async fn export_fields(
        &self,
        names: &[String],
        include_screens: bool,
    ) -> Result<ExportBundle, CoreError> {
        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            if let Some(field) = self.store.find_field_by_name(name).await? {
                fields.push(field);
            }
        }
        let configs = if include_screens {
            let ids: Vec<DbId> = fields.iter().map(|f| f.id).collect();
            self.store.list_screen_configs(&ids).await?
        } else {
            Vec::new()
        };
        Ok(ExportBundle::build(&fields, &configs, include_screens))
    }

    /// Classify every field of a bundle without writing anything.
    pub async fn preview_import(&self, bundle: &ExportBundle) -> Result<ImportPreview, CoreError> {
        let mut preview = ImportPreview::new(bundle.fields.len(), bundle.screen_keys());
        for incoming in &bundle.fields {
            let existing = self.store.find_field_by_name(&incoming.name).await?;
            preview.push(preview_entry(incoming, existing.as_ref()));
        }
        Ok(preview)
    }

    /// Apply the selected fields of a bundle, one at a time in document
    /// order. Per-field failures are recorded and do not stop the batch.
    pub async fn import_fields(
        &self,
        bundle: &ExportBundle,
        selection: &ImportSelection,
        user_id: DbId,
    ) -> Result<ImportResult, CoreError> {
        let mut result = ImportResult::default();
        let selected = bundle
            .fields
            .iter()
            .filter(|f| selection.fields.contains(&f.name));

        for incoming in selected {
            match self.import_one(incoming, selection.overwrite, user_id).await {
                Ok((outcome, field_id)) => {
                    result.record(&incoming.name, outcome, Some(field_id), None);
                    if matches!(outcome, ImportOutcome::Created | ImportOutcome::Updated)
                        && !selection.screens.is_empty()
                    {
                        let screens = self
                            .import_screens(bundle, incoming, field_id, &selection.screens, user_id)
                            .await;
                        result.screens.push(screens);
                    }
                }
                Err(e) => {
                    warn!(name = %incoming.name, error = %e, "Dynamic field import failed");
                    result.record(&incoming.name, ImportOutcome::Failed, None, Some(e.to_string()));
                }
            }
        }

        info!(
            created = result.names(ImportOutcome::Created).len(),
            updated = result.names(ImportOutcome::Updated).len(),
            skipped = result.names(ImportOutcome::Skipped).len(),
            failed = result.names(ImportOutcome::Failed).len(),
            user_id,
            "Dynamic field import finished"
        );
        Ok(result)
    }

    async fn import_one(
        &self,
        incoming: &ExportedField,
        overwrite: bool,
        user_id: DbId,
    ) -> Result<(ImportOutcome, DbId), CoreError> {
        match self.store.find_field_by_name(&incoming.name).await? {
            None => {
                let field = self.create_field(incoming.to_draft(), user_id).await?;
                Ok((ImportOutcome::Created, field.id))
            }
            Some(existing) if !overwrite => Ok((ImportOutcome::Skipped, existing.id)),
            Some(existing) => {
                if let Some(msg) = type_conflict(incoming, &existing) {
                    return Err(CoreError::Validation(msg));
                }
                let draft = incoming.overwrite_draft(&existing);
                let field = self.update_field(existing.id, draft, user_id).await?;
                Ok((ImportOutcome::Updated, field.id))
            }
        }
    }

    /// Set the bundle's levels for the selected screens of one field. All
    /// rows are validated before any is written.
    async fn import_screens(
        &self,
        bundle: &ExportBundle,
        incoming: &ExportedField,
        field_id: DbId,
        selected: &[String],
        user_id: DbId,
    ) -> ScreenImportResult {
        let rows: Vec<_> = bundle.screens_for(&incoming.name, selected).collect();
        let outcome = async {
            let field = self.require_field(field_id).await?;
            for row in &rows {
                validate_screen_level(&field, &row.screen, row.level)?;
            }
            for row in &rows {
                self.store
                    .set_screen_config(field_id, &row.screen, row.level, user_id)
                    .await?;
            }
            Ok::<_, CoreError>(rows.len())
        }
        .await;

        match outcome {
            Ok(applied) => ScreenImportResult {
                field: incoming.name.clone(),
                applied,
                error: None,
            },
            Err(e) => {
                warn!(name = %incoming.name, error = %e, "Dynamic field screen import failed");
                ScreenImportResult {
                    field: incoming.name.clone(),
                    applied: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
