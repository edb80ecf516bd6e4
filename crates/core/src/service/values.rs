use tracing::info;

use super::{FieldService, DISTINCT_VALUES_DEFAULT_LIMIT};
use crate::dynamic_field::DynamicField;
use crate::error::CoreError;
use crate::field_types::ObjectType;
use crate::field_value::{
    build_display, check_value_kind, collect_form_values, FieldDisplay, FieldValue, FormValues,
    StoredValue,
};
use crate::store::FieldStore;
use crate::types::DbId;

impl<S: FieldStore> FieldService<S> {
    pub async fn values_for_object(&self, object_id: DbId) -> Result<Vec<StoredValue>, CoreError> {
        self.store.list_values(object_id).await
    }

    /// Overwrite the value of a field on an object; `None` clears it.
    pub async fn set_value(
        &self,
        field_id: DbId,
        object_id: DbId,
        value: Option<FieldValue>,
    ) -> Result<Option<StoredValue>, CoreError> {
        let field = self.require_field(field_id).await?;
        if let Some(value) = &value {
            check_value_kind(&field, value)?;
        }
        self.store
            .replace_value(field_id, object_id, value.as_ref())
            .await
    }

    /// Fields shown for an object with their values rendered for display.
    ///
    /// With a screen, only fields enabled on it are returned; otherwise all
    /// valid fields of the object type.
    pub async fn display_values(
        &self,
        object_id: DbId,
        object_type: ObjectType,
        screen_key: Option<&str>,
    ) -> Result<Vec<FieldDisplay>, CoreError> {
        let fields: Vec<DynamicField> = match screen_key {
            Some(key) => self
                .fields_for_screen(key, object_type)
                .await?
                .into_iter()
                .map(|(field, _)| field)
                .collect(),
            None => self
                .store
                .list_fields(Some(object_type), None)
                .await?
                .into_iter()
                .filter(|f| f.is_valid)
                .collect(),
        };
        let values = self.store.list_values(object_id).await?;
        Ok(build_display(fields, &values))
    }

    /// Write submitted form values for the fields enabled on a screen.
    ///
    /// Returns the ids of the fields that were written. Fields without a
    /// submitted value keep their current value.
    pub async fn apply_form_submission(
        &self,
        object_id: DbId,
        object_type: ObjectType,
        screen_key: &str,
        form: &FormValues,
        prefix: &str,
    ) -> Result<Vec<DbId>, CoreError> {
        let fields: Vec<DynamicField> = self
            .fields_for_screen(screen_key, object_type)
            .await?
            .into_iter()
            .map(|(field, _)| field)
            .collect();

        let mut written = Vec::new();
        for (field_id, value) in collect_form_values(&fields, form, prefix) {
            self.store
                .replace_value(field_id, object_id, Some(&value))
                .await?;
            written.push(field_id);
        }
        info!(object_id, screen = screen_key, fields = written.len(), "Dynamic field form applied");
        Ok(written)
    }

    /// Distinct non-empty text values of a field for filter dropdowns.
    pub async fn distinct_values(
        &self,
        field_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<String>, CoreError> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DISTINCT_VALUES_DEFAULT_LIMIT);
        self.store.distinct_text_values(field_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use crate::dynamic_field::FieldDraft;
    use crate::error::CoreError;
    use crate::field_types::{FieldType, ObjectType};
    use crate::field_value::{group_form_pairs, FieldValue, TICKET_FORM_PREFIX};
    use crate::screens::ScreenLevel;
    use crate::service::memory_store::service;

    #[tokio::test]
    async fn clearing_a_value_removes_the_row() {
        let svc = service();
        let f = svc
            .create_field(FieldDraft::new("Notes", "Notes", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();

        svc.set_value(f.id, 5, Some(FieldValue::Text("a".into()))).await.unwrap();
        svc.set_value(f.id, 5, Some(FieldValue::Text("b".into()))).await.unwrap();
        let values = svc.values_for_object(5).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, FieldValue::Text("b".into()));

        let cleared = svc.set_value(f.id, 5, None).await.unwrap();
        assert!(cleared.is_none());
        assert!(svc.values_for_object(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_value_rejects_kind_that_does_not_fit_field() {
        let svc = service();
        let notes = svc
            .create_field(FieldDraft::new("Notes", "Notes", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();
        let due = svc
            .create_field(FieldDraft::new("Due", "Due", FieldType::Date, ObjectType::Ticket), 1)
            .await
            .unwrap();

        assert_matches!(
            svc.set_value(notes.id, 1, Some(FieldValue::Integer(5))).await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            svc.set_value(due.id, 1, Some(FieldValue::Integer(5))).await,
            Err(CoreError::Validation(_))
        );
        assert!(svc.values_for_object(1).await.unwrap().is_empty());

        svc.set_value(due.id, 1, Some(FieldValue::Text("soon".into()))).await.unwrap();
    }

    #[tokio::test]
    async fn set_value_for_unknown_field_is_not_found() {
        let svc = service();
        assert_matches!(
            svc.set_value(9, 5, Some(FieldValue::Integer(1))).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn form_submission_writes_only_screen_fields_that_were_posted() {
        let svc = service();
        let flag = svc
            .create_field(FieldDraft::new("Urgent", "Urgent", FieldType::Checkbox, ObjectType::Ticket), 1)
            .await
            .unwrap();
        let due = svc
            .create_field(FieldDraft::new("Due", "Due", FieldType::Date, ObjectType::Ticket), 1)
            .await
            .unwrap();
        let hidden = svc
            .create_field(FieldDraft::new("Hidden", "Hidden", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();
        for id in [flag.id, due.id] {
            svc.set_screen_level(id, "AgentTicketPhone", ScreenLevel::Enabled, 1)
                .await
                .unwrap();
        }
        svc.set_value(due.id, 3, Some(FieldValue::Text("keep".into()))).await.unwrap();

        let form = group_form_pairs([
            ("DynamicField_Urgent".to_string(), "on".to_string()),
            ("DynamicField_Hidden".to_string(), "nope".to_string()),
        ]);
        let written = svc
            .apply_form_submission(3, ObjectType::Ticket, "AgentTicketPhone", &form, TICKET_FORM_PREFIX)
            .await
            .unwrap();
        assert_eq!(written, vec![flag.id]);

        let values = svc.values_for_object(3).await.unwrap();
        let value_of = |id| values.iter().find(|v| v.field_id == id).map(|v| v.value.clone());
        assert_eq!(value_of(flag.id), Some(FieldValue::Integer(1)));
        assert_eq!(value_of(due.id), Some(FieldValue::Text("keep".into())));
        assert_eq!(value_of(hidden.id), None);
    }

    #[tokio::test]
    async fn display_values_by_screen_and_for_all_fields() {
        let svc = service();
        let due = svc
            .create_field(FieldDraft::new("Due", "Due", FieldType::Date, ObjectType::Ticket), 1)
            .await
            .unwrap();
        svc.create_field(FieldDraft::new("Other", "Other", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();
        svc.set_screen_level(due.id, "AgentTicketZoom", ScreenLevel::Enabled, 1)
            .await
            .unwrap();
        let date = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        svc.set_value(due.id, 8, Some(FieldValue::Date(date))).await.unwrap();

        let on_zoom = svc
            .display_values(8, ObjectType::Ticket, Some("AgentTicketZoom"))
            .await
            .unwrap();
        assert_eq!(on_zoom.len(), 1);
        assert_eq!(on_zoom[0].display_value, "2026-05-01");

        let all = svc.display_values(8, ObjectType::Ticket, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].display_value, "-");
    }

    #[tokio::test]
    async fn distinct_values_skip_empty_and_respect_limit() {
        let svc = service();
        let f = svc
            .create_field(FieldDraft::new("City", "City", FieldType::Text, ObjectType::Ticket), 1)
            .await
            .unwrap();
        for (object, city) in [(1, "Oslo"), (2, "Bern"), (3, "Oslo"), (4, "")] {
            svc.set_value(f.id, object, Some(FieldValue::Text(city.into()))).await.unwrap();
        }
        assert_eq!(svc.distinct_values(f.id, None).await.unwrap(), vec!["Bern", "Oslo"]);
        assert_eq!(svc.distinct_values(f.id, Some(1)).await.unwrap(), vec!["Bern"]);
    }
}
