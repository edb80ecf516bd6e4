//! Handlers for dynamic field administration.
//!
//! Field CRUD, grouped and searchable listings, distinct values for filter
//! dropdowns, and direct value writes. Every handler only marshals and
//! delegates to [`dynafield_core::service::FieldService`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dynafield_core::dynamic_field::FieldDraft;
use dynafield_core::error::CoreError;
use dynafield_core::field_config::{parse_possible_values, FieldConfig};
use dynafield_core::field_types::{FieldType, ObjectType};
use dynafield_core::field_value::FieldValue;
use dynafield_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::actor::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body for `POST /dynamic-fields` and `PUT /dynamic-fields/{id}`.
///
/// Internal fields are seeded by the system, never created over HTTP.
#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    pub name: String,
    pub label: String,
    pub field_order: Option<i32>,
    pub field_type: String,
    pub object_type: String,
    pub is_valid: Option<bool>,
    /// Per-type config object; omitted means the empty config for the type.
    pub config: Option<serde_json::Value>,
    /// Possible values as admin-entered text, one `key=label` per line.
    /// Replaces the config's possible values for selection types.
    pub possible_values_text: Option<String>,
    /// Apply the type's auto-config defaults.
    #[serde(default)]
    pub auto_config: bool,
}

impl FieldRequest {
    fn into_draft(self) -> Result<FieldDraft, CoreError> {
        let field_type = FieldType::parse(&self.field_type)?;
        let object_type = ObjectType::parse(&self.object_type)?;
        let mut config = match self.config {
            Some(value) => FieldConfig::from_json(field_type, value)?,
            None => FieldConfig::empty(field_type),
        };
        if let Some(text) = &self.possible_values_text {
            if let FieldConfig::Dropdown(selection) | FieldConfig::Multiselect(selection) =
                &mut config
            {
                selection.possible_values = parse_possible_values(text);
            }
        }

        let mut draft =
            FieldDraft::new(self.name, self.label, field_type, object_type).with_config(config);
        if let Some(order) = self.field_order {
            draft.field_order = order;
        }
        if let Some(is_valid) = self.is_valid {
            draft.is_valid = is_valid;
        }
        if self.auto_config {
            draft.apply_auto_config();
        }
        Ok(draft)
    }
}

/// Query parameters for `GET /dynamic-fields`.
#[derive(Debug, Deserialize)]
pub struct ListFieldsParams {
    pub object_type: Option<String>,
    pub field_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DistinctValuesParams {
    pub limit: Option<i64>,
}

/// Body for `PUT /dynamic-fields/{id}/values/{object_id}`. A null value
/// clears the stored value.
#[derive(Debug, Deserialize)]
pub struct SetValueRequest {
    pub value: Option<FieldValue>,
}

// ---------------------------------------------------------------------------
// Field registry
// ---------------------------------------------------------------------------

/// GET /api/v1/dynamic-fields
pub async fn list_fields(
    State(state): State<AppState>,
    Query(params): Query<ListFieldsParams>,
) -> AppResult<impl IntoResponse> {
    let object_type = params.object_type.as_deref().map(ObjectType::parse).transpose()?;
    let field_type = params.field_type.as_deref().map(FieldType::parse).transpose()?;
    let fields = state.fields.list_fields(object_type, field_type).await?;
    Ok(Json(DataResponse { data: fields }))
}

/// GET /api/v1/dynamic-fields/grouped
///
/// Fields keyed by object type; every object type is present.
pub async fn list_grouped(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let grouped = state.fields.list_grouped().await?;
    Ok(Json(DataResponse { data: grouped }))
}

/// GET /api/v1/dynamic-fields/searchable
pub async fn searchable_fields(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.fields.searchable_fields().await?;
    Ok(Json(DataResponse {
        data: snapshot.to_vec(),
    }))
}

/// POST /api/v1/dynamic-fields
pub async fn create_field(
    State(state): State<AppState>,
    actor: ActingUser,
    Json(body): Json<FieldRequest>,
) -> AppResult<impl IntoResponse> {
    let draft = body.into_draft()?;
    let field = state.fields.create_field(draft, actor.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: field })))
}

/// GET /api/v1/dynamic-fields/{id}
pub async fn get_field(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let field = state.fields.get_field(id).await?;
    Ok(Json(DataResponse { data: field }))
}

/// PUT /api/v1/dynamic-fields/{id}
pub async fn update_field(
    State(state): State<AppState>,
    actor: ActingUser,
    Path(id): Path<DbId>,
    Json(body): Json<FieldRequest>,
) -> AppResult<impl IntoResponse> {
    let draft = body.into_draft()?;
    let field = state.fields.update_field(id, draft, actor.user_id).await?;
    Ok(Json(DataResponse { data: field }))
}

/// DELETE /api/v1/dynamic-fields/{id}
pub async fn delete_field(
    State(state): State<AppState>,
    actor: ActingUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.fields.delete_field(id, actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// GET /api/v1/dynamic-fields/{id}/distinct-values
pub async fn distinct_values(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<DistinctValuesParams>,
) -> AppResult<impl IntoResponse> {
    let values = state.fields.distinct_values(id, params.limit).await?;
    Ok(Json(DataResponse { data: values }))
}

/// PUT /api/v1/dynamic-fields/{id}/values/{object_id}
pub async fn set_value(
    State(state): State<AppState>,
    Path((id, object_id)): Path<(DbId, DbId)>,
    Json(body): Json<SetValueRequest>,
) -> AppResult<impl IntoResponse> {
    let stored = state.fields.set_value(id, object_id, body.value).await?;
    Ok(Json(DataResponse { data: stored }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn request(body: serde_json::Value) -> FieldRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn possible_values_text_fills_selection_config() {
        let draft = request(json!({
            "name": "Level",
            "label": "Level",
            "field_type": "Dropdown",
            "object_type": "Ticket",
            "possible_values_text": "high=High\nlow\n\n"
        }))
        .into_draft()
        .unwrap();

        let values = draft.config.possible_values().unwrap();
        assert_eq!(values.get("high").map(String::as_str), Some("High"));
        assert_eq!(values.get("low").map(String::as_str), Some("low"));
    }

    #[test]
    fn unknown_type_names_the_field() {
        let err = request(json!({
            "name": "X",
            "label": "X",
            "field_type": "Slider",
            "object_type": "Ticket"
        }))
        .into_draft()
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("field_type"));
    }

    #[test]
    fn auto_config_keeps_supplied_default() {
        let draft = request(json!({
            "name": "Flag",
            "label": "Flag",
            "field_type": "Checkbox",
            "object_type": "Ticket",
            "config": { "DefaultValue": "1" },
            "auto_config": true
        }))
        .into_draft()
        .unwrap();
        assert_eq!(draft.config.default_value(), "1");
    }
}
