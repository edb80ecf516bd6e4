//! Handlers for dynamic field values seen from the owning object.
//!
//! Display values for an object, form submission from a screen, and
//! filtering candidate object ids by `df_` query-style parameters.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Form, Json};
use dynafield_core::field_types::ObjectType;
use dynafield_core::field_value::{form_prefix, group_form_pairs};
use dynafield_core::filter::parse_filter_params;
use dynafield_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DisplayParams {
    /// Restrict to fields enabled on this screen.
    pub screen: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitParams {
    pub screen: String,
}

/// Body for `POST /objects/filter`.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    /// Object ids to narrow down, in the order results should keep.
    pub candidates: Vec<DbId>,
    /// Raw `df_<Name>[_<op>]` parameters; others are ignored.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// GET /api/v1/objects/{object_type}/{object_id}/dynamic-fields
pub async fn display_values(
    State(state): State<AppState>,
    Path((object_type, object_id)): Path<(String, DbId)>,
    Query(params): Query<DisplayParams>,
) -> AppResult<impl IntoResponse> {
    let object_type = ObjectType::parse(&object_type)?;
    let values = state
        .fields
        .display_values(object_id, object_type, params.screen.as_deref())
        .await?;
    Ok(Json(DataResponse { data: values }))
}

/// POST /api/v1/objects/{object_type}/{object_id}/dynamic-fields?screen=
///
/// Accepts the screen's urlencoded form. Keys use the object type's prefix
/// (`DynamicField_` or `ArticleDynamicField_`); repeated keys carry
/// multiselect values. Returns the ids of the fields written.
pub async fn submit_form(
    State(state): State<AppState>,
    Path((object_type, object_id)): Path<(String, DbId)>,
    Query(params): Query<SubmitParams>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let object_type = ObjectType::parse(&object_type)?;
    let form = group_form_pairs(pairs);
    let written = state
        .fields
        .apply_form_submission(
            object_id,
            object_type,
            &params.screen,
            &form,
            form_prefix(object_type),
        )
        .await?;
    Ok(Json(DataResponse { data: written }))
}

/// POST /api/v1/objects/filter
pub async fn filter_objects(
    State(state): State<AppState>,
    Json(body): Json<FilterRequest>,
) -> AppResult<impl IntoResponse> {
    let conditions = parse_filter_params(body.params);
    let matched = state
        .fields
        .filter_objects(&body.candidates, &conditions)
        .await?;
    Ok(Json(DataResponse { data: matched }))
}
