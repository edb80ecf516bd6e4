//! Handlers for YAML export and import of field definitions.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use dynafield_core::transfer::{export_file_name, ExportBundle, ImportSelection};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::actor::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

const YAML_CONTENT_TYPE: &str = "application/x-yaml";

/// Query parameters for `GET /dynamic-fields/export`.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// Comma-separated field names.
    #[serde(default)]
    pub names: String,
    #[serde(default)]
    pub include_screens: bool,
}

/// Body for `POST /dynamic-fields/import`.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// The exported YAML document.
    pub bundle: String,
    #[serde(flatten)]
    pub selection: ImportSelection,
}

/// GET /api/v1/dynamic-fields/export
///
/// Returns the bundle as a YAML attachment.
pub async fn export_fields(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let names: Vec<String> = params
        .names
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Err(AppError::BadRequest("names: at least one field name is required".into()));
    }
    let bundle = state
        .fields
        .export_fields(&names, params.include_screens)
        .await?;
    let yaml = bundle.to_yaml()?;

    tracing::info!(fields = bundle.fields.len(), include_screens = params.include_screens, "Dynamic fields exported");

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(Utc::now()));
    Ok((
        [
            (header::CONTENT_TYPE, YAML_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        yaml,
    ))
}

/// POST /api/v1/dynamic-fields/import/preview
///
/// The request body is the YAML document. Nothing is written.
pub async fn preview_import(
    State(state): State<AppState>,
    body: String,
) -> AppResult<impl IntoResponse> {
    let bundle = ExportBundle::from_yaml(&body)?;
    let preview = state.fields.preview_import(&bundle).await?;
    Ok(Json(DataResponse { data: preview }))
}

/// POST /api/v1/dynamic-fields/import
pub async fn import_fields(
    State(state): State<AppState>,
    actor: ActingUser,
    Json(body): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    let bundle = ExportBundle::from_yaml(&body.bundle)?;
    let result = state
        .fields
        .import_fields(&bundle, &body.selection, actor.user_id)
        .await?;
    Ok(Json(DataResponse { data: result }))
}
