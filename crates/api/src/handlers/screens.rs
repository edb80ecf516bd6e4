//! Handlers for the field-by-screen matrix.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dynafield_core::field_types::ObjectType;
use dynafield_core::screens::ScreenLevel;
use dynafield_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::actor::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `PUT /dynamic-fields/{id}/screens/{screen_key}`.
#[derive(Debug, Deserialize)]
pub struct SetLevelRequest {
    /// 0 = disabled, 1 = enabled, 2 = required.
    pub level: ScreenLevel,
}

/// GET /api/v1/dynamic-fields/screens/{object_type}
pub async fn screen_matrix(
    State(state): State<AppState>,
    Path(object_type): Path<String>,
) -> AppResult<impl IntoResponse> {
    let object_type = ObjectType::parse(&object_type)?;
    let matrix = state.fields.screen_matrix(object_type).await?;
    Ok(Json(DataResponse { data: matrix }))
}

/// PUT /api/v1/dynamic-fields/{id}/screens
///
/// Replace every screen level of a field. Screens left out become disabled.
pub async fn set_field_screens(
    State(state): State<AppState>,
    actor: ActingUser,
    Path(id): Path<DbId>,
    Json(levels): Json<BTreeMap<String, ScreenLevel>>,
) -> AppResult<StatusCode> {
    state
        .fields
        .set_field_screens(id, &levels, actor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/dynamic-fields/{id}/screens/{screen_key}
pub async fn set_screen_level(
    State(state): State<AppState>,
    actor: ActingUser,
    Path((id, screen_key)): Path<(DbId, String)>,
    Json(body): Json<SetLevelRequest>,
) -> AppResult<StatusCode> {
    state
        .fields
        .set_screen_level(id, &screen_key, body.level, actor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
