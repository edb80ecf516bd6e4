use axum::routing::{get, post};
use axum::Router;

use crate::handlers::objects;
use crate::state::AppState;

/// Object-side routes mounted at `/objects`.
///
/// ```text
/// POST /filter                                      -> filter_objects
/// GET  /{object_type}/{object_id}/dynamic-fields    -> display_values
/// POST /{object_type}/{object_id}/dynamic-fields    -> submit_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/filter", post(objects::filter_objects))
        .route(
            "/{object_type}/{object_id}/dynamic-fields",
            get(objects::display_values).post(objects::submit_form),
        )
}
