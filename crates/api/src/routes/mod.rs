pub mod dynamic_fields;
pub mod health;
pub mod objects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /dynamic-fields/...    field registry, screens, import/export, values
/// /objects/...           per-object display, form submission, filtering
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dynamic-fields", dynamic_fields::router())
        .nest("/objects", objects::router())
}
