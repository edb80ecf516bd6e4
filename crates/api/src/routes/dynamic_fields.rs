//! Route definitions for dynamic field administration.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{dynamic_fields, screens, transfer};
use crate::state::AppState;

/// Dynamic field routes mounted at `/dynamic-fields`.
///
/// ```text
/// GET    /                                -> list_fields
/// POST   /                                -> create_field
/// GET    /grouped                         -> list_grouped
/// GET    /searchable                      -> searchable_fields
/// GET    /export                          -> export_fields
/// POST   /import/preview                  -> preview_import
/// POST   /import                          -> import_fields
/// GET    /screens/{object_type}           -> screen_matrix
/// GET    /{id}                            -> get_field
/// PUT    /{id}                            -> update_field
/// DELETE /{id}                            -> delete_field
/// GET    /{id}/distinct-values            -> distinct_values
/// PUT    /{id}/screens                    -> set_field_screens
/// PUT    /{id}/screens/{screen_key}       -> set_screen_level
/// PUT    /{id}/values/{object_id}         -> set_value
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(dynamic_fields::list_fields).post(dynamic_fields::create_field),
        )
        .route("/grouped", get(dynamic_fields::list_grouped))
        .route("/searchable", get(dynamic_fields::searchable_fields))
        .route("/export", get(transfer::export_fields))
        .route("/import/preview", post(transfer::preview_import))
        .route("/import", post(transfer::import_fields))
        .route("/screens/{object_type}", get(screens::screen_matrix))
        .route(
            "/{id}",
            get(dynamic_fields::get_field)
                .put(dynamic_fields::update_field)
                .delete(dynamic_fields::delete_field),
        )
        .route("/{id}/distinct-values", get(dynamic_fields::distinct_values))
        .route("/{id}/screens", put(screens::set_field_screens))
        .route("/{id}/screens/{screen_key}", put(screens::set_screen_level))
        .route("/{id}/values/{object_id}", put(dynamic_fields::set_value))
}
