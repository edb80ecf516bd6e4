//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dynamic_field_repo;
pub mod dynamic_field_value_repo;
pub mod screen_config_repo;

pub use dynamic_field_repo::DynamicFieldRepo;
pub use dynamic_field_value_repo::DynamicFieldValueRepo;
pub use screen_config_repo::ScreenConfigRepo;
