//! Database row types.

pub mod dynamic_field;
