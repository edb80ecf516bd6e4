pub mod dynamic_fields;
pub mod objects;
pub mod screens;
pub mod transfer;
