//! Dynamic field engine: typed custom attributes for tickets, articles and
//! customers, stored as entity-attribute-value rows.
//!
//! This crate holds the domain logic only. Persistence is reached through the
//! [`store::FieldStore`] port; `dynafield-db` provides the Postgres adapter.

pub mod dynamic_field;
pub mod error;
pub mod field_config;
pub mod field_types;
pub mod field_value;
pub mod filter;
pub mod screens;
pub mod search_cache;
pub mod service;
pub mod store;
pub mod transfer;
pub mod types;
