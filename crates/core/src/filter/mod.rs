//! User-supplied dynamic field filters.
//!
//! Conditions come from query parameters ([`params`]), get their fields
//! resolved by the service, and are compiled into a storage-neutral predicate
//! IR ([`compiler`]) that the storage adapter renders into its query language.

pub mod compiler;
pub mod params;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

pub use compiler::{compile, CompareOp, CompiledFilter, FieldPredicate, FilterParam, ValuePredicate};
pub use params::{parse_filter_params, FILTER_PARAM_PREFIX};

/// How a condition refers to its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    Id(DbId),
    Name(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[default]
    Eq,
    Ne,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Empty,
    NotEmpty,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 11] = [
        Self::Eq,
        Self::Ne,
        Self::Contains,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Empty,
        Self::NotEmpty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Contains => "contains",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::Empty => "empty",
            Self::NotEmpty => "notempty",
        }
    }

    /// Lenient parse: anything unrecognised is treated as `eq`.
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .unwrap_or_default()
    }
}

/// A single `field <op> value` condition. Conditions are always ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: FieldRef,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl FilterCondition {
    pub fn by_name(name: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: FieldRef::Name(name.into()),
            operator,
            value: value.into(),
        }
    }

    pub fn by_id(id: DbId, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: FieldRef::Id(id),
            operator,
            value: value.into(),
        }
    }
}
