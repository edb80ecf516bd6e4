//! Query-string filter convention: `df_<FieldName>[_<operator>]=<value>`.

use std::collections::BTreeMap;

use super::{FilterCondition, FilterOperator};

/// Prefix marking a query parameter as a dynamic field filter.
pub const FILTER_PARAM_PREFIX: &str = "df_";

/// Operator suffixes, longest first so `_notin` wins over `_in` and
/// `_notempty` over `_empty`.
const OPERATOR_SUFFIXES: &[(&str, FilterOperator)] = &[
    ("_notempty", FilterOperator::NotEmpty),
    ("_contains", FilterOperator::Contains),
    ("_notin", FilterOperator::NotIn),
    ("_empty", FilterOperator::Empty),
    ("_gte", FilterOperator::Gte),
    ("_lte", FilterOperator::Lte),
    ("_gt", FilterOperator::Gt),
    ("_lt", FilterOperator::Lt),
    ("_ne", FilterOperator::Ne),
    ("_in", FilterOperator::In),
];

/// Split `<FieldName>[_<operator>]` into name and operator.
fn split_operator(rest: &str) -> (&str, FilterOperator) {
    OPERATOR_SUFFIXES
        .iter()
        .find_map(|(suffix, op)| rest.strip_suffix(suffix).map(|name| (name, *op)))
        .unwrap_or((rest, FilterOperator::Eq))
}

/// Extract filter conditions from query parameters.
///
/// Keys without the prefix, with no field name, or with an empty value are
/// ignored. Output is ordered by key; a repeated key keeps its first value.
pub fn parse_filter_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Vec<FilterCondition>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut by_key = BTreeMap::new();
    for (key, value) in params {
        let (key, value) = (key.as_ref(), value.as_ref());
        if value.is_empty() {
            continue;
        }
        let Some(rest) = key.strip_prefix(FILTER_PARAM_PREFIX) else {
            continue;
        };
        let (name, operator) = split_operator(rest);
        if name.is_empty() {
            continue;
        }
        by_key
            .entry(key.to_string())
            .or_insert_with(|| FilterCondition::by_name(name, operator, value));
    }
    by_key.into_values().collect()
}
