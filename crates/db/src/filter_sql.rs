//! Renders a [`CompiledFilter`] into Postgres SQL.
//!
//! Each predicate becomes an `EXISTS` / `NOT EXISTS` subquery over
//! `dynamic_field_value` correlated with the caller's object id column. All
//! value parameters are bound as text and cast in SQL to the type of the
//! value column they are compared against.

use dynafield_core::field_types::ValueColumn;
use dynafield_core::filter::{CompiledFilter, FieldPredicate, FilterParam, ValuePredicate};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;
use sqlx::Postgres;

/// A SQL expression for `filter` to place in a WHERE clause. An empty filter
/// renders as `TRUE`.
pub fn render_conditions(filter: &CompiledFilter, object_column: &str) -> String {
    if filter.is_empty() {
        return "TRUE".to_string();
    }
    filter
        .predicates
        .iter()
        .map(|p| render_predicate(p, object_column))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn render_predicate(p: &FieldPredicate, object_column: &str) -> String {
    let alias = &p.alias;
    let col = format!("{alias}.{}", p.column.column_name());
    let negation = if p.exists { "" } else { "NOT " };
    let constraint = match &p.predicate {
        None => String::new(),
        Some(predicate) => format!(" AND ({})", render_value_predicate(predicate, &col, p.column)),
    };
    format!(
        "{negation}EXISTS (SELECT 1 FROM dynamic_field_value {alias} \
         WHERE {alias}.object_id = {object_column} AND {alias}.field_id = ${}{constraint})",
        p.field_param
    )
}

/// A parameter placeholder cast to the column's type.
fn placeholder(param: usize, column: ValueColumn) -> String {
    match column {
        ValueColumn::Text => format!("${param}"),
        ValueColumn::Int => format!("CAST(${param} AS BIGINT)"),
        ValueColumn::Date => format!("CAST(${param} AS TIMESTAMPTZ)"),
    }
}

fn render_value_predicate(predicate: &ValuePredicate, col: &str, column: ValueColumn) -> String {
    match predicate {
        ValuePredicate::Compare { op, param } => {
            format!("{col} {} {}", op.as_sql(), placeholder(*param, column))
        }
        ValuePredicate::NotEqualOrNull { param } => {
            format!("{col} <> {} OR {col} IS NULL", placeholder(*param, column))
        }
        ValuePredicate::Like { param } => format!("CAST({col} AS TEXT) LIKE ${param}"),
        ValuePredicate::InList { params, negated } if params.is_empty() => {
            if *negated { "TRUE" } else { "FALSE" }.to_string()
        }
        ValuePredicate::InList { params, negated } => {
            let list = params
                .iter()
                .map(|p| placeholder(*p, column))
                .collect::<Vec<_>>()
                .join(", ");
            let not = if *negated { "NOT " } else { "" };
            format!("{col} {not}IN ({list})")
        }
        ValuePredicate::IsTrue => format!("{col} = 1"),
        ValuePredicate::IsFalseOrNull => format!("{col} = 0 OR {col} IS NULL"),
        ValuePredicate::NotBlank => match column {
            ValueColumn::Text => format!("{col} IS NOT NULL AND {col} <> ''"),
            ValueColumn::Int | ValueColumn::Date => format!("{col} IS NOT NULL"),
        },
    }
}

/// Bind the filter's parameters, in numbering order, after whatever the
/// query already binds.
pub fn bind_params<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    filter: &'q CompiledFilter,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for param in &filter.params {
        query = match param {
            FilterParam::FieldId(id) => query.bind(*id),
            FilterParam::Text(text) => query.bind(text.as_str()),
        };
    }
    query
}
