//! Compiles resolved filter conditions into a predicate IR.
//!
//! Every condition becomes one [`FieldPredicate`]: an EXISTS (or NOT EXISTS)
//! test over the value rows of one field, under its own alias, optionally
//! constrained by a [`ValuePredicate`]. Parameters are numbered by a single
//! counter threaded through the whole pass, starting at the caller's offset,
//! so the result can be appended to an already parameterised query.

use serde::Serialize;

use super::{FilterCondition, FilterOperator};
use crate::dynamic_field::DynamicField;
use crate::field_types::{FieldType, ValueColumn};
use crate::field_value::is_truthy;
use crate::types::DbId;

/// A bind parameter, in numbering order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterParam {
    FieldId(DbId),
    /// Raw user input; the renderer casts it to the value column's type.
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Constraint on the value column of a matched row. `param` fields are
/// parameter numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValuePredicate {
    Compare { op: CompareOp, param: usize },
    /// `col <> $n OR col IS NULL`
    NotEqualOrNull { param: usize },
    /// Substring match; the parameter already carries the `%` wildcards.
    Like { param: usize },
    InList { params: Vec<usize>, negated: bool },
    /// Checkbox checked: `col = 1`.
    IsTrue,
    /// Checkbox unchecked: `col = 0 OR col IS NULL`.
    IsFalseOrNull,
    /// A populated value: not NULL and, for text, not empty.
    NotBlank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPredicate {
    /// Row alias, unique within one compiled filter.
    pub alias: String,
    /// Parameter number binding the field id.
    pub field_param: usize,
    pub column: ValueColumn,
    /// `false` renders as NOT EXISTS.
    pub exists: bool,
    pub predicate: Option<ValuePredicate>,
}

/// Output of [`compile`]: predicates to AND together plus their parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledFilter {
    pub predicates: Vec<FieldPredicate>,
    /// Parameters numbered `first_param..next_param`, in order.
    pub params: Vec<FilterParam>,
    pub first_param: usize,
    /// The next unused parameter number.
    pub next_param: usize,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The parameter bound to number `n`, if it belongs to this filter.
    pub fn param(&self, n: usize) -> Option<&FilterParam> {
        n.checked_sub(self.first_param).and_then(|i| self.params.get(i))
    }
}

/// Hands out parameter numbers and records their values.
struct ParamCounter {
    params: Vec<FilterParam>,
    next: usize,
}

impl ParamCounter {
    fn push(&mut self, param: FilterParam) -> usize {
        let n = self.next;
        self.params.push(param);
        self.next += 1;
        n
    }

    fn text(&mut self, value: impl Into<String>) -> usize {
        self.push(FilterParam::Text(value.into()))
    }
}

/// Compile conditions whose fields are already resolved.
///
/// `start_param` is the first parameter number to use (1 for a standalone
/// query).
pub fn compile<'a>(
    resolved: impl IntoIterator<Item = (&'a DynamicField, &'a FilterCondition)>,
    start_param: usize,
) -> CompiledFilter {
    let mut counter = ParamCounter {
        params: Vec::new(),
        next: start_param,
    };
    let predicates = resolved
        .into_iter()
        .enumerate()
        .map(|(index, (field, condition))| compile_one(index, field, condition, &mut counter))
        .collect();
    CompiledFilter {
        predicates,
        params: counter.params,
        first_param: start_param,
        next_param: counter.next,
    }
}

fn compile_one(
    index: usize,
    field: &DynamicField,
    condition: &FilterCondition,
    counter: &mut ParamCounter,
) -> FieldPredicate {
    let column = field.field_type.value_column();
    let field_param = counter.push(FilterParam::FieldId(field.id));
    let value = normalize_value(column, &condition.value);

    let (exists, predicate) = match condition.operator {
        FilterOperator::Eq if field.field_type == FieldType::Checkbox => {
            let predicate = if is_truthy(&condition.value) {
                ValuePredicate::IsTrue
            } else {
                ValuePredicate::IsFalseOrNull
            };
            (true, predicate)
        }
        FilterOperator::Eq => (true, compare(CompareOp::Eq, value, counter)),
        FilterOperator::Gt => (true, compare(CompareOp::Gt, value, counter)),
        FilterOperator::Gte => (true, compare(CompareOp::Gte, value, counter)),
        FilterOperator::Lt => (true, compare(CompareOp::Lt, value, counter)),
        FilterOperator::Lte => (true, compare(CompareOp::Lte, value, counter)),
        FilterOperator::Ne => (
            true,
            ValuePredicate::NotEqualOrNull {
                param: counter.text(value),
            },
        ),
        FilterOperator::Contains => (
            true,
            ValuePredicate::Like {
                param: counter.text(format!("%{}%", escape_like(&condition.value))),
            },
        ),
        FilterOperator::In | FilterOperator::NotIn => {
            let params = split_list(&condition.value)
                .map(|item| counter.text(normalize_value(column, item)))
                .collect();
            let negated = condition.operator == FilterOperator::NotIn;
            (true, ValuePredicate::InList { params, negated })
        }
        FilterOperator::Empty => (false, ValuePredicate::NotBlank),
        FilterOperator::NotEmpty => (true, ValuePredicate::NotBlank),
    };

    FieldPredicate {
        alias: format!("dfv{index}"),
        field_param,
        column,
        exists,
        predicate: Some(predicate),
    }
}

fn compare(op: CompareOp, value: String, counter: &mut ParamCounter) -> ValuePredicate {
    ValuePredicate::Compare {
        op,
        param: counter.text(value),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Integer columns only hold checkbox states: non-numeric input is read as a
/// checkbox token so the bound value always casts.
fn normalize_value(column: ValueColumn, value: &str) -> String {
    match column {
        ValueColumn::Int if value.trim().parse::<i64>().is_err() => {
            i64::from(is_truthy(value)).to_string()
        }
        ValueColumn::Int => value.trim().to_string(),
        ValueColumn::Text | ValueColumn::Date => value.to_string(),
    }
}

/// Escape LIKE wildcards (backslash is the default escape character).
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
