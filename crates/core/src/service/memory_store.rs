//! In-memory [`FieldStore`] for service tests. Evaluates the filter IR with
//! the same semantics the Postgres renderer produces.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

use super::FieldService;
use crate::dynamic_field::{DynamicField, FieldDraft};
use crate::error::CoreError;
use crate::field_types::{FieldType, ObjectType, ValueColumn};
use crate::field_value::{FieldValue, StoredValue};
use crate::filter::{CompareOp, CompiledFilter, FieldPredicate, FilterParam, ValuePredicate};
use crate::screens::{ScreenConfig, ScreenLevel};
use crate::store::FieldStore;
use crate::types::{DbId, Timestamp};

#[derive(Default)]
struct State {
    next_id: DbId,
    fields: Vec<DynamicField>,
    values: Vec<StoredValue>,
    screens: Vec<ScreenConfig>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
    fail_value_deletes: AtomicBool,
}

pub(crate) fn service() -> FieldService<MemoryStore> {
    FieldService::new(MemoryStore::default())
}

impl MemoryStore {
    /// Make subsequent value deletions fail with a storage error.
    pub(crate) fn fail_value_deletes(&self) {
        self.fail_value_deletes.store(true, AtomicOrdering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

/// Same ordering as the SQL `ORDER BY object_type, field_order, name`.
fn field_sort_key(f: &DynamicField) -> (&'static str, i32, String) {
    (f.object_type.as_str(), f.field_order, f.name.clone())
}

impl FieldStore for MemoryStore {
    const FILTER_FIRST_PARAM: usize = 1;

    async fn list_fields(
        &self,
        object_type: Option<ObjectType>,
        field_type: Option<FieldType>,
    ) -> Result<Vec<DynamicField>, CoreError> {
        let mut fields: Vec<_> = self
            .lock()
            .fields
            .iter()
            .filter(|f| object_type.map_or(true, |t| f.object_type == t))
            .filter(|f| field_type.map_or(true, |t| f.field_type == t))
            .cloned()
            .collect();
        fields.sort_by_key(field_sort_key);
        Ok(fields)
    }

    async fn find_field(&self, id: DbId) -> Result<Option<DynamicField>, CoreError> {
        Ok(self.lock().fields.iter().find(|f| f.id == id).cloned())
    }

    async fn find_field_by_name(&self, name: &str) -> Result<Option<DynamicField>, CoreError> {
        Ok(self.lock().fields.iter().find(|f| f.name == name).cloned())
    }

    async fn name_exists(&self, name: &str, exclude_id: Option<DbId>) -> Result<bool, CoreError> {
        Ok(self
            .lock()
            .fields
            .iter()
            .any(|f| f.name == name && Some(f.id) != exclude_id))
    }

    async fn insert_field(&self, draft: &FieldDraft, user_id: DbId) -> Result<DynamicField, CoreError> {
        let mut state = self.lock();
        let now = Utc::now();
        let field = DynamicField {
            id: state.next_id(),
            internal: draft.internal,
            name: draft.name.clone(),
            label: draft.label.clone(),
            field_order: draft.field_order,
            field_type: draft.field_type,
            object_type: draft.object_type,
            config: draft.config.clone(),
            is_valid: draft.is_valid,
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
        };
        state.fields.push(field.clone());
        Ok(field)
    }

    async fn update_field(
        &self,
        id: DbId,
        draft: &FieldDraft,
        user_id: DbId,
    ) -> Result<Option<DynamicField>, CoreError> {
        let mut state = self.lock();
        let Some(field) = state.fields.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        field.name = draft.name.clone();
        field.label = draft.label.clone();
        field.field_order = draft.field_order;
        field.field_type = draft.field_type;
        field.object_type = draft.object_type;
        field.config = draft.config.clone();
        field.is_valid = draft.is_valid;
        field.updated_at = Utc::now();
        field.updated_by = user_id;
        Ok(Some(field.clone()))
    }

    async fn delete_values_for_field(&self, field_id: DbId) -> Result<u64, CoreError> {
        if self.fail_value_deletes.load(AtomicOrdering::SeqCst) {
            return Err(CoreError::storage(
                "delete dynamic field values",
                std::io::Error::other("injected failure"),
            ));
        }
        let mut state = self.lock();
        let before = state.values.len();
        state.values.retain(|v| v.field_id != field_id);
        Ok((before - state.values.len()) as u64)
    }

    async fn delete_field(&self, id: DbId) -> Result<bool, CoreError> {
        let mut state = self.lock();
        let before = state.fields.len();
        state.fields.retain(|f| f.id != id);
        state.screens.retain(|s| s.field_id != id);
        Ok(state.fields.len() < before)
    }

    async fn list_values(&self, object_id: DbId) -> Result<Vec<StoredValue>, CoreError> {
        let mut values: Vec<_> = self
            .lock()
            .values
            .iter()
            .filter(|v| v.object_id == object_id)
            .cloned()
            .collect();
        values.sort_by_key(|v| v.field_id);
        Ok(values)
    }

    async fn replace_value(
        &self,
        field_id: DbId,
        object_id: DbId,
        value: Option<&FieldValue>,
    ) -> Result<Option<StoredValue>, CoreError> {
        let mut state = self.lock();
        state
            .values
            .retain(|v| !(v.field_id == field_id && v.object_id == object_id));
        let Some(value) = value else {
            return Ok(None);
        };
        let stored = StoredValue {
            id: state.next_id(),
            field_id,
            object_id,
            value: value.clone(),
        };
        state.values.push(stored.clone());
        Ok(Some(stored))
    }

    async fn distinct_text_values(&self, field_id: DbId, limit: i64) -> Result<Vec<String>, CoreError> {
        let distinct: BTreeSet<String> = self
            .lock()
            .values
            .iter()
            .filter(|v| v.field_id == field_id)
            .filter_map(|v| match &v.value {
                FieldValue::Text(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .collect();
        Ok(distinct
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn list_screen_configs(&self, field_ids: &[DbId]) -> Result<Vec<ScreenConfig>, CoreError> {
        Ok(self
            .lock()
            .screens
            .iter()
            .filter(|s| field_ids.contains(&s.field_id))
            .cloned()
            .collect())
    }

    async fn replace_screen_configs(
        &self,
        field_id: DbId,
        levels: &[(String, ScreenLevel)],
        _user_id: DbId,
    ) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.screens.retain(|s| s.field_id != field_id);
        state.screens.extend(
            levels
                .iter()
                .filter(|(_, level)| *level != ScreenLevel::Disabled)
                .map(|(key, level)| ScreenConfig {
                    field_id,
                    screen_key: key.clone(),
                    level: *level,
                }),
        );
        Ok(())
    }

    async fn set_screen_config(
        &self,
        field_id: DbId,
        screen_key: &str,
        level: ScreenLevel,
        _user_id: DbId,
    ) -> Result<(), CoreError> {
        let mut state = self.lock();
        state
            .screens
            .retain(|s| !(s.field_id == field_id && s.screen_key == screen_key));
        if level != ScreenLevel::Disabled {
            state.screens.push(ScreenConfig {
                field_id,
                screen_key: screen_key.to_string(),
                level,
            });
        }
        Ok(())
    }

    async fn fields_for_screen(
        &self,
        screen_key: &str,
        object_type: ObjectType,
    ) -> Result<Vec<(DynamicField, ScreenLevel)>, CoreError> {
        let state = self.lock();
        let mut fields: Vec<_> = state
            .screens
            .iter()
            .filter(|s| s.screen_key == screen_key && s.level != ScreenLevel::Disabled)
            .filter_map(|s| {
                state
                    .fields
                    .iter()
                    .find(|f| f.id == s.field_id && f.is_valid && f.object_type == object_type)
                    .map(|f| (f.clone(), s.level))
            })
            .collect();
        fields.sort_by(|(a, _), (b, _)| (a.field_order, &a.name).cmp(&(b.field_order, &b.name)));
        Ok(fields)
    }

    async fn filter_objects(
        &self,
        candidates: &[DbId],
        filter: &CompiledFilter,
    ) -> Result<Vec<DbId>, CoreError> {
        let state = self.lock();
        Ok(candidates
            .iter()
            .copied()
            .filter(|object_id| {
                filter
                    .predicates
                    .iter()
                    .all(|p| matches_predicate(&state, filter, p, *object_id))
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// IR evaluation
// ---------------------------------------------------------------------------

/// A single column cell, `None` standing for SQL NULL.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Int(i64),
    Date(Timestamp),
}

fn cell(value: &FieldValue, column: ValueColumn) -> Option<Cell> {
    match (column, value) {
        (ValueColumn::Text, FieldValue::Text(s)) => Some(Cell::Text(s.clone())),
        (ValueColumn::Int, FieldValue::Integer(n)) => Some(Cell::Int(*n)),
        (ValueColumn::Date, FieldValue::Date(d)) => Some(Cell::Date(*d)),
        _ => None,
    }
}

fn text_param<'a>(filter: &'a CompiledFilter, n: usize) -> &'a str {
    match filter.param(n) {
        Some(FilterParam::Text(s)) => s,
        other => panic!("parameter {n} is not text: {other:?}"),
    }
}

/// Cast a text parameter to the column's type.
fn cast(raw: &str, column: ValueColumn) -> Cell {
    match column {
        ValueColumn::Text => Cell::Text(raw.to_string()),
        ValueColumn::Int => Cell::Int(raw.trim().parse().expect("integer parameter")),
        ValueColumn::Date => Cell::Date(
            DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight").and_utc())
                })
                .expect("date parameter"),
        ),
    }
}

fn compare(a: &Cell, b: &Cell) -> Option<Ordering> {
    match (a, b) {
        (Cell::Text(a), Cell::Text(b)) => Some(a.cmp(b)),
        (Cell::Int(a), Cell::Int(b)) => Some(a.cmp(b)),
        (Cell::Date(a), Cell::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn like_contains(haystack: &str, pattern: &str) -> bool {
    let inner = pattern
        .strip_prefix('%')
        .and_then(|p| p.strip_suffix('%'))
        .unwrap_or(pattern);
    let mut needle = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                needle.push(escaped);
            }
        } else {
            needle.push(c);
        }
    }
    haystack.contains(&needle)
}

fn eval(filter: &CompiledFilter, column: ValueColumn, predicate: &ValuePredicate, value: Option<&Cell>) -> bool {
    match predicate {
        ValuePredicate::Compare { op, param } => {
            let Some(value) = value else { return false };
            let Some(ord) = compare(value, &cast(text_param(filter, *param), column)) else {
                return false;
            };
            match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Gte => ord != Ordering::Less,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Lte => ord != Ordering::Greater,
            }
        }
        ValuePredicate::NotEqualOrNull { param } => match value {
            None => true,
            Some(v) => *v != cast(text_param(filter, *param), column),
        },
        ValuePredicate::Like { param } => {
            let text = match value {
                Some(Cell::Text(s)) => s.clone(),
                Some(Cell::Int(n)) => n.to_string(),
                Some(Cell::Date(d)) => d.to_rfc3339(),
                None => return false,
            };
            like_contains(&text, text_param(filter, *param))
        }
        ValuePredicate::InList { params, negated } => {
            let Some(value) = value else { return false };
            let found = params
                .iter()
                .any(|p| *value == cast(text_param(filter, *p), column));
            found != *negated
        }
        ValuePredicate::IsTrue => value == Some(&Cell::Int(1)),
        ValuePredicate::IsFalseOrNull => matches!(value, None | Some(Cell::Int(0))),
        ValuePredicate::NotBlank => match value {
            Some(Cell::Text(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        },
    }
}

fn matches_predicate(state: &State, filter: &CompiledFilter, p: &FieldPredicate, object_id: DbId) -> bool {
    let Some(FilterParam::FieldId(field_id)) = filter.param(p.field_param) else {
        panic!("parameter {} is not a field id", p.field_param);
    };
    let any_row = state
        .values
        .iter()
        .filter(|v| v.field_id == *field_id && v.object_id == object_id)
        .any(|v| match &p.predicate {
            None => true,
            Some(pred) => eval(filter, p.column, pred, cell(&v.value, p.column).as_ref()),
        });
    any_row == p.exists
}
