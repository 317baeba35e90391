//! Per-field-type value conversion into frontmatter properties.
//!
//! [`convert_field_value`] dispatches on the schema's [`FieldType`] and
//! never fails: a value that can't be represented is signaled by
//! returning `None` (omit the property), not by an error. Formula-backed
//! fields are strategy-dependent: under [`FormulaStrategy::Hybrid`] a
//! convertible formula is omitted from frontmatter because it stays live
//! in the table's view-definition file, and only unconvertible formulas
//! are frozen to their static value.

use std::collections::HashMap;

use serde_json::{Map, Value, json};
use tracing::warn;

use airtable_api::schema::{FieldSchema, FieldType};

use crate::formula::convert_airtable_formula;

/// How formula, rollup, count, and lookup fields are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormulaStrategy {
    /// Always freeze to the value the field had at import time.
    Static,
    /// Keep the column live when its formula converts; freeze otherwise.
    #[default]
    Hybrid,
}

/// Per-table conversion inputs shared across all of a table's records.
pub struct ConvertContext<'a> {
    pub strategy: FormulaStrategy,
    /// Field id → display name, spanning every table in the run so that
    /// rollup target fields in linked tables resolve too.
    pub field_names: &'a HashMap<String, String>,
}

fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn collaborator_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("email"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|n| json!(n)),
        _ => None,
    }
}

// best-effort static value for a formula/rollup/lookup field, typed by
// the schema's declared result type
fn static_result_value(value: Option<&Value>, result: Option<FieldType>) -> Option<Value> {
    use FieldType::{AutoNumber, Checkbox, Count, Currency, Duration, Number, Percent, Rating};
    let value = value?;
    match result {
        Some(Number | Currency | Percent | Duration | Rating | AutoNumber | Count) => {
            to_number(value)
        }
        Some(Checkbox) => Some(Value::Bool(value.as_bool().unwrap_or(false))),
        _ => match value {
            Value::Array(_) | Value::Number(_) | Value::Bool(_) => Some(value.clone()),
            Value::String(s) => Some(Value::String(s.clone())),
            // error markers and special values have no usable static form
            Value::Object(_) | Value::Null => None,
        },
    }
}

/// Converts one raw field value into its frontmatter representation.
/// `None` means the property is omitted. Never panics for any
/// `(value, schema)` pair.
pub fn convert_field_value(
    value: Option<&Value>,
    schema: &FieldSchema,
    cx: &ConvertContext,
) -> Option<Value> {
    use FieldType as F;
    let options = schema.options.as_ref();
    let result_type = options
        .and_then(|o| o.result.as_ref())
        .map(|r| r.result_type);

    match schema.field_type {
        F::SingleLineText
        | F::MultilineText
        | F::RichText
        | F::Email
        | F::Url
        | F::PhoneNumber
        | F::SingleSelect
        | F::Date
        | F::DateTime
        | F::CreatedTime
        | F::LastModifiedTime => value.map(|v| Value::String(display_string(v))),

        F::Barcode => value
            .and_then(|v| v.get("text"))
            .and_then(Value::as_str)
            .map(|s| Value::String(s.to_string())),

        F::Button => value
            .and_then(|v| v.get("url").or_else(|| v.get("label")))
            .and_then(Value::as_str)
            .map(|s| Value::String(s.to_string())),

        F::Number | F::Currency | F::Percent | F::Duration | F::Rating | F::AutoNumber => {
            value.and_then(to_number)
        }

        F::Checkbox => value.map(|v| Value::Bool(v.as_bool().unwrap_or(false))),

        F::SingleCollaborator | F::CreatedBy | F::LastModifiedBy => {
            value.and_then(collaborator_name).map(Value::String)
        }

        F::MultipleSelects => value.and_then(Value::as_array).map(|items| {
            Value::Array(
                items
                    .iter()
                    .map(|v| Value::String(display_string(v)))
                    .collect(),
            )
        }),

        F::MultipleCollaborators => value.and_then(Value::as_array).map(|items| {
            Value::Array(
                items
                    .iter()
                    .filter_map(collaborator_name)
                    .map(Value::String)
                    .collect(),
            )
        }),

        // raw linked-record ids; the writer resolves them to note links
        // once every record's path is known
        F::MultipleRecordLinks => value.cloned(),

        // passthrough descriptors for the attachment pipeline
        F::MultipleAttachments => value.cloned(),

        F::Formula => {
            let formula = options.and_then(|o| o.formula.as_deref());
            if cx.strategy == FormulaStrategy::Hybrid
                && formula.is_some_and(|f| convert_airtable_formula(f, cx.field_names).is_some())
            {
                // the converted expression lives in the view definition
                return None;
            }
            static_result_value(value, result_type)
        }

        F::Rollup | F::Count | F::MultipleLookupValues => {
            if cx.strategy == FormulaStrategy::Hybrid {
                let resolvable = options.is_some_and(|o| {
                    o.record_link_field_id
                        .as_deref()
                        .is_some_and(|id| cx.field_names.contains_key(id))
                        && o.field_id_in_linked_table
                            .as_deref()
                            .is_some_and(|id| cx.field_names.contains_key(id))
                });
                if resolvable {
                    return None;
                }
            }
            if schema.field_type == F::Count
                && let Some(Value::Array(items)) = value
            {
                return Some(json!(count_non_empty(items)));
            }
            static_result_value(value, result_type)
        }

        F::AiText => value.and_then(|v| {
            let generated = v.get("state").and_then(Value::as_str) == Some("generated");
            let text = v.get("value").and_then(Value::as_str).unwrap_or_default();
            (generated && !text.trim().is_empty()).then(|| Value::String(text.to_string()))
        }),

        F::ExternalSyncSource | F::Unknown => {
            warn!(field = %schema.name, field_type = %schema.field_type,
                "passing through value of unmapped field type");
            value.cloned()
        }
    }
}

/// Whether a single field value is semantically empty: null, a blank
/// string, an empty array, or an AI-text object not in `generated` state.
pub fn is_field_value_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => {
            if let Some(state) = map.get("state").and_then(Value::as_str) {
                state != "generated"
                    || map
                        .get("value")
                        .and_then(Value::as_str)
                        .is_none_or(|s| s.trim().is_empty())
            } else {
                false
            }
        }
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// A record is empty (skipped, not failed) when every present field
/// value is empty. Records with no fields at all count as empty.
pub fn is_record_empty(fields: &Map<String, Value>) -> bool {
    fields.values().all(is_field_value_empty)
}

/// COUNT semantics: numeric elements only.
pub fn count_numeric(values: &[Value]) -> usize {
    values.iter().filter(|v| v.is_number()).count()
}

/// COUNTA semantics: non-empty elements.
pub fn count_non_empty(values: &[Value]) -> usize {
    values.iter().filter(|v| !is_field_value_empty(v)).count()
}

/// COUNTALL semantics: every element, blanks included.
pub fn count_all(values: &[Value]) -> usize {
    values.len()
}
