//! Filter validation
//!
//! Turns a loosely-shaped JSON object (usually produced by an LLM) into a
//! [`Filter`] restricted to the recognized fields. Unknown fields are dropped,
//! never rejected.

use super::{Field, FieldValue, Filter, Operand, Operator, Scalar, AND_KEY, OR_KEY};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Validate a raw JSON object into a filter
///
/// Objects that already carry `$and`/`$or` at the top level are trusted and
/// kept as-is, apart from rewriting same-field `$or` members into `$in`.
/// When that rewrite (or a malformed logical key) leaves no `$and`/`$or`
/// behind, the remainder is validated field by field.
pub fn validate(raw: &Map<String, Value>) -> Filter {
    if raw.is_empty() {
        return Filter::empty();
    }

    if raw.contains_key(AND_KEY) || raw.contains_key(OR_KEY) {
        let mut filter = Filter::from_map(raw);
        filter.collapse_or();
        if filter.all.is_empty() && filter.any.is_empty() {
            return validate_fields(&filter.to_map());
        }
        return filter;
    }

    validate_fields(raw)
}

fn validate_fields(raw: &Map<String, Value>) -> Filter {
    let mut filter = Filter::empty();

    if let Some(author) = raw.get(Field::Author.as_str()).and_then(validate_author) {
        filter.fields.insert(Field::Author, author);
    }

    if let Some(tags) = raw.get(Field::Tags.as_str()).and_then(validate_tags) {
        filter.fields.insert(Field::Tags, tags);
    }

    for field in Field::DATE_FIELDS {
        if let Some(value) = raw.get(field.as_str()) {
            filter.fields.insert(field, FieldValue::from_value(value));
        }
    }

    let dropped: Vec<&String> = raw
        .keys()
        .filter(|k| !Field::parse(k).is_recognized())
        .collect();
    if !dropped.is_empty() {
        tracing::debug!("Dropping unrecognized filter fields: {:?}", dropped);
    }

    filter
}

/// Operator objects are preserved, plain values become strings
fn validate_author(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Object(_) => Some(FieldValue::from_value(value)),
        Value::String(s) => Some(FieldValue::Scalar(Scalar::String(s.clone()))),
        other => Some(FieldValue::Scalar(Scalar::String(other.to_string()))),
    }
}

/// Bare lists become `$in`; strings and objects pass through
fn validate_tags(value: &Value) -> Option<FieldValue> {
    match value {
        Value::String(s) => Some(FieldValue::Scalar(Scalar::String(s.clone()))),
        Value::Object(_) => Some(FieldValue::from_value(value)),
        Value::Array(items) => {
            let scalars: Option<Vec<Scalar>> = items.iter().map(Scalar::from_value).collect();
            Some(match scalars {
                Some(list) => {
                    FieldValue::Operators(BTreeMap::from([(Operator::In, Operand::List(list))]))
                }
                None => {
                    let mut wrapped = Map::new();
                    wrapped.insert(Operator::In.key().to_string(), value.clone());
                    FieldValue::Raw(Value::Object(wrapped))
                }
            })
        }
        _ => None,
    }
}
