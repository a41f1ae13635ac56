//! Tag post-filtering
//!
//! The article index stores `tags` as the string rendering of a list, e.g.
//! `"['#RohitSharma', '#DRS']"`, which the index cannot filter natively.
//! Tag constraints are therefore stripped from the native filter and checked
//! here by substring containment. Swap this module out if the index ever
//! stores tags as a real array.

use crate::filter::{Field, FieldValue, Filter, Operand, Operator, Scalar, OR_KEY};
use serde_json::{Map, Value};

/// Remove tag constraints the index cannot evaluate
///
/// Tags at the top level and inside `$and` members are moved out; members
/// left empty are dropped. Tags under `$or` stay in the native filter.
pub fn split_tag_constraints(filter: &Filter) -> (Filter, Vec<FieldValue>) {
    let mut native = filter.clone();
    let mut tags = Vec::new();
    strip_tags(&mut native, &mut tags);
    (native, tags)
}

fn strip_tags(filter: &mut Filter, out: &mut Vec<FieldValue>) {
    if let Some(value) = filter.fields.remove(&Field::Tags) {
        out.push(value);
    }
    for member in filter.all.iter_mut() {
        strip_tags(member, out);
    }
    filter.all.retain(|member| !member.is_empty());
}

/// Flatten stored tag metadata into one searchable string
pub fn stored_tags(metadata: &Map<String, Value>) -> String {
    match metadata.get(Field::Tags.as_str()) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Whether a match's metadata satisfies every tag constraint
pub fn matches_all(constraints: &[FieldValue], metadata: &Map<String, Value>) -> bool {
    if constraints.is_empty() {
        return true;
    }
    let stored = stored_tags(metadata);
    constraints.iter().all(|c| tag_matches(c, &stored))
}

/// Evaluate one tag constraint against the stored tag string
pub fn tag_matches(constraint: &FieldValue, stored: &str) -> bool {
    match constraint {
        FieldValue::Scalar(tag) => contains(stored, tag),
        FieldValue::List(tags) => any_of(stored, tags),
        FieldValue::Operators(ops) => ops.iter().all(|(op, operand)| match (op, operand) {
            (Operator::Eq | Operator::In, Operand::Scalar(tag)) => contains(stored, tag),
            (Operator::Ne | Operator::Nin, Operand::Scalar(tag)) => !contains(stored, tag),
            (Operator::In, Operand::List(tags)) => any_of(stored, tags),
            (Operator::Nin, Operand::List(tags)) => !any_of(stored, tags),
            _ => false,
        }),
        FieldValue::Raw(value) => value
            .get(OR_KEY)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|tag| stored.contains(tag))
            })
            .unwrap_or(false),
    }
}

fn contains(stored: &str, tag: &Scalar) -> bool {
    stored.contains(&tag.to_string())
}

fn any_of(stored: &str, tags: &[Scalar]) -> bool {
    tags.iter().any(|tag| contains(stored, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STORED: &str = "['#RohitSharma', '#DRS', '#RRvsMI']";

    fn value(v: Value) -> FieldValue {
        FieldValue::from_value(&v)
    }

    #[test]
    fn test_plain_and_eq_are_substring() {
        assert!(tag_matches(&value(json!("#DRS")), STORED));
        assert!(tag_matches(&value(json!({"$eq": "#RohitSharma"})), STORED));
        assert!(!tag_matches(&value(json!("#ViratKohli")), STORED));
    }

    #[test]
    fn test_in_and_list_are_any_of() {
        assert!(tag_matches(&value(json!({"$in": ["#ViratKohli", "#DRS"]})), STORED));
        assert!(!tag_matches(&value(json!({"$in": ["#ViratKohli"]})), STORED));
        assert!(tag_matches(&value(json!(["#X", "#RRvsMI"])), STORED));
    }

    #[test]
    fn test_nin_and_ne() {
        assert!(tag_matches(&value(json!({"$nin": ["#ViratKohli"]})), STORED));
        assert!(!tag_matches(&value(json!({"$nin": ["#ViratKohli", "#DRS"]})), STORED));
        assert!(tag_matches(&value(json!({"$ne": "#IPL2025"})), STORED));
        assert!(!tag_matches(&value(json!({"$ne": "#DRS"})), STORED));
    }

    #[test]
    fn test_raw_or_and_unknown_shapes() {
        assert!(tag_matches(&value(json!({"$or": ["#Nope", "#DRS"]})), STORED));
        assert!(!tag_matches(&value(json!({"$regex": "DRS"})), STORED));
        assert!(!tag_matches(&value(json!({"$gt": "#A"})), STORED));
    }

    #[test]
    fn test_stored_tags_shapes() {
        let meta = |v: Value| json!({"tags": v}).as_object().cloned().unwrap();
        assert_eq!(stored_tags(&meta(json!(STORED))), STORED);
        assert_eq!(stored_tags(&meta(json!(["#A", "#B"]))), "#A, #B");
        assert_eq!(stored_tags(&Map::new()), "");
    }

    #[test]
    fn test_split_moves_top_level_and_conjunct_tags() {
        let filter: Filter = serde_json::from_value(json!({
            "author": "Jane Doe",
            "tags": "#IPL2025",
            "$and": [{"tags": "#RohitSharma"}, {"tags": "#ShubmanGill"}, {"published_year": 2025}]
        }))
        .unwrap();

        let (native, tags) = split_tag_constraints(&filter);
        assert_eq!(
            native.to_value(),
            json!({"author": "Jane Doe", "$and": [{"published_year": 2025}]})
        );
        assert_eq!(tags.len(), 3);

        let meta = json!({"tags": "['#IPL2025', '#RohitSharma', '#ShubmanGill']"});
        assert!(matches_all(&tags, meta.as_object().unwrap()));
        let meta = json!({"tags": "['#IPL2025', '#RohitSharma']"});
        assert!(!matches_all(&tags, meta.as_object().unwrap()));
    }

    #[test]
    fn test_split_leaves_or_members() {
        let filter: Filter = serde_json::from_value(json!({
            "$or": [{"tags": "#A"}, {"author": "Akainu"}]
        }))
        .unwrap();
        let (native, tags) = split_tag_constraints(&filter);
        assert_eq!(native, filter);
        assert!(tags.is_empty());
    }
}
