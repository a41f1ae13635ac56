//! Metadata filter model
//!
//! Filters use the Mongo-style JSON shape understood by Pinecone:
//! `{"author": "Jane Doe", "publishedTimestamp": {"$gte": 1, "$lt": 2}}`.
//! Sibling keys are implicitly conjoined; `$and`/`$or` hold nested filters.
//!
//! Every JSON object round-trips through [`Filter`] losslessly. Shapes the
//! model does not understand are carried as [`FieldValue::Raw`].

pub mod date;
pub mod validate;

pub use date::{month_from_name, DateRange};
pub use validate::validate;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Conjunction key
pub const AND_KEY: &str = "$and";

/// Disjunction key
pub const OR_KEY: &str = "$or";

/// Metadata field a constraint applies to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Article author (string)
    Author,

    /// Hashtag-style tags, stored as a string-encoded list
    Tags,

    /// Publication time in Unix seconds
    PublishedTimestamp,

    /// Legacy date fields carried through verbatim
    PublishedDate,
    PublishedYear,
    PublishedMonth,
    PublishedDay,

    /// Anything else
    Other(String),
}

impl Field {
    /// Date-like fields the validator copies verbatim
    pub const DATE_FIELDS: [Field; 5] = [
        Field::PublishedTimestamp,
        Field::PublishedDate,
        Field::PublishedYear,
        Field::PublishedMonth,
        Field::PublishedDay,
    ];

    /// JSON key for this field
    pub fn as_str(&self) -> &str {
        match self {
            Field::Author => "author",
            Field::Tags => "tags",
            Field::PublishedTimestamp => "publishedTimestamp",
            Field::PublishedDate => "publishedDate",
            Field::PublishedYear => "published_year",
            Field::PublishedMonth => "published_month",
            Field::PublishedDay => "published_day",
            Field::Other(name) => name,
        }
    }

    /// Map a JSON key to a field
    pub fn parse(key: &str) -> Self {
        match key {
            "author" => Field::Author,
            "tags" => Field::Tags,
            "publishedTimestamp" => Field::PublishedTimestamp,
            "publishedDate" => Field::PublishedDate,
            "published_year" => Field::PublishedYear,
            "published_month" => Field::PublishedMonth,
            "published_day" => Field::PublishedDay,
            other => Field::Other(other.to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Field::Other(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar filter value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(Number),
}

impl Scalar {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::String(s) => Value::String(s.clone()),
            Scalar::Number(n) => Value::Number(n.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            Scalar::Number(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Nin,
    ];

    /// JSON key, e.g. `$gte`
    pub fn key(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    /// Whether the operator expects an array operand
    pub fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::Nin)
    }
}

/// Right-hand side of an operator
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl Operand {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(Scalar::from_value)
                .collect::<Option<Vec<_>>>()
                .map(Operand::List),
            other => Scalar::from_value(other).map(Operand::Scalar),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Operand::Scalar(s) => s.to_value(),
            Operand::List(items) => Value::Array(items.iter().map(Scalar::to_value).collect()),
        }
    }
}

/// Operator object such as `{"$gte": 1, "$lt": 2}`
pub type OperatorSet = BTreeMap<Operator, Operand>;

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain equality: `{"tags": "#IPL2025"}`
    Scalar(Scalar),

    /// Operator object: `{"$in": [...]}`
    Operators(OperatorSet),

    /// Bare array (normalized to `$in` for tags by the validator)
    List(Vec<Scalar>),

    /// Unrecognized shape, kept verbatim
    Raw(Value),
}

impl FieldValue {
    /// Classify a JSON value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(_) | Value::Number(_) => Scalar::from_value(value)
                .map(FieldValue::Scalar)
                .unwrap_or_else(|| FieldValue::Raw(value.clone())),
            Value::Array(_) => match Operand::from_value(value) {
                Some(Operand::List(items)) => FieldValue::List(items),
                _ => FieldValue::Raw(value.clone()),
            },
            Value::Object(map) => operator_set(map)
                .map(FieldValue::Operators)
                .unwrap_or_else(|| FieldValue::Raw(value.clone())),
            _ => FieldValue::Raw(value.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Scalar(s) => s.to_value(),
            FieldValue::Operators(ops) => Value::Object(
                ops.iter()
                    .map(|(op, operand)| (op.key().to_string(), operand.to_value()))
                    .collect(),
            ),
            FieldValue::List(items) => Value::Array(items.iter().map(Scalar::to_value).collect()),
            FieldValue::Raw(value) => value.clone(),
        }
    }

    /// `{"$in": values}`
    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        let items = values.into_iter().map(Into::into).collect();
        FieldValue::Operators(BTreeMap::from([(Operator::In, Operand::List(items))]))
    }

    /// Half-open numeric range `{"$gte": start, "$lt": end}`
    pub fn range(start: i64, end: i64) -> Self {
        FieldValue::Operators(BTreeMap::from([
            (Operator::Gte, Operand::Scalar(start.into())),
            (Operator::Lt, Operand::Scalar(end.into())),
        ]))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.into())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s.into())
    }
}

fn operator_set(map: &Map<String, Value>) -> Option<OperatorSet> {
    if map.is_empty() {
        return None;
    }
    map.iter()
        .map(|(key, value)| Some((Operator::from_key(key)?, Operand::from_value(value)?)))
        .collect()
}

/// A metadata filter expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    /// Field constraints, implicitly conjoined
    pub fields: BTreeMap<Field, FieldValue>,

    /// `$and` members (never serialized when empty)
    pub all: Vec<Filter>,

    /// `$or` members (never serialized when empty)
    pub any: Vec<Filter>,
}

impl Filter {
    /// Filter matching everything
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-field filter
    pub fn field(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::empty().with(field, value)
    }

    /// Conjunction of members; an empty list yields the empty filter
    pub fn and(members: Vec<Filter>) -> Self {
        Self {
            all: members,
            ..Self::default()
        }
    }

    /// Add or replace a field constraint
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn get(&self, field: &Field) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.all.is_empty() && self.any.is_empty()
    }

    /// Parse a JSON object without dropping anything
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut filter = Filter::default();
        for (key, value) in map {
            match key.as_str() {
                AND_KEY | OR_KEY => match nested_filters(value) {
                    Some(members) if key == AND_KEY => filter.all = members,
                    Some(members) => filter.any = members,
                    None => {
                        filter
                            .fields
                            .insert(Field::Other(key.clone()), FieldValue::Raw(value.clone()));
                    }
                },
                _ => {
                    filter
                        .fields
                        .insert(Field::parse(key), FieldValue::from_value(value));
                }
            }
        }
        filter
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), value.to_value()))
            .collect();
        if !self.all.is_empty() {
            map.insert(
                AND_KEY.to_string(),
                Value::Array(self.all.iter().map(Filter::to_value).collect()),
            );
        }
        if !self.any.is_empty() {
            map.insert(
                OR_KEY.to_string(),
                Value::Array(self.any.iter().map(Filter::to_value).collect()),
            );
        }
        map
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Compact JSON text
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Rewrite `$or` of plain equalities on one field into `{field: {"$in": [...]}}`
    pub fn collapse_or(&mut self) {
        for member in self.all.iter_mut().chain(self.any.iter_mut()) {
            member.collapse_or();
        }

        if let Some((field, values)) = disjunction_as_in(&self.any) {
            if !self.fields.contains_key(&field) {
                self.fields.insert(field, FieldValue::any_of(values));
                self.any.clear();
            }
        }
    }
}

fn nested_filters(value: &Value) -> Option<Vec<Filter>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_object().map(Filter::from_map))
        .collect()
}

/// Values of a disjunction whose members all constrain the same field by equality
fn disjunction_as_in(members: &[Filter]) -> Option<(Field, Vec<Scalar>)> {
    let mut field: Option<&Field> = None;
    let mut values: Vec<Scalar> = Vec::new();

    for member in members {
        if member.fields.len() != 1 || !member.all.is_empty() || !member.any.is_empty() {
            return None;
        }
        let (member_field, value) = member.fields.iter().next()?;
        match field {
            Some(f) if f != member_field => return None,
            _ => field = Some(member_field),
        }

        let member_values = match value {
            FieldValue::Scalar(s) => vec![s.clone()],
            FieldValue::Operators(ops) if ops.len() == 1 => match ops.iter().next()? {
                (Operator::Eq, Operand::Scalar(s)) => vec![s.clone()],
                (Operator::In, Operand::List(items)) => items.clone(),
                _ => return None,
            },
            _ => return None,
        };

        for v in member_values {
            if !values.contains(&v) {
                values.push(v);
            }
        }
    }

    field.map(|f| (f.clone(), values))
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Filter::from_map(&map))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
