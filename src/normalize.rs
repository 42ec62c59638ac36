//! Value normalization for schema-less storage records.
//!
//! Records reach the portal in two coexisting conventions: DynamoDB's typed
//! attribute wrappers (`{"S": "x"}`, `{"N": "42"}`, `{"L": [...]}`, ...) and
//! already-plain JSON. Both are reduced to plain [`Value`]s here so the
//! projector and the sidebar aggregator never see the difference.
//!
//! Classification is a pure inspection step ([`classify`]) that yields an
//! [`AttributeShape`]; conversion then matches on the shape.
//!
//! # Typed attributes
//!
//! An object is a typed attribute when it has exactly one key and that key
//! is a DynamoDB type descriptor:
//!
//! | Tag | Result |
//! |-----|--------|
//! | `S`, `B` | string |
//! | `N` | number (integer when it fits `i64`, else finite float) |
//! | `BOOL` | boolean |
//! | `NULL` | null |
//! | `L` | array, elements normalized |
//! | `M` | object, values normalized, keys preserved |
//! | `SS`, `BS` | array of strings |
//! | `NS` | array of numbers |
//!
//! Any other object is treated as plain and normalized field by field.

use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::error::MalformedValue;
use crate::models::RawRecord;

/// DynamoDB attribute type descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Number,
    Binary,
    Bool,
    Null,
    List,
    Map,
    StringSet,
    NumberSet,
    BinarySet,
}

impl TypeTag {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "S" => Some(Self::String),
            "N" => Some(Self::Number),
            "B" => Some(Self::Binary),
            "BOOL" => Some(Self::Bool),
            "NULL" => Some(Self::Null),
            "L" => Some(Self::List),
            "M" => Some(Self::Map),
            "SS" => Some(Self::StringSet),
            "NS" => Some(Self::NumberSet),
            "BS" => Some(Self::BinarySet),
            _ => None,
        }
    }
}

/// The storage convention a single value was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeShape<'a> {
    /// Null or a non-object scalar; passes through unchanged.
    Scalar(&'a Value),
    /// A plain JSON array.
    Array(&'a [Value]),
    /// A typed attribute wrapper with its payload.
    Typed(TypeTag, &'a Value),
    /// An already-plain object.
    Plain(&'a Map<String, Value>),
}

/// Classify a value without converting it.
pub fn classify(value: &Value) -> AttributeShape<'_> {
    match value {
        Value::Array(items) => AttributeShape::Array(items),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some((key, payload)) = map.iter().next() {
                    if let Some(tag) = TypeTag::from_key(key) {
                        return AttributeShape::Typed(tag, payload);
                    }
                }
            }
            AttributeShape::Plain(map)
        }
        other => AttributeShape::Scalar(other),
    }
}

/// Convert a stored value into its plain form, recursively.
///
/// The only failure is a payload that cannot be coerced into the type its
/// tag declares, such as `{"N": "abc"}`.
pub fn normalize(value: &Value) -> Result<Value, MalformedValue> {
    match classify(value) {
        AttributeShape::Scalar(v) => Ok(v.clone()),
        AttributeShape::Array(items) => items
            .iter()
            .map(normalize)
            .collect::<Result<_, _>>()
            .map(Value::Array),
        AttributeShape::Plain(map) => normalize_map(map).map(Value::Object),
        AttributeShape::Typed(tag, payload) => normalize_typed(tag, payload),
    }
}

fn normalize_typed(tag: TypeTag, payload: &Value) -> Result<Value, MalformedValue> {
    match tag {
        TypeTag::String | TypeTag::Binary => match payload {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(unexpected("string", other)),
        },
        TypeTag::Number => parse_number(payload).map(Value::Number),
        TypeTag::Bool => match payload {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(unexpected("boolean", other)),
        },
        TypeTag::Null => Ok(Value::Null),
        TypeTag::List => match payload {
            Value::Null => Ok(Value::Array(Vec::new())),
            Value::Array(items) => items
                .iter()
                .map(normalize)
                .collect::<Result<_, _>>()
                .map(Value::Array),
            other => Err(unexpected("list", other)),
        },
        TypeTag::Map => match payload {
            Value::Null => Ok(Value::Object(Map::new())),
            Value::Object(map) => normalize_map(map).map(Value::Object),
            other => Err(unexpected("map", other)),
        },
        TypeTag::StringSet | TypeTag::BinarySet => match payload {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(Value::String(s.clone())),
                    other => Err(unexpected("string", other)),
                })
                .collect::<Result<_, _>>()
                .map(Value::Array),
            other => Err(unexpected("set", other)),
        },
        TypeTag::NumberSet => match payload {
            Value::Array(items) => items
                .iter()
                .map(|item| parse_number(item).map(Value::Number))
                .collect::<Result<_, _>>()
                .map(Value::Array),
            other => Err(unexpected("set", other)),
        },
    }
}

fn normalize_map(map: &Map<String, Value>) -> Result<Map<String, Value>, MalformedValue> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), normalize(value)?);
    }
    Ok(out)
}

/// Parse a DynamoDB number payload. DynamoDB sends numbers as strings; plain
/// JSON numbers are accepted as-is.
fn parse_number(payload: &Value) -> Result<Number, MalformedValue> {
    match payload {
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Number::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| MalformedValue::NotANumber(s.clone()))
        }
        other => Err(unexpected("number", other)),
    }
}

fn unexpected(expected: &'static str, found: &Value) -> MalformedValue {
    MalformedValue::UnexpectedType {
        expected,
        found: kind_of(found),
    }
}

/// Human-readable JSON kind, used in diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============ Records ============

/// A field that was dropped during record normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedField {
    pub field: String,
    pub error: MalformedValue,
}

/// Result of normalizing one record field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    pub fields: Map<String, Value>,
    pub malformed: Vec<MalformedField>,
}

/// Normalize every top-level field independently.
///
/// A malformed field is left out of `fields` and reported in `malformed`;
/// it never affects its siblings.
pub fn normalize_record(raw: &RawRecord) -> NormalizedRecord {
    let mut record = NormalizedRecord::default();
    for (field, value) in raw {
        match normalize(value) {
            Ok(plain) => {
                record.fields.insert(field.clone(), plain);
            }
            Err(error) => record.malformed.push(MalformedField {
                field: field.clone(),
                error,
            }),
        }
    }
    record
}

/// Normalize a record and log any field that had to be dropped.
pub fn normalize_lenient(raw: &RawRecord) -> Map<String, Value> {
    let record = normalize_record(raw);
    for bad in &record.malformed {
        warn!(field = %bad.field, error = %bad.error, "skipping malformed field");
    }
    record.fields
}

// ============ Field access ============

/// Render a plain scalar as text.
///
/// Falsy scalars (`null`, `""`, `false`, `0`) count as absent. Arrays and
/// objects cannot be rendered and are reported as malformed.
pub fn scalar_text(value: &Value) -> Result<Option<String>, MalformedValue> {
    match value {
        v if is_falsy(v) => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(unexpected("scalar", other)),
    }
}

/// `null`, `""`, `false` and numeric zero.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// First usable text among `candidates`, in order.
///
/// Absent or empty candidates fall through to the next one. A candidate of
/// an un-renderable type is logged and skipped the same way.
pub fn text_field(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|name| {
        let value = fields.get(*name)?;
        match scalar_text(value) {
            Ok(text) => text,
            Err(error) => {
                warn!(field = %name, %error, "ignoring field with unexpected type");
                None
            }
        }
    })
}
