//! Conversions between JSON request/response bodies and stored BSON documents.

use bson::{Bson, Document};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

use crate::{DocumentStoreError, Result};

/// Field name of the primary key in every stored document.
pub const ID_FIELD: &str = "_id";

/// Converts a JSON object into a BSON document without validating its fields.
pub fn from_json(object: Map<String, Value>) -> Result<Document> {
    Ok(bson::to_document(&object)?)
}

/// Converts a single JSON value into BSON.
pub fn json_to_bson(value: Value) -> Result<Bson> {
    Ok(bson::to_bson(&value)?)
}

/// Renders a stored document as JSON.
///
/// ObjectIds become hex strings and datetimes become RFC 3339 strings with
/// millisecond precision; every other value uses relaxed extended JSON.
pub fn to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect(),
    )
}

/// Renders a single BSON value as JSON, see [`to_json`].
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => {
            Value::String(dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Bson::Document(doc) => to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Top-level equality match. A `Null` value also matches a missing field.
pub fn field_matches(document: &Document, field: &str, value: &Bson) -> bool {
    match document.get(field) {
        Some(actual) => values_equal(actual, value),
        None => matches!(value, Bson::Null),
    }
}

/// Query equality: numbers compare by value across `Int32`, `Int64` and
/// `Double`, recursively inside documents and arrays.
pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Document(a), Bson::Document(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && values_equal(va, vb))
        }
        (Bson::Array(a), Bson::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        _ => match (as_number(a), as_number(b)) {
            (Some(Number::Int(x)), Some(Number::Int(y))) => x == y,
            (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
            _ => a == b,
        },
    }
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

fn as_number(value: &Bson) -> Option<Number> {
    match value {
        Bson::Int32(n) => Some(Number::Int(i64::from(*n))),
        Bson::Int64(n) => Some(Number::Int(*n)),
        Bson::Double(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

/// Applies `fields` to `document` with `$set` semantics.
///
/// Keys are dotted paths: missing intermediate documents are created and
/// numeric segments index into arrays, padding with `Null`. Returns whether
/// any value changed.
pub(crate) fn apply_set(document: &mut Document, fields: Document) -> Result<bool> {
    let paths: Vec<&String> = fields.keys().collect();
    for (i, first) in paths.iter().enumerate() {
        for second in &paths[i + 1..] {
            let (shorter, longer) = if first.len() <= second.len() {
                (first, second)
            } else {
                (second, first)
            };
            if is_path_prefix(shorter, longer) {
                return Err(invalid_update(
                    longer,
                    format!("would create a conflict at '{shorter}'"),
                ));
            }
        }
    }

    let mut modified = false;
    for (path, value) in fields {
        if path.split('.').any(str::is_empty) {
            return Err(invalid_update(&path, "empty field name in path"));
        }
        let segments: Vec<&str> = path.split('.').collect();
        modified |= set_in_document(document, &path, &segments, value)?;
    }
    Ok(modified)
}

fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn invalid_update(path: &str, reason: impl Into<String>) -> DocumentStoreError {
    DocumentStoreError::InvalidUpdate {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn set_in_document(
    document: &mut Document,
    path: &str,
    segments: &[&str],
    value: Bson,
) -> Result<bool> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(false);
    };

    if rest.is_empty() {
        if document.get(*head) == Some(&value) {
            return Ok(false);
        }
        document.insert(*head, value);
        return Ok(true);
    }

    let child = document
        .entry(head.to_string())
        .or_insert_with(|| Bson::Document(Document::new()));
    set_in_value(child, path, rest, value)
}

fn set_in_value(target: &mut Bson, path: &str, segments: &[&str], value: Bson) -> Result<bool> {
    match target {
        Bson::Document(inner) => set_in_document(inner, path, segments, value),
        Bson::Array(items) => {
            let Some((head, rest)) = segments.split_first() else {
                return Ok(false);
            };
            let Ok(index) = head.parse::<usize>() else {
                return Err(invalid_update(
                    path,
                    format!("cannot create field '{head}' in an array"),
                ));
            };

            let padded = index >= items.len();
            if padded {
                items.resize(index + 1, Bson::Null);
            }
            if rest.is_empty() {
                if items[index] == value {
                    return Ok(false);
                }
                items[index] = value;
                return Ok(true);
            }
            if padded {
                items[index] = Bson::Document(Document::new());
            }
            set_in_value(&mut items[index], path, rest, value)
        }
        _ => Err(invalid_update(
            path,
            "cannot create a field inside a non-document value",
        )),
    }
}

/// Value used when checking a unique field; missing fields index as `Null`.
/// Compare keys with [`values_equal`].
pub(crate) fn unique_key(document: &Document, field: &str) -> Bson {
    document.get(field).cloned().unwrap_or(Bson::Null)
}
