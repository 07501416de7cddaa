//! Coercion of parsed JSON into a declared [`TypeDescriptor`].
//!
//! Parameter text is parsed into a [`serde_json::Value`] first and then normalized
//! here, so downstream code always sees the declared shape: integer strings become
//! integers, sets lose duplicates, sorted sets come out ascending, records carry
//! exactly their declared fields.

use crate::types::TypeDescriptor;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;

/// A value did not fit the declared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    /// JSON path of the offending value (`$`, `$[1].field`, ...)
    pub path: String,
    /// What the descriptor required at that path
    pub expected: String,
    /// What was found instead
    pub found: String,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}: expected {}, found {}",
            self.path, self.expected, self.found
        )
    }
}

impl std::error::Error for ShapeError {}

// Rendered only when an error is reported.
#[derive(Clone, Copy)]
enum JsonPath<'a> {
    Root,
    Index(&'a JsonPath<'a>, usize),
    Key(&'a JsonPath<'a>, &'a str),
}

impl fmt::Display for JsonPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonPath::Root => f.write_str("$"),
            JsonPath::Index(parent, i) => write!(f, "{parent}[{i}]"),
            JsonPath::Key(parent, key) => write!(f, "{parent}.{key}"),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: &JsonPath<'_>, shape: &TypeDescriptor, found: &Value) -> ShapeError {
    ShapeError {
        path: path.to_string(),
        expected: shape.to_string(),
        found: kind(found).to_string(),
    }
}

/// Coerce `value` into `shape`.
///
/// # Errors
///
/// Returns a [`ShapeError`] naming the first path that cannot be coerced.
pub fn coerce(value: Value, shape: &TypeDescriptor) -> Result<Value, ShapeError> {
    coerce_at(value, shape, &JsonPath::Root)
}

fn coerce_at(value: Value, shape: &TypeDescriptor, path: &JsonPath<'_>) -> Result<Value, ShapeError> {
    // null is a valid value for every reference-like position
    if value.is_null() {
        return Ok(value);
    }
    match shape {
        TypeDescriptor::Any => Ok(value),
        TypeDescriptor::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(path, shape, &other)),
        },
        TypeDescriptor::Integer => {
            if value.is_i64() || value.is_u64() {
                return Ok(value);
            }
            match value {
                Value::Number(n) => integral(&n)
                    .map(Value::from)
                    .ok_or_else(|| mismatch(path, shape, &Value::Number(n))),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| mismatch(path, shape, &Value::String(s))),
                other => Err(mismatch(path, shape, &other)),
            }
        }
        TypeDescriptor::Number => match value {
            Value::Number(n) => Ok(Value::Number(canonical_number(n))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(|n| Value::Number(canonical_number(n)))
                .ok_or_else(|| mismatch(path, shape, &Value::String(s))),
            other => Err(mismatch(path, shape, &other)),
        },
        TypeDescriptor::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::String(s) => {
                let parsed = match s.trim() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                };
                parsed
                    .map(Value::Bool)
                    .ok_or_else(|| mismatch(path, shape, &Value::String(s)))
            }
            other => Err(mismatch(path, shape, &other)),
        },
        TypeDescriptor::Record(record) => {
            let mut object = match value {
                Value::Object(object) => object,
                other => return Err(mismatch(path, shape, &other)),
            };
            if let Some(unknown) = object.keys().find(|k| record.field(k).is_none()) {
                return Err(ShapeError {
                    path: path.to_string(),
                    expected: shape.to_string(),
                    found: format!("unknown field `{unknown}`"),
                });
            }
            let mut out = Map::with_capacity(record.fields().len());
            for field in record.fields() {
                let raw = object.remove(&field.name).unwrap_or(Value::Null);
                let coerced = coerce_at(raw, &field.ty, &JsonPath::Key(path, &field.name))?;
                out.insert(field.name.clone(), coerced);
            }
            Ok(Value::Object(out))
        }
        TypeDescriptor::List(element) => {
            let items = coerce_elements(value, shape, element, path)?;
            Ok(Value::Array(items))
        }
        TypeDescriptor::Set(element) => {
            let items = coerce_elements(value, shape, element, path)?;
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            Ok(Value::Array(unique))
        }
        TypeDescriptor::SortedSet(element) => {
            let mut items = coerce_elements(value, shape, element, path)?;
            ensure_comparable(&items, shape, path)?;
            items.sort_by(compare_scalars);
            items.dedup_by(|a, b| compare_scalars(a, b) == Ordering::Equal);
            Ok(Value::Array(items))
        }
        TypeDescriptor::Map(key, element) => {
            let object = match value {
                Value::Object(object) => object,
                other => return Err(mismatch(path, shape, &other)),
            };
            let mut out = Map::with_capacity(object.len());
            for (k, v) in object {
                let normalized_key = coerce_key(&k, key).ok_or_else(|| ShapeError {
                    path: JsonPath::Key(path, &k).to_string(),
                    expected: format!("key of type {key}"),
                    found: format!("key `{k}`"),
                })?;
                let coerced = coerce_at(v, element, &JsonPath::Key(path, &k))?;
                out.insert(normalized_key, coerced);
            }
            Ok(Value::Object(out))
        }
    }
}

// Largest magnitude below which every f64 integer is exact.
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// The `i64` an integral float such as `2.0` stands for.
fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_F64_INT {
        Some(f as i64)
    } else {
        None
    }
}

/// One representation per numeric value: integral floats become integers, so
/// `1`, `1.0` and `"1"` compare equal in sets.
fn canonical_number(n: Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n;
    }
    match integral(&n) {
        Some(i) => Number::from(i),
        None => n,
    }
}

fn coerce_elements(
    value: Value,
    shape: &TypeDescriptor,
    element: &TypeDescriptor,
    path: &JsonPath<'_>,
) -> Result<Vec<Value>, ShapeError> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(mismatch(path, shape, &other)),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| coerce_at(item, element, &JsonPath::Index(path, i)))
        .collect()
}

/// JSON object keys are always strings; check them against the key descriptor and
/// return the canonical key text.
fn coerce_key(key: &str, shape: &TypeDescriptor) -> Option<String> {
    match shape {
        TypeDescriptor::String | TypeDescriptor::Any => Some(key.to_string()),
        TypeDescriptor::Integer => key.trim().parse::<i64>().ok().map(|n| n.to_string()),
        TypeDescriptor::Number => key
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| canonical_number(n).to_string()),
        TypeDescriptor::Boolean => match key.trim() {
            "true" | "false" => Some(key.trim().to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn ensure_comparable(
    items: &[Value],
    shape: &TypeDescriptor,
    path: &JsonPath<'_>,
) -> Result<(), ShapeError> {
    let Some(first) = items.first() else {
        return Ok(());
    };
    for (i, item) in items.iter().enumerate() {
        let comparable = matches!(
            (first, item),
            (Value::Number(_), Value::Number(_))
                | (Value::String(_), Value::String(_))
                | (Value::Bool(_), Value::Bool(_))
        );
        if !comparable {
            return Err(ShapeError {
                path: JsonPath::Index(path, i).to_string(),
                expected: format!("element comparable with {} in {shape}", kind(first)),
                found: kind(item).to_string(),
            });
        }
    }
    Ok(())
}

fn compare_scalars(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordType;
    use serde_json::json;

    fn pojo() -> TypeDescriptor {
        TypeDescriptor::Record(RecordType::new("Pojo", [("field", TypeDescriptor::Integer)]))
    }

    #[test]
    fn test_integer_strings_become_integers() {
        let shape = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Integer);
        let v = coerce(json!({"a": "1", "b": 2}), &shape).unwrap();
        assert_eq!(v, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_map_keeps_document_order() {
        let shape = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Integer);
        let v = coerce(json!({"z": 1, "a": 2, "m": 3}), &shape).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_integer_map_keys_are_checked() {
        let shape = TypeDescriptor::map(TypeDescriptor::Integer, TypeDescriptor::String);
        assert_eq!(
            coerce(json!({"01": "x"}), &shape).unwrap(),
            json!({"1": "x"})
        );
        let err = coerce(json!({"one": "x"}), &shape).unwrap_err();
        assert_eq!(err.path, "$.one");
    }

    #[test]
    fn test_set_drops_duplicates_in_first_seen_order() {
        let shape = TypeDescriptor::set(TypeDescriptor::Integer);
        assert_eq!(coerce(json!([5, 3, 5, 4, 3]), &shape).unwrap(), json!([5, 3, 4]));
    }

    #[test]
    fn test_sorted_set_sorts_and_dedups() {
        let shape = TypeDescriptor::sorted_set(TypeDescriptor::Integer);
        assert_eq!(coerce(json!([9, 7, "8", 7]), &shape).unwrap(), json!([7, 8, 9]));

        let shape = TypeDescriptor::sorted_set(TypeDescriptor::String);
        assert_eq!(coerce(json!(["b", "a"]), &shape).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_sorted_set_rejects_mixed_kinds() {
        let shape = TypeDescriptor::sorted_set(TypeDescriptor::Any);
        let err = coerce(json!([1, "a"]), &shape).unwrap_err();
        assert_eq!(err.path, "$[1]");
        assert_eq!(err.found, "string");
    }

    #[test]
    fn test_record_fields() {
        let shape = TypeDescriptor::list(pojo());
        assert_eq!(
            coerce(json!([{"field": 2}, {"field": "4"}, {}]), &shape).unwrap(),
            json!([{"field": 2}, {"field": 4}, {"field": null}])
        );

        let err = coerce(json!([{"field": 1}, {"other": 1}]), &shape).unwrap_err();
        assert_eq!(err.path, "$[1]");
        assert!(err.found.contains("other"));
    }

    #[test]
    fn test_nested_error_path() {
        let shape = TypeDescriptor::list(pojo());
        let err = coerce(json!([{"field": 1}, {"field": "x"}]), &shape).unwrap_err();
        assert_eq!(err.path, "$[1].field");
        assert_eq!(err.expected, "integer");
        assert_eq!(err.found, "string");
    }

    #[test]
    fn test_scalar_mismatches() {
        assert!(coerce(json!(1.5), &TypeDescriptor::Integer).is_err());
        assert!(coerce(json!([1]), &TypeDescriptor::String).is_err());
        assert!(coerce(json!("yes"), &TypeDescriptor::Boolean).is_err());
        assert_eq!(
            coerce(json!("2.5"), &TypeDescriptor::Number).unwrap(),
            json!(2.5)
        );
        assert_eq!(coerce(json!(7), &TypeDescriptor::String).unwrap(), json!("7"));
    }

    #[test]
    fn test_numeric_sets_treat_equal_values_as_duplicates() {
        let shape = TypeDescriptor::set(TypeDescriptor::Number);
        assert_eq!(coerce(json!([1, "1", 1.0, 2.5]), &shape).unwrap(), json!([1, 2.5]));

        let shape = TypeDescriptor::sorted_set(TypeDescriptor::Number);
        assert_eq!(coerce(json!([2, 1, 1.0, "1"]), &shape).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_integral_floats_are_integers() {
        assert_eq!(coerce(json!(2.0), &TypeDescriptor::Integer).unwrap(), json!(2));
        assert!(coerce(json!(2.5), &TypeDescriptor::Integer).is_err());
        assert!(coerce(json!(1e300), &TypeDescriptor::Integer).is_err());

        let shape = TypeDescriptor::list(pojo());
        assert_eq!(
            coerce(json!([{"field": 4.0}]), &shape).unwrap(),
            json!([{"field": 4}])
        );
    }

    #[test]
    fn test_collections_require_arrays() {
        let err = coerce(json!({"a": 1}), &TypeDescriptor::list(TypeDescriptor::Any)).unwrap_err();
        assert_eq!(err.path, "$");
        assert_eq!(err.found, "object");
    }
}
