//! Record values and row keys.
//!
//! Row data is schemaless JSON (`serde_json::Value`). This module holds the
//! handful of value semantics the grid relies on: row key extraction, dotted
//! path lookup, truthiness, numeric coercion of span expressions, scope
//! overlays and the pristine/modified diff.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object holding one record's fields.
pub type Record = Map<String, Value>;

/// The key field used when none is configured.
pub const DEFAULT_KEY_FIELD: &str = "key";

/// The primary field used when none is configured.
pub const DEFAULT_PRIMARY_FIELD: &str = "id";

/// Identity of a row inside selection and expansion sets.
///
/// Keys come from a configurable record field and may be numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    /// An integral key.
    Int(i64),
    /// A textual key.
    Str(String),
}

impl RowKey {
    /// Extract a key from a JSON value.
    ///
    /// Integers and strings map directly; other numbers and booleans use
    /// their textual form. `null`, arrays and objects are not keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => Some(Self::Str(n.to_string())),
            },
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Bool(b) => Some(Self::Str(b.to_string())),
            _ => None,
        }
    }

    /// Convert back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RowKey {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Read `record[key_field]` as a row key.
pub fn key_of(record: &Value, key_field: &str) -> Option<RowKey> {
    record.get(key_field).and_then(RowKey::from_value)
}

/// Resolve a dotted path (`a.b.0.c`) against `data`.
///
/// A leading `$` or a `${...}` wrapper is accepted and stripped, so pure
/// variable expressions resolve the same way as bare paths. An empty path or
/// `&` resolves to `data` itself.
pub fn resolve_variable<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    let path = strip_variable(path);
    if path.is_empty() || path == "&" {
        return Some(data);
    }

    path.split('.').try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn strip_variable(path: &str) -> &str {
    let trimmed = path.trim();
    if let Some(inner) = trimmed.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        return inner.trim();
    }
    trimmed.strip_prefix('$').unwrap_or(trimmed)
}

/// Truthiness with the same rules dynamic expression languages use.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value the way a template filter would print it.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Largest span a cell may declare.
pub const MAX_SPAN: usize = u32::MAX as usize;

/// Numeric coercion of a span expression result.
///
/// The text is parsed as a number; anything that is not a positive finite
/// number yields `0`, which means "no span". Fractions are truncated and
/// results are capped at [`MAX_SPAN`].
pub fn to_span(text: &str) -> usize {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 1.0 => (n as usize).min(MAX_SPAN),
        _ => 0,
    }
}

/// Shallow-merge the fields of `values` into `target`.
///
/// Non-object targets are replaced by an empty object first; non-object
/// `values` are ignored.
pub fn merge_into(target: &mut Value, values: &Value) {
    let Value::Object(updates) = values else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Record::new());
    }
    if let Value::Object(fields) = target {
        for (key, value) in updates {
            fields.insert(key.clone(), value.clone());
        }
    }
}

/// Build a new scope: the fields of `base` overlaid with `overlay`.
pub fn create_object(base: &Value, overlay: Record) -> Value {
    let mut scope = match base {
        Value::Object(fields) => Value::Object(fields.clone()),
        _ => Value::Object(Record::new()),
    };
    merge_into(&mut scope, &Value::Object(overlay));
    scope
}

/// Structural diff of `data` against `base`.
///
/// Returns the fields of `data` whose values differ from `base`. Nested
/// objects are diffed recursively; arrays are taken whole. Fields present in
/// `base` but missing from `data` appear as `null`. Fields named in
/// `excluded` never appear in the result.
pub fn difference(data: &Value, base: &Value, excluded: &[&str]) -> Record {
    let mut result = Record::new();
    let (Value::Object(current), Value::Object(original)) = (data, base) else {
        return result;
    };

    let keys = current
        .keys()
        .chain(original.keys().filter(|k| !current.contains_key(*k)));

    for key in keys {
        if excluded.contains(&key.as_str()) {
            continue;
        }
        let a = current.get(key);
        let b = original.get(key);
        if a == b {
            continue;
        }
        let changed = match (a, b) {
            (None, _) => Value::Null,
            (Some(a), Some(b)) if a.is_object() && b.is_object() => {
                Value::Object(difference(a, b, &[]))
            }
            (Some(a), _) => a.clone(),
        };
        result.insert(key.clone(), changed);
    }

    result
}
