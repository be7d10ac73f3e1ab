use std::collections::BTreeMap;

use serde_json::Value;

/// Field filters for `Repository::find_by`. A record matches when every
/// entry matches: a scalar value must loosely equal the record's field, a
/// list value must loosely contain it. The empty map matches everything.
#[derive(Debug, Clone, Default)]
pub struct FilterMap(BTreeMap<String, FilterValue>);

#[derive(Debug, Clone)]
pub enum FilterValue {
    One(Value),
    Any(Vec<Value>),
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), FilterValue::One(value.into()));
        self
    }

    pub fn field_in(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.0.insert(name.into(), FilterValue::Any(values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    /// True when `doc` (a serialized record) satisfies every filter.
    pub fn matches(&self, doc: &Value) -> bool {
        self.0.iter().all(|(field, filter)| {
            let actual = doc.get(field).unwrap_or(&Value::Null);
            match filter {
                FilterValue::One(expected) => loose_eq(actual, expected),
                FilterValue::Any(expected) => expected.iter().any(|v| loose_eq(actual, v)),
            }
        })
    }
}

/// Loose scalar equality: a number and its string spelling compare equal.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Canonical text form of a scalar; `None` for arrays, objects, and null.
pub fn canonical(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(canonical_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn canonical_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        // Integer-valued floats spell the same as the integer.
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
