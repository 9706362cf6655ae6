//! Dotted-path field access over a record's JSON view
//!
//! Resolution never fails: a missing segment, a null, or an intermediate
//! node that is not an object all yield [`FieldValue::Absent`]. "Not
//! stated" and "stated as null" are deliberately indistinguishable.

use serde_json::Value;

/// Present/absent result of a path lookup. Present values are never null.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Present(&'a Value),
    Absent,
}

impl<'a> FieldValue<'a> {
    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }

    /// True when the value is absent or an empty string. Zero, false, and
    /// empty lists all count as provided; only emptiness of text does not.
    pub fn is_missing_or_blank(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Present(Value::String(s)) => s.is_empty(),
            FieldValue::Present(_) => false,
        }
    }
}

/// Resolve a dot-separated path (e.g. `"financials.annual_income"`)
/// against a JSON view of the record.
pub fn resolve<'a>(root: &'a Value, path: &str) -> FieldValue<'a> {
    let mut current = root;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return FieldValue::Absent,
            },
            _ => return FieldValue::Absent,
        }
    }
    if current.is_null() {
        FieldValue::Absent
    } else {
        FieldValue::Present(current)
    }
}
