//! Dot-path resolution on JSON values
//!
//! A `PropertyPath` addresses a nested property with a `.`-separated chain.
//! Reading is pure; structure creation happens only through the explicit
//! `resolve_or_create` and `assign` operations.

use serde_json::{Map, Value};
use std::fmt;

/// A parsed `.`-separated property chain
///
/// A leading `.` (an empty first segment) is stripped, so `.name` and
/// `name` address the same top-level field. Interior empty segments are
/// kept and simply fail to resolve unless the item really has an
/// empty-string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn parse(text: &str) -> Self {
        let mut segments: Vec<String> = text.split('.').map(str::to_string).collect();
        if segments.first().is_some_and(String::is_empty) {
            segments.remove(0);
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolve the path against a value without mutating it
    ///
    /// Objects are walked by key, arrays by numeric segment. Returns `None`
    /// for a missing property, a non-container intermediate, or an empty
    /// path.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        if self.segments.is_empty() {
            return None;
        }
        let mut current = value;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Walk the path, creating intermediate objects as needed
    ///
    /// Non-object intermediates (scalars, arrays) are overwritten with empty
    /// objects. The terminal slot is created as `Null` when absent. An empty
    /// path returns the root untouched.
    pub fn resolve_or_create<'a>(&self, value: &'a mut Value) -> &'a mut Value {
        let mut current = value;
        for segment in &self.segments {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(map) => map.entry(segment.as_str()).or_insert(Value::Null),
                _ => unreachable!(),
            };
        }
        current
    }

    /// Store a value at the terminal segment, vivifying intermediates
    ///
    /// An empty path is a no-op.
    pub fn assign(&self, target: &mut Value, new_value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };
        let mut current = target;
        for segment in parents {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(map) => map.entry(segment.as_str()).or_insert(Value::Null),
                _ => unreachable!(),
            };
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        if let Value::Object(map) = current {
            map.insert(last.clone(), new_value);
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
