//! Templates and rules
//!
//! A template is an ordered list of entries mapping output-key specifiers
//! to rules. Classification happens once, at construction: strings become
//! the `=item` sentinel or dotted property paths, mappings become nested
//! templates, everything else is a literal. Values fetched from an item at
//! evaluation time are plain data and are never re-classified.

use crate::error::RemoldError;
use crate::fingerprint::Fingerprint;
use crate::path::PropertyPath;
use crate::RemoldResult;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// The sentinel string that resolves to the entire input item
pub const WHOLE_ITEM_SENTINEL: &str = "=item";

/// How one output field's value is derived from an input item
#[derive(Debug, Clone)]
pub enum Rule {
    /// A value returned as-is
    Literal(Value),
    /// A property chain resolved against the item; absent resolves to `Null`
    Path(PropertyPath),
    /// The entire input item
    WholeItem,
    /// A caller-supplied function receiving the raw, unresolved item
    Function(RuleFn),
    /// A mapping of sub-rules, resolved and merged into a single value
    Nested(Template),
}

impl Rule {
    /// Classify a JSON value into a rule
    ///
    /// The exact string `=item` is the whole-item sentinel. A string
    /// containing a `.` is a property path (`.field` addresses a top-level
    /// field). Mappings are nested templates, classified recursively. All
    /// other values, dotless strings included, are literals.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) if s == WHOLE_ITEM_SENTINEL => Rule::WholeItem,
            Value::String(s) if s.contains('.') => Rule::Path(PropertyPath::parse(&s)),
            Value::Object(map) => {
                let mut nested = Template::new();
                for (key, value) in map {
                    nested.insert(&key, Rule::from_value(value));
                }
                Rule::Nested(nested)
            }
            other => Rule::Literal(other),
        }
    }

    /// A literal rule; the value is returned as-is for every item
    pub fn literal(value: Value) -> Self {
        Rule::Literal(value)
    }

    /// An explicit path rule; unlike `from_value`, dotless one-segment
    /// paths can be expressed here
    pub fn path(text: &str) -> Self {
        Rule::Path(PropertyPath::parse(text))
    }

    /// The whole-item sentinel rule
    pub fn whole_item() -> Self {
        Rule::WholeItem
    }

    /// A nested-template rule
    pub fn nested(template: Template) -> Self {
        Rule::Nested(template)
    }

    /// A named infallible function rule
    ///
    /// The name is the rule's content identity for caching; two rules with
    /// the same name are treated as the same computation.
    pub fn function(name: &str, f: impl Fn(&Value) -> Value + 'static) -> Self {
        Rule::Function(RuleFn::new(name, move |item| Ok(f(item))))
    }

    /// A named fallible function rule; failures propagate to the caller
    /// and are never cached
    pub fn try_function(
        name: &str,
        f: impl Fn(&Value) -> RemoldResult<Value> + 'static,
    ) -> Self {
        Rule::Function(RuleFn::new(name, f))
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_rule(self)
    }

    /// Classify a template key
    ///
    /// Keys are authored as strings, so they classify like string rule
    /// values: sentinel, dotted path, or literal. Keys can never be
    /// functions.
    pub(crate) fn from_key(raw: &str) -> Self {
        if raw == WHOLE_ITEM_SENTINEL {
            Rule::WholeItem
        } else if raw.contains('.') {
            Rule::Path(PropertyPath::parse(raw))
        } else {
            Rule::Literal(Value::String(raw.to_string()))
        }
    }
}

/// A named caller-supplied rule function
///
/// Cheap to clone; clones share the same closure.
#[derive(Clone)]
pub struct RuleFn {
    name: Rc<str>,
    body: Rc<dyn Fn(&Value) -> RemoldResult<Value>>,
}

impl RuleFn {
    pub fn new(name: &str, body: impl Fn(&Value) -> RemoldResult<Value> + 'static) -> Self {
        Self {
            name: Rc::from(name),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, item: &Value) -> RemoldResult<Value> {
        (self.body)(item)
    }
}

impl fmt::Debug for RuleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One template entry: the raw key text, its classified key rule, and the
/// value rule
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    raw_key: String,
    key: Rule,
    rule: Rule,
}

impl TemplateEntry {
    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    pub fn key_rule(&self) -> &Rule {
        &self.key
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

/// A reusable description of output keys and how to derive their values
///
/// Entries keep authoring order, which is the merge order for colliding
/// resolved keys (later wins). Content identity ignores entry order.
#[derive(Debug, Clone, Default)]
pub struct Template {
    entries: Vec<TemplateEntry>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a template from a JSON object, classifying every entry
    pub fn from_value(value: Value) -> RemoldResult<Self> {
        match value {
            Value::Object(map) => {
                let mut template = Template::new();
                for (key, value) in map {
                    template.insert(&key, Rule::from_value(value));
                }
                Ok(template)
            }
            other => Err(RemoldError::InvalidTemplate(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Insert an entry, replacing any existing entry with the same raw key
    /// in place
    pub fn insert(&mut self, key: &str, rule: Rule) -> &mut Self {
        let entry = TemplateEntry {
            raw_key: key.to_string(),
            key: Rule::from_key(key),
            rule,
        };
        if let Some(existing) = self.entries.iter_mut().find(|e| e.raw_key == key) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
        self
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_template(self)
    }

    /// Nesting depth; a flat template has depth 1
    pub(crate) fn depth(&self) -> usize {
        1 + self
            .entries
            .iter()
            .map(|entry| match entry.rule() {
                Rule::Nested(template) => template.depth(),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Longest property path used by any key or rule in this template
    pub(crate) fn max_path_segments(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| {
                let key_len = match entry.key_rule() {
                    Rule::Path(path) => path.segments().len(),
                    _ => 0,
                };
                let rule_len = match entry.rule() {
                    Rule::Path(path) => path.segments().len(),
                    Rule::Nested(template) => template.max_path_segments(),
                    _ => 0,
                };
                key_len.max(rule_len)
            })
            .max()
            .unwrap_or(0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
