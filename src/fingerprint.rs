//! Content identity for items, rules, and templates
//!
//! Cache keys are SHA-256 digests over a canonical encoding of the input:
//! object keys are hashed in sorted order, so identity never depends on key
//! insertion order, and every variant and length is tagged so distinct
//! shapes cannot collide byte-wise.

use crate::template::{Rule, Template, TemplateEntry};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Domain tags for combined cache keys, one per key space
pub(crate) mod domain {
    pub const VALUE: u8 = 1;
    pub const ENTRY: u8 = 2;
    pub const SEQUENCE: u8 = 3;
    pub const MERGED: u8 = 4;
}

mod tag {
    pub const NULL: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const NUMBER: u8 = 2;
    pub const STRING: u8 = 3;
    pub const ARRAY: u8 = 4;
    pub const OBJECT: u8 = 5;
    pub const LITERAL: u8 = 10;
    pub const PATH: u8 = 11;
    pub const WHOLE_ITEM: u8 = 12;
    pub const FUNCTION: u8 = 13;
    pub const NESTED: u8 = 14;
    pub const TEMPLATE_ENTRY: u8 = 15;
}

/// A canonical SHA-256 content digest
///
/// Identity is structural: two separately built values with the same
/// content produce the same fingerprint. Function rules hash their
/// caller-supplied name, which is the caller's purity contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint of an item or any other JSON value
    pub fn of_value(value: &Value) -> Self {
        let mut hasher = Sha256::new();
        hash_value(&mut hasher, value);
        Self(hasher.finalize().into())
    }

    /// Fingerprint of a single rule
    pub fn of_rule(rule: &Rule) -> Self {
        let mut hasher = Sha256::new();
        hash_rule(&mut hasher, rule);
        Self(hasher.finalize().into())
    }

    /// Fingerprint of a template, independent of entry order
    pub fn of_template(template: &Template) -> Self {
        let mut hasher = Sha256::new();
        hash_template(&mut hasher, template);
        Self(hasher.finalize().into())
    }

    /// Combine fingerprints into one key under a domain tag
    ///
    /// Parts are fixed-width, so concatenation is injective; the domain tag
    /// keeps key spaces of different operations disjoint.
    pub fn combine(domain: u8, parts: &[Fingerprint]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([domain]);
        for part in parts {
            hasher.update(part.0);
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

fn hash_str(hasher: &mut Sha256, text: &str) {
    hasher.update((text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update([tag::NULL]),
        Value::Bool(b) => hasher.update([tag::BOOL, *b as u8]),
        Value::Number(n) => {
            hasher.update([tag::NUMBER]);
            hash_str(hasher, &n.to_string());
        }
        Value::String(s) => {
            hasher.update([tag::STRING]);
            hash_str(hasher, s);
        }
        Value::Array(items) => {
            hasher.update([tag::ARRAY]);
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update([tag::OBJECT]);
            hasher.update((map.len() as u64).to_le_bytes());
            // sorted explicitly: identity must not depend on insertion order
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in fields {
                hash_str(hasher, key);
                hash_value(hasher, value);
            }
        }
    }
}

fn hash_rule(hasher: &mut Sha256, rule: &Rule) {
    match rule {
        Rule::Literal(value) => {
            hasher.update([tag::LITERAL]);
            hash_value(hasher, value);
        }
        Rule::Path(path) => {
            hasher.update([tag::PATH]);
            hasher.update((path.segments().len() as u64).to_le_bytes());
            for segment in path.segments() {
                hash_str(hasher, segment);
            }
        }
        Rule::WholeItem => hasher.update([tag::WHOLE_ITEM]),
        Rule::Function(func) => {
            hasher.update([tag::FUNCTION]);
            hash_str(hasher, func.name());
        }
        Rule::Nested(template) => {
            hasher.update([tag::NESTED]);
            hash_template(hasher, template);
        }
    }
}

fn hash_template(hasher: &mut Sha256, template: &Template) {
    let mut entries: Vec<&TemplateEntry> = template.entries().iter().collect();
    entries.sort_by(|a, b| a.raw_key().cmp(b.raw_key()));
    hasher.update((entries.len() as u64).to_le_bytes());
    for entry in entries {
        hasher.update([tag::TEMPLATE_ENTRY]);
        hash_str(hasher, entry.raw_key());
        hash_rule(hasher, entry.rule());
    }
}
