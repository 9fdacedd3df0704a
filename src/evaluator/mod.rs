//! Rule evaluation
//!
//! Resolves rules against items:
//! 1. Dispatch on the rule variant (classified at template construction)
//! 2. Nested templates flatten recursively into one merged value
//! 3. Entry keys resolve through the same value resolution, then stringify
//! 4. Results are memoized engine-wide by content identity

pub mod context;

use crate::fingerprint::{domain, Fingerprint};
use crate::template::Rule;
use crate::RemoldResult;
use context::EvalContext;
use serde_json::{Map, Value};

/// Resolve a rule to its value for the context item
///
/// Mappings written in the template (nested rules) flatten into a merged
/// object; mappings fetched from the item via paths or the whole-item
/// sentinel are returned as data, untouched.
pub(crate) fn evaluate_value(rule: &Rule, ctx: &EvalContext) -> RemoldResult<Value> {
    let fp = Fingerprint::combine(domain::VALUE, &[rule.fingerprint(), ctx.item_fp]);
    if let Some(hit) = ctx.caches.borrow().values.get(&fp) {
        return Ok(hit.clone());
    }

    let value = match rule {
        Rule::Literal(value) => value.clone(),
        Rule::Path(path) => path.resolve(ctx.item).cloned().unwrap_or(Value::Null),
        Rule::WholeItem => ctx.item.clone(),
        Rule::Function(func) => func.call(ctx.item)?,
        Rule::Nested(template) => {
            let mut merged = Map::new();
            for entry in template.entries() {
                let (key, value) = evaluate_entry(entry.key_rule(), entry.rule(), ctx)?;
                // later keys overwrite earlier ones
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
    };

    ctx.caches.borrow_mut().values.insert(fp, value.clone());
    Ok(value)
}

/// Resolve one (key, rule) pair into its output entry
///
/// Function rules receive the raw item and bypass value resolution
/// entirely; the key always goes through value resolution, so a key
/// written as a path derives from item content. Keys can never be
/// functions.
pub(crate) fn evaluate_entry(
    key: &Rule,
    rule: &Rule,
    ctx: &EvalContext,
) -> RemoldResult<(String, Value)> {
    let fp = Fingerprint::combine(
        domain::ENTRY,
        &[key.fingerprint(), rule.fingerprint(), ctx.item_fp],
    );
    if let Some((cached_key, cached_value)) = ctx.caches.borrow().entries.get(&fp) {
        return Ok((cached_key.clone(), cached_value.clone()));
    }

    let value = match rule {
        Rule::Function(func) => func.call(ctx.item)?,
        _ => evaluate_value(rule, ctx)?,
    };
    let resolved_key = key_to_string(&evaluate_value(key, ctx)?);

    let entry = (resolved_key, value);
    ctx.caches.borrow_mut().entries.insert(fp, entry.clone());
    Ok(entry)
}

/// Stringify a resolved key for use as an output object key
///
/// Strings are used verbatim; everything else becomes its JSON text, so a
/// numeric key resolves to `"42"` and an absent one to `"null"`.
fn key_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
