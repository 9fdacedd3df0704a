//! Evaluation context for resolving rules against one item
//!
//! The caches are engine-wide: identical (rule, item) pairs are computed
//! once regardless of which template asked for them.

use crate::cache::MemoCache;
use crate::fingerprint::Fingerprint;
use serde_json::Value;
use std::cell::RefCell;

/// Engine-wide rule evaluation caches
#[derive(Debug, Default)]
pub struct EvalCaches {
    /// Memoized `evaluate_value` results keyed by (rule, item) content
    pub(crate) values: MemoCache<Value>,
    /// Memoized `evaluate_entry` results keyed by (key, rule, item) content
    pub(crate) entries: MemoCache<(String, Value)>,
}

/// Borrowed state for evaluating rules against one item
///
/// The item is never mutated. Cache borrows are taken briefly and never
/// held across a rule-function call, so function rules may safely call
/// back into the same engine.
pub(crate) struct EvalContext<'a> {
    pub(crate) item: &'a Value,
    /// Content identity of the item, computed once per application
    pub(crate) item_fp: Fingerprint,
    pub(crate) caches: &'a RefCell<EvalCaches>,
}
