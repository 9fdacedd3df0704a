//! Compiled template transformers
//!
//! A `Transformer` is the reusable product of compiling one template: it
//! owns the per-item output cache and the key/value transforms fixed at
//! compilation. Handles are cheap to clone and share state, so every
//! compilation of a content-identical template observes the same caches.

use crate::cache::MemoCache;
use crate::evaluator::context::{EvalCaches, EvalContext};
use crate::evaluator::evaluate_entry;
use crate::fingerprint::Fingerprint;
use crate::template::Template;
use crate::RemoldResult;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Optional post-processing applied to every resolved key and value
#[derive(Clone, Default)]
pub struct Transforms {
    key: Option<Rc<dyn Fn(String) -> String>>,
    value: Option<Rc<dyn Fn(Value) -> Value>>,
}

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post-process every resolved output key
    pub fn map_keys(mut self, f: impl Fn(String) -> String + 'static) -> Self {
        self.key = Some(Rc::new(f));
        self
    }

    /// Post-process every resolved output value
    pub fn map_values(mut self, f: impl Fn(Value) -> Value + 'static) -> Self {
        self.value = Some(Rc::new(f));
        self
    }

    pub(crate) fn apply_key(&self, key: String) -> String {
        match &self.key {
            Some(f) => f(key),
            None => key,
        }
    }

    pub(crate) fn apply_value(&self, value: Value) -> Value {
        match &self.value {
            Some(f) => f(value),
            None => value,
        }
    }
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transforms")
            .field("key", &self.key.is_some())
            .field("value", &self.value.is_some())
            .finish()
    }
}

/// A compiled template: maps items to outputs, caching per item content
///
/// Obtained from [`Engine::compile`](crate::Engine::compile). Clones share
/// the same item cache.
#[derive(Debug, Clone)]
pub struct Transformer {
    inner: Rc<TransformerInner>,
}

#[derive(Debug)]
struct TransformerInner {
    template: Template,
    template_fp: Fingerprint,
    transforms: Transforms,
    /// Item-tier cache: item content -> output
    items: RefCell<MemoCache<Rc<Value>>>,
    /// Engine-wide evaluation caches, shared across transformers
    evals: Rc<RefCell<EvalCaches>>,
}

impl Transformer {
    pub(crate) fn new(
        template: Template,
        template_fp: Fingerprint,
        transforms: Transforms,
        evals: Rc<RefCell<EvalCaches>>,
    ) -> Self {
        Self {
            inner: Rc::new(TransformerInner {
                template,
                template_fp,
                transforms,
                items: RefCell::new(MemoCache::new()),
                evals,
            }),
        }
    }

    /// The template this transformer was compiled from
    pub fn template(&self) -> &Template {
        &self.inner.template
    }

    /// Content identity of the source template
    pub fn fingerprint(&self) -> Fingerprint {
        self.inner.template_fp
    }

    /// Number of cached item outputs
    pub fn cached_items(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Transform one item
    ///
    /// The output for a given item content is computed at most once;
    /// repeat calls return the cache-identical `Rc`. A failing function
    /// rule propagates and leaves the cache unchanged.
    pub fn apply(&self, item: &Value) -> RemoldResult<Rc<Value>> {
        let item_fp = Fingerprint::of_value(item);
        if let Some(hit) = self.inner.items.borrow().get(&item_fp) {
            trace!("item cache hit under template {}", self.inner.template_fp);
            return Ok(Rc::clone(hit));
        }

        let ctx = EvalContext {
            item,
            item_fp,
            caches: &*self.inner.evals,
        };
        let mut output = Map::new();
        for entry in self.inner.template.entries() {
            let (key, value) = evaluate_entry(entry.key_rule(), entry.rule(), &ctx)?;
            let key = self.inner.transforms.apply_key(key);
            let value = self.inner.transforms.apply_value(value);
            output.insert(key, value);
        }

        let output = Rc::new(Value::Object(output));
        self.inner
            .items
            .borrow_mut()
            .insert(item_fp, Rc::clone(&output));
        debug!(
            "cached output for item {} under template {}",
            item_fp, self.inner.template_fp
        );
        Ok(output)
    }

    /// Explicitly drop the cached output for one item
    ///
    /// Returns whether an entry was present. The engine-wide evaluation
    /// caches are not touched.
    pub fn invalidate(&self, item: &Value) -> bool {
        let item_fp = Fingerprint::of_value(item);
        self.inner.items.borrow_mut().remove(&item_fp).is_some()
    }
}
