//! The transformation engine
//!
//! An `Engine` is an explicit, caller-owned context: it holds every cache
//! tier (compiled transformers by template content, batch results by full
//! argument content, and the engine-wide rule evaluation caches) and
//! exposes the public operations. Engines share nothing with each other.

use crate::cache::MemoCache;
use crate::error::RemoldError;
use crate::evaluator::context::EvalCaches;
use crate::fingerprint::{domain, Fingerprint};
use crate::limits::Limits;
use crate::template::Template;
use crate::transformer::{Transformer, Transforms};
use crate::RemoldResult;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Cached result of a batch operation
#[derive(Debug, Clone)]
enum BatchOutput {
    Sequence(Vec<Rc<Value>>),
    Merged(Rc<Value>),
}

/// Entry counts for every cache tier
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Compiled transformers, by template content
    pub templates: usize,
    /// Memoized sequence and merged batch results
    pub batches: usize,
    /// Memoized rule-value evaluations
    pub values: usize,
    /// Memoized key/value entry evaluations
    pub entries: usize,
}

/// The transformation engine
///
/// Single-threaded by design: state lives behind `Rc`/`RefCell` and the
/// engine is deliberately not `Send` or `Sync`. A host with real
/// parallelism must wrap the engine in its own exclusion.
pub struct Engine {
    templates: RefCell<MemoCache<Transformer>>,
    batches: RefCell<MemoCache<BatchOutput>>,
    evals: Rc<RefCell<EvalCaches>>,
    limits: Limits,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            templates: RefCell::new(MemoCache::new()),
            batches: RefCell::new(MemoCache::new()),
            evals: Rc::new(RefCell::new(EvalCaches::default())),
            limits: Limits::default(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom compile-time limits
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Get the current limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Compile a template into a reusable transformer
    ///
    /// Transformers are cached by template content: compiling a
    /// structurally identical template again returns the existing
    /// transformer, including its original transforms. Transforms are
    /// fixed by the first compilation and are not part of the cache key.
    pub fn compile(
        &self,
        template: &Template,
        transforms: Option<Transforms>,
    ) -> RemoldResult<Transformer> {
        self.check_limits(template)?;
        let fp = template.fingerprint();
        if let Some(hit) = self.templates.borrow().get(&fp) {
            trace!("template cache hit for {}", fp);
            return Ok(hit.clone());
        }

        let transformer = Transformer::new(
            template.clone(),
            fp,
            transforms.unwrap_or_default(),
            Rc::clone(&self.evals),
        );
        self.templates.borrow_mut().insert(fp, transformer.clone());
        debug!("compiled transformer for template {}", fp);
        Ok(transformer)
    }

    /// Transform one item
    ///
    /// The output for a given (template, item) content pair is computed at
    /// most once; repeat calls return the cache-identical `Rc`.
    pub fn transform_item(
        &self,
        template: &Template,
        transforms: Option<Transforms>,
        item: &Value,
    ) -> RemoldResult<Rc<Value>> {
        self.compile(template, transforms)?.apply(item)
    }

    /// Transform every item of a sequence
    ///
    /// Compiles once, then maps over the items; the result preserves
    /// length and order. The whole operation is memoized by its full
    /// argument content.
    pub fn transform_sequence(
        &self,
        template: &Template,
        transforms: Option<Transforms>,
        items: &[Value],
    ) -> RemoldResult<Vec<Rc<Value>>> {
        let transformer = self.compile(template, transforms)?;
        let fp = batch_fingerprint(domain::SEQUENCE, transformer.fingerprint(), items);
        if let Some(BatchOutput::Sequence(hit)) = self.batches.borrow().get(&fp) {
            return Ok(hit.clone());
        }

        let outputs = items
            .iter()
            .map(|item| transformer.apply(item))
            .collect::<RemoldResult<Vec<_>>>()?;
        self.batches
            .borrow_mut()
            .insert(fp, BatchOutput::Sequence(outputs.clone()));
        Ok(outputs)
    }

    /// Transform a sequence and fold the outputs into one object
    ///
    /// Shallow merge in sequence order; later items' keys win on
    /// collision. An empty sequence folds to an empty object. Useful for
    /// building lookup maps when the template's key is a path into each
    /// item.
    pub fn transform_merged(
        &self,
        template: &Template,
        transforms: Option<Transforms>,
        items: &[Value],
    ) -> RemoldResult<Rc<Value>> {
        let transformer = self.compile(template, transforms)?;
        let fp = batch_fingerprint(domain::MERGED, transformer.fingerprint(), items);
        if let Some(BatchOutput::Merged(hit)) = self.batches.borrow().get(&fp) {
            return Ok(Rc::clone(hit));
        }

        let mut merged = Map::new();
        for item in items {
            let output = transformer.apply(item)?;
            if let Value::Object(fields) = output.as_ref() {
                for (key, value) in fields {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }

        let merged = Rc::new(Value::Object(merged));
        self.batches
            .borrow_mut()
            .insert(fp, BatchOutput::Merged(Rc::clone(&merged)));
        Ok(merged)
    }

    /// Drop the compiled transformer (and its item cache) for a template
    ///
    /// Returns whether a transformer was present. Batch results and
    /// evaluation caches keep their entries until [`Engine::clear`].
    pub fn remove_template(&self, template: &Template) -> bool {
        self.templates
            .borrow_mut()
            .remove(&template.fingerprint())
            .is_some()
    }

    /// Drop every cached transformer, batch result, and evaluation
    pub fn clear(&self) {
        self.templates.borrow_mut().clear();
        self.batches.borrow_mut().clear();
        let mut evals = self.evals.borrow_mut();
        evals.values.clear();
        evals.entries.clear();
    }

    /// Entry counts for every cache tier
    pub fn cache_stats(&self) -> CacheStats {
        let evals = self.evals.borrow();
        CacheStats {
            templates: self.templates.borrow().len(),
            batches: self.batches.borrow().len(),
            values: evals.values.len(),
            entries: evals.entries.len(),
        }
    }

    fn check_limits(&self, template: &Template) -> RemoldResult<()> {
        let depth = template.depth();
        if depth > self.limits.max_template_depth {
            return Err(RemoldError::LimitExceeded {
                limit_name: "max_template_depth".to_string(),
                limit_value: self.limits.max_template_depth,
                actual_value: depth,
                suggestion: "flatten the template or raise the limit via Engine::with_limits"
                    .to_string(),
            });
        }
        let segments = template.max_path_segments();
        if segments > self.limits.max_path_segments {
            return Err(RemoldError::LimitExceeded {
                limit_name: "max_path_segments".to_string(),
                limit_value: self.limits.max_path_segments,
                actual_value: segments,
                suggestion: "shorten property paths or raise the limit via Engine::with_limits"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Key for a batch operation: template identity plus every item's identity
fn batch_fingerprint(domain: u8, template_fp: Fingerprint, items: &[Value]) -> Fingerprint {
    let mut parts = Vec::with_capacity(items.len() + 1);
    parts.push(template_fp);
    parts.extend(items.iter().map(Fingerprint::of_value));
    Fingerprint::combine(domain, &parts)
}
