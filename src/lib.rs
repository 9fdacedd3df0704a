//! # Remold
//!
//! **Declarative object reshaping with memoized template transformers**
//!
//! A template maps output keys to rules describing how to derive each value
//! from an input item. Compiling a template yields a reusable transformer;
//! both the transformer (per template content) and its outputs (per item
//! content) are memoized, so repeated work on structurally identical inputs
//! is never recomputed.
//!
//! ## Quick Start
//!
//! ```rust
//! use remold::{Engine, Template, RemoldResult};
//! use serde_json::json;
//!
//! fn main() -> RemoldResult<()> {
//!     let engine = Engine::new();
//!
//!     let template = Template::from_value(json!({
//!         "name": "user.name",
//!         "raw": "=item",
//!     }))?;
//!
//!     let item = json!({"user": {"name": "Bob"}});
//!     let output = engine.transform_item(&template, None, &item)?;
//!
//!     assert_eq!(output.get("name"), Some(&json!("Bob")));
//!     assert_eq!(output.get("raw"), Some(&item));
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rules
//! A rule derives one output field from the item: a literal value, a
//! dotted property path (`user.name`, or `.id` for a top-level field), the
//! `=item` sentinel for the whole item, a caller-supplied named function,
//! or a nested template that flattens into a merged value.
//!
//! ### Keys
//! Output keys are resolved per item too: a key written as a path derives
//! from item content, so an item's own id can name its output entry. Keys
//! can never be functions.
//!
//! ### Caching
//! Identity is structural, not referential: templates and items are
//! fingerprinted by canonical content hash, so two separately built but
//! identical inputs hit the same cache entry, and repeat transformations
//! return the cache-identical output. Rules are assumed pure: a function
//! rule's result is frozen on its first call for a given item content.

pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fingerprint;
pub mod limits;
pub mod path;
pub mod template;
pub mod transformer;

pub use cache::MemoCache;
pub use engine::{CacheStats, Engine};
pub use error::RemoldError;
pub use fingerprint::Fingerprint;
pub use limits::Limits;
pub use path::PropertyPath;
pub use template::{Rule, RuleFn, Template, TemplateEntry, WHOLE_ITEM_SENTINEL};
pub use transformer::{Transformer, Transforms};

/// Result type for remold operations
pub type RemoldResult<T> = Result<T, RemoldError>;

#[cfg(test)]
mod tests;
