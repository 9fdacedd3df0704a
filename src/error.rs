use thiserror::Error;

/// Error types for the remold engine
///
/// Evaluation itself is non-validating: missing paths degrade to `Null`
/// rather than failing. Errors surface only from template construction,
/// compile-time limit checks, and caller-supplied function rules.
#[derive(Debug, Clone, Error)]
pub enum RemoldError {
    /// Template construction was handed something other than a JSON object
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// A caller-supplied function rule failed
    ///
    /// Propagated unmodified to the caller; nothing is cached for the
    /// failing invocation.
    #[error("function rule '{name}' failed: {message}")]
    FunctionRule { name: String, message: String },

    /// A compile-time resource limit was exceeded
    #[error("resource limit exceeded: {limit_name} is {actual_value}, limit is {limit_value} ({suggestion})")]
    LimitExceeded {
        limit_name: String,
        limit_value: usize,
        actual_value: usize,
        suggestion: String,
    },

    /// Engine error without a more specific kind
    #[error("engine error: {0}")]
    Engine(String),
}

impl RemoldError {
    /// Create a function-rule error carrying the rule's name
    pub fn function_rule(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionRule {
            name: name.into(),
            message: message.into(),
        }
    }
}
