/// Compile-time resource limits for templates
///
/// Checked once when a template is compiled; evaluation itself performs no
/// checks. The defaults are far beyond any legitimate template while still
/// keeping recursion depth bounded.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting depth of a template (a flat template has depth 1)
    /// Real usage: ~3 levels, Limit: 64
    pub max_template_depth: usize,

    /// Maximum number of segments in any property path used by a template
    /// Real usage: ~4 segments, Limit: 64
    pub max_path_segments: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_template_depth: 64,
            max_path_segments: 64,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }
}
