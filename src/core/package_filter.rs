//! Package-time file filters
//!
//! Shell-style wildcard patterns (`*.o`, `lib/*.a`, `lib[ab].a`) used by copy
//! rules and by the light orchestration path that keeps intermediate build
//! artifacts out of natively multi-arch packages.

use glob::{Pattern, PatternError};

use crate::core::context::BuildContext;

/// A compiled wildcard pattern
///
/// Patterns without `/` match the file name; patterns containing `/` match
/// the whole relative path. `*` also crosses `/` in path patterns.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: Pattern,
    match_path: bool,
}

impl WildcardPattern {
    /// Compile `pattern`
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
            match_path: pattern.contains('/'),
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether `rel_path` (relative, `/`-separated) matches
    pub fn matches(&self, rel_path: &str) -> bool {
        if self.match_path {
            return self.pattern.matches(rel_path);
        }
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        self.pattern.matches(name)
    }
}

/// Compile a list of patterns, skipping invalid ones with a warning
pub fn compile_all(patterns: &[String]) -> Vec<WildcardPattern> {
    patterns
        .iter()
        .filter_map(|p| match WildcardPattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("Ignoring invalid pattern '{p}': {e}");
                None
            }
        })
        .collect()
}

/// Whether any of `patterns` matches `rel_path`
pub fn is_excluded(patterns: &[WildcardPattern], rel_path: &str) -> bool {
    patterns.iter().any(|p| p.matches(rel_path))
}

/// Context whose package copies skip `patterns`
///
/// The returned context is a plain clone: settings, folders and the recipe
/// are unchanged, only its copier gains the extra excludes.
pub fn filtered_context(ctx: &BuildContext, patterns: &[String]) -> BuildContext {
    ctx.output()
        .debug(format!("Excluding from package: {}", patterns.join(", ")));
    ctx.with_package_excludes(patterns)
}
