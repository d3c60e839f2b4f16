//! Tool-name pattern matching.
//!
//! Patterns are shell globs restricted to two wildcards: `*` matches any run
//! of characters (including none) and `?` matches exactly one. Every other
//! character is literal, brackets and braces included, so `report[v2]`
//! matches only the tool named `report[v2]`. Matching is case-sensitive and
//! covers the whole name.

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::warn;

/// True iff `name` matches at least one of `patterns`.
///
/// Compiles on every call; use [`PatternSet`] when the same list is matched
/// repeatedly. Never errors: a pattern that fails to compile matches nothing.
pub fn matches<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .filter_map(|p| compile(p.as_ref()))
        .any(|m| m.is_match(name))
}

/// A list of patterns compiled once.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PatternSet {
    /// Compile `patterns`. Patterns that fail to compile are logged and skipped.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match build(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                    kept.push(pattern.to_string());
                }
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "failed to compile tool pattern");
                }
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "failed to build tool pattern set");
            GlobSet::empty()
        });
        Self { patterns: kept, set }
    }

    pub fn empty() -> Self {
        Self { patterns: Vec::new(), set: GlobSet::empty() }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    /// The patterns that compiled, in their original order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}

fn compile(pattern: &str) -> Option<GlobMatcher> {
    match build(pattern) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "failed to compile tool pattern");
            None
        }
    }
}

fn build(pattern: &str) -> Result<globset::Glob, globset::Error> {
    GlobBuilder::new(&escape(pattern))
        .case_insensitive(false)
        .literal_separator(false)
        .backslash_escape(true)
        .build()
}

/// Escape everything but `*` and `?`. Runs of `*` collapse to one, since
/// globset gives `**` path meaning and a tool name has no path.
fn escape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut prev_star = false;
    for c in pattern.chars() {
        match c {
            '*' if prev_star => continue,
            '[' | ']' | '{' | '}' | '\\' => out.push('\\'),
            _ => {}
        }
        prev_star = c == '*';
        out.push(c);
    }
    out
}
