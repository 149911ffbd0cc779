//! Include/exclude/invalid regex filtering of resolved dylib paths.

use anyhow::{Context, Result};
use regex::Regex;

/// Decides which dylib paths are in scope and which are forbidden.
///
/// Every pattern matches from the start of the path, like a prefix match: `/usr/lib/`
/// matches `/usr/lib/libSystem.B.dylib`, `libSystem` does not.
#[derive(Debug, Clone, Default)]
pub struct DylibFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    invalid: Vec<Regex>,
}

impl DylibFilter {
    /// Compile the three pattern lists.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pattern that is not a valid regex.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S], invalid: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile_all(include, "--include-regex")?,
            exclude: compile_all(exclude, "--exclude-regex")?,
            invalid: compile_all(invalid, "--check-invalid-regex")?,
        })
    }

    /// Whether `path` should be copied or checked.
    ///
    /// Exclusion wins over inclusion. With no include patterns everything
    /// not excluded is in scope.
    pub fn is_included(&self, path: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(path)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(path))
    }

    /// Whether `path` must never be depended on, even if it exists.
    pub fn is_invalid(&self, path: &str) -> bool {
        self.invalid.iter().any(|re| re.is_match(path))
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S], flag: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            // `is_match` searches anywhere; anchor so the pattern must match at offset 0
            Regex::new(&format!("^(?:{pattern})"))
                .with_context(|| format!("Invalid {flag} pattern: {pattern}"))
        })
        .collect()
}
