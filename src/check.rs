//! Verification that a binary's in-scope dependencies are bundled.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::filter::DylibFilter;
use crate::paths::resolve_dylib_path;
use crate::tool::LoadCommandTool;

/// An in-scope dependency that is missing on disk or matches an invalid pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub binary: PathBuf,
    /// The reference after `@loader_path`/`@rpath` resolution.
    pub resolved: String,
    /// The reference as recorded in the load command.
    pub original: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {} depends {}", self.binary.display(), self.resolved)?;
        if self.resolved != self.original {
            write!(f, " ({})", self.original)?;
        }
        Ok(())
    }
}

/// Check every in-scope dependency of `binary`.
///
/// A dependency is a violation if it matches an invalid pattern or does not
/// exist. An invalid match is reported even when the file exists.
///
/// Returns the violations in load-command order; an empty list means the
/// binary passes. Only listing failures are errors.
pub fn check_dependencies<T: LoadCommandTool>(
    tool: &T,
    filter: &DylibFilter,
    binary: &Path,
) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();

    for original in tool.list_dylibs(binary)? {
        let resolved = resolve_dylib_path(&original, binary);
        if !filter.is_included(&resolved) {
            continue;
        }

        if filter.is_invalid(&resolved) || !Path::new(&resolved).exists() {
            debug!("{}: Bad dependency {}", binary.display(), resolved);
            violations.push(Violation {
                binary: binary.to_path_buf(),
                resolved,
                original,
            });
        }
    }

    Ok(violations)
}
