//! Mach-O dependency listing using otool.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Extract dylib references from a Mach-O binary using `otool -L`.
///
/// `otool` is the program to run, usually just `"otool"` so it is looked up
/// on `PATH`.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - `otool` cannot be spawned (install the Xcode command line tools)
/// - `otool` exits non-zero
#[must_use = "dylib dependencies should be processed"]
pub fn get_dylib_dependencies(otool: &Path, binary_path: &Path) -> Result<Vec<String>> {
    // Check file exists first for a clear error message
    if !binary_path.exists() {
        bail!("File does not exist: {}", binary_path.display());
    }

    debug!("Listing dylibs of {}", binary_path.display());
    let output = Command::new(otool)
        .arg("-L")
        .arg(binary_path)
        .output()
        .with_context(|| {
            format!(
                "{} command not found - install the Xcode command line tools",
                otool.display()
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} -L failed on {}: {}",
            otool.display(),
            binary_path.display(),
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_otool_output(&stdout))
}

/// Parse `otool -L` output into dylib references, in load-command order.
///
/// Example otool output:
/// ```text
/// /usr/local/bin/app:
/// 	@rpath/libfoo.dylib (compatibility version 1.0.0, current version 1.2.0)
/// 	/usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1319.0.0)
/// ```
///
/// The first line names the binary itself and is dropped. Universal binaries
/// repeat a `<file> (architecture x86_64):` header per slice; those headers
/// are skipped and each reference is reported once.
pub fn parse_otool_output(output: &str) -> Vec<String> {
    let mut libs = Vec::new();
    let mut seen = HashSet::new();

    for line in output.lines().skip(1) {
        // Per-slice headers are the only unindented lines after the first
        if !line.starts_with(['\t', ' ']) && line.ends_with(':') {
            continue;
        }
        let lib = line
            .trim_start_matches(['\t', ' '])
            .split(' ')
            .next()
            .unwrap_or_default();
        if !lib.is_empty() && seen.insert(lib) {
            libs.push(lib.to_string());
        }
    }

    libs
}
