//! Integration tests against the real macOS toolchain.

#![cfg(target_os = "macos")]

use dylib_bundler::{check_dependencies, get_dylib_dependencies, DylibFilter, SystemTools};
use std::path::Path;

const NONE: &[&str] = &[];

#[test]
fn test_get_deps_of_real_binary() {
    // /bin/ls exists on every macOS install and links libSystem
    let deps = get_dylib_dependencies(Path::new("otool"), Path::new("/bin/ls")).unwrap();
    assert!(
        deps.iter().any(|d| d.contains("libSystem")),
        "Expected libSystem dependency in /bin/ls, got: {:?}",
        deps
    );
    // The self line is not a dependency
    assert!(!deps.iter().any(|d| d.starts_with("/bin/ls")));
}

#[test]
fn test_nonexistent_binary() {
    let result = get_dylib_dependencies(
        Path::new("otool"),
        Path::new("/nonexistent/path/to/binary"),
    );
    let err_msg = result.unwrap_err().to_string();
    assert!(
        err_msg.contains("does not exist"),
        "Expected 'does not exist' in error message, got: {}",
        err_msg
    );
}

#[test]
fn test_system_binary_passes_check_when_system_excluded() {
    let filter = DylibFilter::new(NONE, &["/usr/lib/", "/System/"], NONE).unwrap();
    let violations =
        check_dependencies(&SystemTools::default(), &filter, Path::new("/bin/ls")).unwrap();
    assert!(violations.is_empty(), "got: {violations:?}");
}
