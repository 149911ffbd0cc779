//! Dylib copying and load-command rewriting.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::filter::DylibFilter;
use crate::paths::{loader_relative_path, resolve_dylib_path};
use crate::tool::LoadCommandTool;

/// Add the owner-write bit (u+w) to a file.
///
/// Package managers install dylibs read-only, and `install_name_tool`
/// rewrites in place.
pub fn make_writable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?
        .permissions();
    perms.set_mode(perms.mode() | 0o200);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    Ok(())
}

/// Copies in-scope dylib dependencies into one directory and points the
/// referencing binaries at the copies.
///
/// What is already in `libdir` counts as copied, including files left by
/// an earlier run. That existence check is also what stops the recursion on
/// cycles and shared dependencies.
pub struct DependencyCopier<'a, T: LoadCommandTool> {
    tool: &'a T,
    filter: &'a DylibFilter,
    libdir: PathBuf,
}

impl<'a, T: LoadCommandTool> DependencyCopier<'a, T> {
    /// Create the copier, creating `libdir` (and parents) if needed.
    pub fn new(tool: &'a T, filter: &'a DylibFilter, libdir: impl Into<PathBuf>) -> Result<Self> {
        let libdir = libdir.into();
        fs::create_dir_all(&libdir)
            .with_context(|| format!("Failed to create libdir: {}", libdir.display()))?;
        Ok(Self {
            tool,
            filter,
            libdir,
        })
    }

    /// The directory copies are placed in.
    pub fn libdir(&self) -> &Path {
        &self.libdir
    }

    /// Bundle the dependencies of `binary`, rewriting it in place.
    ///
    /// Stops at the first failing tool invocation; copies made before that
    /// stay in `libdir`.
    pub fn copy_dependencies(&self, binary: &Path) -> Result<()> {
        self.copy_from(binary, None)
    }

    /// `source` is where `binary` originally lived when it is itself a copy,
    /// so its `@loader_path`/`@rpath` references resolve against the
    /// original location rather than `libdir`.
    fn copy_from(&self, binary: &Path, source: Option<&Path>) -> Result<()> {
        let libs = self.tool.list_dylibs(binary)?;
        let referrer = source.unwrap_or(binary);

        for reference in libs {
            let lib = resolve_dylib_path(&reference, referrer);
            if !self.filter.is_included(&lib) {
                debug!("{}: Skipping {}", binary.display(), lib);
                continue;
            }

            info!("{}: Copying {}", binary.display(), lib);

            let name = Path::new(&lib)
                .file_name()
                .with_context(|| format!("Dependency has no file name: {lib}"))?;
            let dest = self.libdir.join(name);

            if !dest.exists() {
                // fs::copy follows symlinks, so the real file content lands in libdir
                fs::copy(&lib, &dest).with_context(|| {
                    format!("Failed to copy {} to {}", lib, dest.display())
                })?;
                make_writable(&dest)?;
                self.tool.set_install_id(
                    &dest,
                    &format!("@loader_path/{}", name.to_string_lossy()),
                )?;
                self.copy_from(&dest, Some(Path::new(&lib)))?;
            }

            let new_name = loader_relative_path(&dest, binary)?;
            self.tool
                .change_install_name(binary, &reference, &new_name)?;
        }

        Ok(())
    }
}
