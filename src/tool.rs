//! Load-command listing and rewriting through the system tools.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::trace;

use crate::analyze::get_dylib_dependencies;

/// The three load-command operations the copier and checker need.
///
/// Every operation works on the file in place and blocks until the
/// underlying tool has finished.
pub trait LoadCommandTool {
    /// List the dylib references recorded in `binary`, in load-command order.
    fn list_dylibs(&self, binary: &Path) -> Result<Vec<String>>;

    /// Set the `LC_ID_DYLIB` of `dylib` to `id`.
    fn set_install_id(&self, dylib: &Path, id: &str) -> Result<()>;

    /// Replace the reference `old` in `binary` with `new`.
    fn change_install_name(&self, binary: &Path, old: &str, new: &str) -> Result<()>;
}

/// `otool` / `install_name_tool` / `codesign` as found on the host.
#[derive(Debug, Clone)]
pub struct SystemTools {
    pub otool: PathBuf,
    pub install_name_tool: PathBuf,
    pub codesign: PathBuf,
    /// Re-sign every file `install_name_tool` touched with an ad-hoc signature.
    pub adhoc_sign: bool,
}

impl Default for SystemTools {
    fn default() -> Self {
        Self {
            otool: PathBuf::from("otool"),
            install_name_tool: PathBuf::from("install_name_tool"),
            codesign: PathBuf::from("codesign"),
            adhoc_sign: false,
        }
    }
}

impl SystemTools {
    fn rewrite(&self, args: &[&str], path: &Path) -> Result<()> {
        trace!(
            "{} {} {}",
            self.install_name_tool.display(),
            args.join(" "),
            path.display()
        );
        run_tool(&self.install_name_tool, args, path)?;
        if self.adhoc_sign {
            self.sign_adhoc(path)?;
        }
        Ok(())
    }

    /// Modifying a Mach-O file invalidates its signature, which Apple Silicon
    /// refuses to load. `--force` replaces whatever signature is present.
    fn sign_adhoc(&self, path: &Path) -> Result<()> {
        trace!("Applying ad-hoc code signature to {}", path.display());
        run_tool(&self.codesign, &["--force", "--sign", "-"], path)
    }
}

impl LoadCommandTool for SystemTools {
    fn list_dylibs(&self, binary: &Path) -> Result<Vec<String>> {
        get_dylib_dependencies(&self.otool, binary)
    }

    fn set_install_id(&self, dylib: &Path, id: &str) -> Result<()> {
        self.rewrite(&["-id", id], dylib)
    }

    fn change_install_name(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        self.rewrite(&["-change", old, new], binary)
    }
}

fn run_tool(program: &Path, args: &[&str], path: &Path) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run {}", program.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} {} failed on {}: {}",
            program.display(),
            args.join(" "),
            path.display(),
            stderr.trim()
        );
    }

    Ok(())
}
