//! macOS dylib bundling utilities.
//!
//! Uses `otool -L` to list the libraries a Mach-O binary links against and
//! `install_name_tool` to point those references at copies placed in a
//! bundle directory. Binary parsing and linking stay with the system tools;
//! this crate only decides which references to touch and where copies go.

mod analyze;
mod check;
mod copy;
mod filter;
mod paths;
mod tool;

pub use analyze::{get_dylib_dependencies, parse_otool_output};
pub use check::{check_dependencies, Violation};
pub use copy::{make_writable, DependencyCopier};
pub use filter::DylibFilter;
pub use paths::{loader_relative_path, resolve_dylib_path};
pub use tool::{LoadCommandTool, SystemTools};
