//! Command-line driver: list, check or bundle the dylib dependencies of binaries.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use dylib_bundler::{
    check_dependencies, DependencyCopier, DylibFilter, LoadCommandTool, SystemTools,
};

/// Copy dylib dependencies of macOS binaries into a bundle directory and
/// rewrite their load commands to `@loader_path` references.
#[derive(Parser, Debug)]
#[command(name = "dylib-bundler", version)]
struct Cli {
    /// Print the dylib references of each file and exit; filters are ignored.
    ///
    /// Repeated references, as in universal binaries, are printed once.
    #[arg(long)]
    list_dylib: bool,

    /// Use verbose output (repeat for more).
    ///
    /// Fine-grained logging can be configured with `RUST_LOG`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Check that in-scope dependencies exist and are not invalid instead of copying.
    #[arg(long)]
    check: bool,

    /// Directory receiving the copied dylibs; required unless listing or checking.
    #[arg(long, value_name = "DIR")]
    libdir: Option<PathBuf>,

    /// Only process dependencies matching this regex (from the start of the path).
    #[arg(long, value_name = "REGEX")]
    include_regex: Vec<String>,

    /// Never process dependencies matching this regex; wins over --include-regex.
    #[arg(long, value_name = "REGEX")]
    exclude_regex: Vec<String>,

    /// In check mode, report in-scope dependencies matching this regex even if they exist.
    #[arg(long, value_name = "REGEX")]
    check_invalid_regex: Vec<String>,

    /// Re-sign every rewritten file with an ad-hoc signature.
    #[arg(long)]
    adhoc_sign: bool,

    /// The `otool` executable.
    #[arg(long, env = "OTOOL", default_value = "otool", value_name = "PATH")]
    otool: PathBuf,

    /// The `install_name_tool` executable.
    #[arg(
        long,
        env = "INSTALL_NAME_TOOL",
        default_value = "install_name_tool",
        value_name = "PATH"
    )]
    install_name_tool: PathBuf,

    /// The `codesign` executable, used with --adhoc-sign.
    #[arg(long, env = "CODESIGN", default_value = "codesign", value_name = "PATH")]
    codesign: PathBuf,

    /// Mach-O binaries to process.
    files: Vec<PathBuf>,
}

/// Configure `tracing` on stderr from the `-v` count, letting `RUST_LOG` override it.
fn setup_logging(verbose: u8) -> Result<()> {
    let default_directive = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_directive.into())
        .from_env()
        .context("Invalid RUST_LOG directives")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let tools = SystemTools {
        otool: cli.otool,
        install_name_tool: cli.install_name_tool,
        codesign: cli.codesign,
        adhoc_sign: cli.adhoc_sign,
    };

    if cli.list_dylib {
        for file in &cli.files {
            for lib in tools.list_dylibs(file)? {
                println!("{lib}");
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let filter = DylibFilter::new(
        cli.include_regex.as_slice(),
        cli.exclude_regex.as_slice(),
        cli.check_invalid_regex.as_slice(),
    )?;

    if cli.check {
        let mut failed = false;
        for file in &cli.files {
            let violations = check_dependencies(&tools, &filter, file)?;
            for violation in &violations {
                println!("{violation}");
            }
            failed |= !violations.is_empty();
        }
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let Some(libdir) = cli.libdir else {
        bail!("--libdir has to be specified to copy dependent libraries");
    };
    let copier = DependencyCopier::new(&tools, &filter, libdir)?;
    for file in &cli.files {
        copier.copy_dependencies(file)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(cli.verbose) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
