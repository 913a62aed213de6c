//! orgpolicy: org-wide coding policy checker.
//!
//! Verifies that a repository carries the enterprise coding principles guide,
//! that the guide names every principle, and that the repository attests to
//! each principle in a machine-readable compliance manifest. On top of that,
//! `check` enforces the mechanically checkable subset of the principles:
//! document structure, banned placeholder markers and import placement.
//!
//! # Examples
//!
//! ```bash
//! # Scaffold guide, manifest and config
//! orgpolicy init --project my-service
//!
//! # CI gate: guide + manifest only
//! orgpolicy verify --json
//!
//! # Every gate, aggregated
//! orgpolicy check
//! ```
//!
//! # Exit codes
//!
//! - `0`: OK
//! - `2`: policy violations
//! - `1`: unexpected error (I/O, invalid JSON, invalid config, usage)
//!
//! # Crate Structure
//!
//! - [`core`]: parsing, gates, configuration and reporting

pub mod core;

use crate::core::{
    config::PolicyConfig,
    error::{self, EXIT_ERROR, EXIT_OK},
    guide, output, scaffold,
    validate::{self, CheckOptions, Gate},
};

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ORGPOLICY_LOG";

#[derive(Parser, Debug)]
#[clap(
    name = "orgpolicy",
    version = env!("CARGO_PKG_VERSION"),
    about = "Verify the enterprise coding principles guide, the compliance manifest, and mechanical policy rules"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). ORGPOLICY_LOG overrides.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Repository root to check (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
    /// Optional explicit path to MULTI_DOCUMENT_ENTERPRISE_CODING_PRINCIPLES_GUIDE.md
    #[clap(long)]
    guide: Option<String>,
    /// Emit a machine-readable JSON result on success or failure.
    #[clap(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct CheckCli {
    #[clap(flatten)]
    target: TargetArgs,
    /// Config file (defaults to <dir>/.orgpolicy.toml when present).
    #[clap(long)]
    config: Option<PathBuf>,
    /// Gate to skip; repeatable.
    #[clap(long, value_enum)]
    skip: Vec<Gate>,
    /// Omit volatile fields (check_id) from JSON output.
    #[clap(long)]
    deterministic: bool,
}

#[derive(clap::Args, Debug)]
struct InitCli {
    /// Directory to initialize (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
    /// Overwrite existing files.
    #[clap(long)]
    force: bool,
    /// Show what would change without writing files.
    #[clap(long)]
    dry_run: bool,
    /// Project name for the compliance manifest (defaults to the directory name).
    #[clap(long)]
    project: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify guide presence, guide anchors and the compliance manifest.
    Verify(TargetArgs),
    /// Run every policy gate and report all violations.
    Check(CheckCli),
    /// List the principles defined in the guide.
    Principles(TargetArgs),
    /// Scaffold the guide, compliance manifest and config.
    Init(InitCli),
    /// Print the version.
    Version,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf, error::PolicyError> {
    match dir {
        Some(d) => Ok(d),
        None => Ok(std::env::current_dir()?),
    }
}

fn run_verify(args: TargetArgs) -> Result<i32, error::PolicyError> {
    let root = resolve_dir(args.dir)?;
    let config = PolicyConfig::load(&root, None)?;
    let outcome = validate::run_verify(&root, args.guide.as_deref(), &config);
    output::emit_verify(&outcome, args.json, &mut io::stdout(), &mut io::stderr())?;
    Ok(outcome.exit_code())
}

fn run_check(cli: CheckCli) -> Result<i32, error::PolicyError> {
    let root = resolve_dir(cli.target.dir)?;
    let config = PolicyConfig::load(&root, cli.config.as_deref())?;
    let opts = CheckOptions {
        root,
        guide: cli.target.guide,
        config,
        skip: cli.skip,
        deterministic: cli.deterministic,
    };
    let report = validate::run_check(&opts)?;

    let mut stdout = io::stdout();
    if cli.target.json {
        writeln!(stdout, "{}", output::render_json(&report, true)?)?;
    } else {
        write!(stdout, "{}", output::render_check_text(&report))?;
    }
    Ok(report.exit_code())
}

fn run_principles(args: TargetArgs) -> Result<i32, error::PolicyError> {
    let root = resolve_dir(args.dir)?;
    let config = PolicyConfig::load(&root, None)?;
    let Some(rel) = guide::find_guide(&root, args.guide.as_deref(), &config.guide.paths) else {
        return Err(error::PolicyError::NotFound(guide::not_found_message(
            args.guide.as_deref(),
            &config.guide.paths,
        )));
    };
    let doc = guide::read_guide(&root, &rel)?;
    let principles = guide::list_principles(&doc.text);

    let mut stdout = io::stdout();
    if args.json {
        writeln!(stdout, "{}", output::render_json(&principles, true)?)?;
    } else {
        write!(stdout, "{}", output::render_principles_text(&doc.path, &principles))?;
    }
    Ok(EXIT_OK)
}

fn default_project_name(dir: &Path) -> String {
    std::fs::canonicalize(dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string())
}

fn run_init(cli: InitCli) -> Result<i32, error::PolicyError> {
    let target_dir = resolve_dir(cli.dir)?;
    let project = cli
        .project
        .unwrap_or_else(|| default_project_name(&target_dir));
    let opts = scaffold::ScaffoldOptions {
        target_dir,
        project,
        run_id: ulid::Ulid::new().to_string(),
        force: cli.force,
        dry_run: cli.dry_run,
    };
    scaffold::scaffold_policy(&opts)?;
    if !opts.dry_run {
        println!("Attest each principle in policy/compliance.json, then run `orgpolicy check`.");
    }
    Ok(EXIT_OK)
}

/// Parse arguments, dispatch, and return the process exit code.
pub fn run() -> Result<i32, error::PolicyError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(if e.use_stderr() { EXIT_ERROR } else { EXIT_OK });
        }
    };
    init_logging(cli.verbose);

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_OK)
        }
        Command::Verify(args) => run_verify(args),
        Command::Check(check) => run_check(check),
        Command::Principles(args) => run_principles(args),
        Command::Init(init) => run_init(init),
    }
}
