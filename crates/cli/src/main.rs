mod report;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use mofc_core::{compile, CompileOptions, ReincludePolicy, SourceRef};
use mofc_repository::InMemoryRepository;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use report::Unit;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// DMTF MOF compiler.
#[derive(Debug, Parser)]
#[command(name = "mofc", version, about = "DMTF MOF compiler")]
struct Cli {
    /// MOF files to compile; each one is a separate compilation unit
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Namespace in effect when each unit starts
    #[arg(short, long, default_value = "root/cimv2")]
    namespace: String,

    /// Directory searched for included files (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Keep going after semantic errors and report them all
    #[arg(long)]
    best_effort: bool,

    /// Compile a file again every time it is included
    #[arg(long)]
    recompile_includes: bool,

    /// Match qualifier scopes against the element's own kind only
    #[arg(long)]
    strict_scope: bool,

    /// Stop a unit once this many semantic errors have been seen
    #[arg(long, value_name = "N")]
    max_errors: Option<usize>,

    /// Print the compiled classes back as MOF
    #[arg(long)]
    emit_mof: bool,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long)]
    quiet: bool,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            best_effort: self.best_effort,
            reinclude: if self.recompile_includes {
                ReincludePolicy::Recompile
            } else {
                ReincludePolicy::Skip
            },
            strict_scope: self.strict_scope,
            max_errors: self.max_errors,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let repository = InMemoryRepository::new();
    let options = cli.options();
    let units: Vec<Unit> = cli
        .files
        .iter()
        .map(|file| {
            debug!(file = %file.display(), "compiling unit");
            let outcome = compile(
                SourceRef::File(file.clone()),
                &cli.namespace,
                &cli.include,
                &options,
                &repository,
            );
            Unit::new(file, outcome)
        })
        .collect();

    let ok = units.iter().all(Unit::succeeded);
    match cli.output {
        OutputFormat::Json => report::json(&units),
        OutputFormat::Text => report::text(&units, cli.emit_mof, cli.quiet),
    }
    if !ok {
        process::exit(1);
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "mofc=warn,mofc_core=warn,mofc_repository=warn",
        1 => "mofc=debug,mofc_core=info,mofc_repository=info",
        2 => "mofc=debug,mofc_core=debug,mofc_repository=debug",
        _ => "mofc=trace,mofc_core=trace,mofc_repository=trace",
    }
}
