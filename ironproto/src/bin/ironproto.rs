//! `ironproto` command-line interface.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ironproto_build::{DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR, NoopHost, ProtocolCompiler};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ironproto")]
#[command(version)]
#[command(about = "Compile protocol definitions into Rust sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, lower and generate every protocol under a source directory
    Compile(CompileArgs),

    /// Print the canonical form of one interface-definition file
    Lower(LowerArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// Directory containing .idl and .schema files
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    source_dir: PathBuf,

    /// Directory generated sources are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Include glob, relative to the source directory (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    includes: Vec<String>,

    /// Exclude glob, relative to the source directory (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Parent directory for the temporary run workspace
    #[arg(long)]
    workspace_root: Option<PathBuf>,
}

#[derive(Args)]
struct LowerArgs {
    /// Interface-definition file to lower
    file: PathBuf,

    /// Write the canonical form here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile(args) => compile(args),
        Commands::Lower(args) => lower(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compile(args: CompileArgs) -> Result<()> {
    let mut compiler = ProtocolCompiler::new(&args.source_dir, &args.output_dir);
    for pattern in args.includes {
        compiler = compiler.include(pattern);
    }
    for pattern in args.excludes {
        compiler = compiler.exclude(pattern);
    }
    if let Some(root) = args.workspace_root {
        compiler = compiler.workspace_root(root);
    }

    let report = compiler
        .run(&mut NoopHost)
        .with_context(|| format!("compiling protocols in {}", args.source_dir.display()))?;

    if report.is_empty() {
        info!("nothing to compile");
    } else {
        info!(
            compiled = report.compiled.len(),
            output = %args.output_dir.display(),
            "done"
        );
    }
    Ok(())
}

fn lower(args: LowerArgs) -> Result<()> {
    let protocol = ironproto_schema::parse_idl_file(&args.file)
        .with_context(|| format!("lowering {}", args.file.display()))?;
    let canonical = protocol.to_canonical_string();

    match args.output {
        Some(path) => std::fs::write(&path, canonical)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{canonical}"),
    }
    Ok(())
}
