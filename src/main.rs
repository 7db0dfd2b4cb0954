use anyhow::Result;
use clap::{Parser, Subcommand};
use classpath_graph::app::engine::ArtifactEngine;
use classpath_graph::cli;
use classpath_graph::config::EngineConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Classpath, keep-rule and class loader context inspection for Java module graphs
///
/// Examples:
///   cptool modules.json artifacts framework-foo
///   cptool modules.json classpath app-lib
///   cptool modules.json --allow-missing-deps clc app-lib
///   cptool modules.json --config cptool.json check
#[derive(Parser, Debug)]
#[command(name = "cptool")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Module declarations file (`{"modules": [...]}`)
    #[arg(value_name = "DECLARATIONS")]
    declarations: PathBuf,

    /// Engine configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Record undefined dependencies instead of failing the modules using them
    #[arg(long)]
    allow_missing_deps: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Published jars and transitive sets
    Artifacts { module: Option<String> },
    /// Compile, dex, boot and processor classpaths
    Classpath { module: Option<String> },
    /// Class loader context tree and its dex2oat encoding
    Clc { module: Option<String> },
    /// Report module errors; exits non-zero if there are any
    Check { module: Option<String> },
}

fn main() -> Result<ExitCode> {
    // stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.allow_missing_dependencies |= args.allow_missing_deps;

    let engine = ArtifactEngine::load_from_json(&args.declarations, config)?;

    match &args.command {
        Command::Artifacts { module } => cli::print_artifacts(&engine, module.as_deref())?,
        Command::Classpath { module } => cli::print_classpath(&engine, module.as_deref())?,
        Command::Clc { module } => cli::print_clc(&engine, module.as_deref())?,
        Command::Check { module } => {
            if !cli::run_check(&engine, module.as_deref())? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
