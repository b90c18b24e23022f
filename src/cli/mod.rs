//! Command-line parsing for the slug-test analyzer.
//!
//! Argument parsing and command dispatch stay separate from the analysis
//! code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "slug", version, about = "Slug-test analysis (Bouwer-Rice 1976, Butler 2003)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze one test definition and print the estimated parameters.
    Analyze(AnalyzeArgs),
    /// Analyze several test definitions in parallel.
    Batch(BatchArgs),
    /// Analyze a synthetic demonstration scenario.
    Demo(DemoArgs),
}

/// Output options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Render the diagnostic figure in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 90)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,

    /// Write results as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Write diagnostic figures as SVG into this directory.
    #[arg(long = "svg-dir", value_name = "DIR")]
    pub svg_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Test definition (TOML).
    #[arg(value_name = "TEST")]
    pub definition: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Test definitions (TOML).
    #[arg(value_name = "TEST", required = true)]
    pub definitions: Vec<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Seed for the synthetic noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn batch_takes_many_definitions() {
        let cli = Cli::parse_from(["slug", "batch", "a.toml", "b.toml", "--json", "out.json"]);
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(args.definitions.len(), 2);
        assert_eq!(args.output.json, Some(PathBuf::from("out.json")));
        assert!(!args.output.plot);
    }
}
