//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging and maps errors to exit codes; this
//! module parses arguments, runs the pipelines and prints or exports results.

use std::fs;

use clap::Parser;

use crate::cli::{Command, OutputArgs};
use crate::domain::AnalysisResult;
use crate::error::AppError;

pub mod pipeline;

/// SVG figure size in pixels.
const SVG_SIZE: (u32, u32) = (800, 600);

/// Entry point for the `slug` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Analyze(args) => {
            let result = pipeline::run_definition(&args.definition)?;
            emit(&[result], &args.output)
        }
        Command::Batch(args) => {
            let outcomes = pipeline::run_batch_files(&args.definitions)?;
            println!("{}", crate::report::format_batch_summary(&outcomes));
            let results: Vec<AnalysisResult> = outcomes.into_iter().filter_map(|o| o.result.ok()).collect();
            emit(&results, &args.output)
        }
        Command::Demo(args) => {
            let tests = pipeline::demo_tests(args.seed)?;
            let outcomes = pipeline::run_batch(&tests)?;
            let mut results = Vec::with_capacity(outcomes.len());
            for o in outcomes {
                match o.result {
                    Ok(r) => results.push(r),
                    Err(e) => eprintln!("{}: {} error: {e}", o.name, e.kind().label()),
                }
            }
            emit(&results, &args.output)
        }
    }
}

/// Print each result, then write the optional exports.
fn emit(results: &[AnalysisResult], output: &OutputArgs) -> Result<(), AppError> {
    for r in results {
        r.print_estimated_parameters();
        if output.plot {
            println!("\n{}", r.figure.to_ascii(output.width, output.height));
        }
        println!();
    }

    if let Some(path) = &output.json {
        match results {
            [single] => crate::io::write_result_json(path, single)?,
            _ => crate::io::write_results_json(path, results)?,
        }
    }
    if let Some(dir) = &output.svg_dir {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;
        for r in results {
            let path = dir.join(format!("{}.svg", file_stem(&r.test_name)));
            crate::io::write_figure_svg(&path, &r.figure, SVG_SIZE.0, SVG_SIZE.1)?;
        }
    }
    Ok(())
}

/// Test name reduced to a safe file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "test".to_string() } else { stem }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_replaces_unsafe_characters() {
        assert_eq!(file_stem("MW-1 falling/head"), "MW-1_falling_head");
        assert_eq!(file_stem(""), "test");
    }
}
