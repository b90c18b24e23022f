//! Result exports: JSON for analysis results, SVG for diagnostic figures.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::AnalysisResult;
use crate::error::AppError;
use crate::plot::DiagnosticFigure;

/// Pretty JSON for any serializable result. Non-finite numbers become `null`.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::io(format!("Failed to serialize result: {e}")))
}

pub fn write_result_json(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    write_text(path, &to_json(result)?)?;
    info!(path = %path.display(), test = %result.test_name, "result exported");
    Ok(())
}

/// Several results as one JSON array.
pub fn write_results_json(path: &Path, results: &[AnalysisResult]) -> Result<(), AppError> {
    write_text(path, &to_json(results)?)?;
    info!(path = %path.display(), count = results.len(), "results exported");
    Ok(())
}

pub fn write_figure_svg(path: &Path, figure: &DiagnosticFigure, width: u32, height: u32) -> Result<(), AppError> {
    let svg = figure.to_svg(width, height)?;
    write_text(path, &svg)?;
    info!(path = %path.display(), "figure exported");
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    fs::write(path, text).map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::evaluate_fit;

    #[test]
    fn undefined_statistics_serialize_as_null() {
        let stats = evaluate_fit(&[1.0], &[1.0], Some(1));
        let json = to_json(&stats).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["Adjusted_R_squared"].is_null());
        assert_eq!(value["num_data"], 1);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let err = write_text(Path::new("/nonexistent-dir/out.json"), "{}").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
