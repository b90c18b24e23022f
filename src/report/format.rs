//! Formatted terminal output.
//!
//! Formatting lives here so the analysis code never prints and output
//! changes stay localized.

use crate::app::pipeline::TestOutcome;
use crate::domain::{AnalysisResult, MethodDetails};

/// Estimated parameters, fit statistics and method details for one result.
pub fn format_estimated_parameters(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let p = &result.estimated_parameters;

    out.push_str(&format!("=== {} ===\n", result.method.label()));
    out.push_str(&format!("Test: {}\n", result.test_name));
    out.push_str(&format!("Well: {}\n", result.well_name));
    out.push_str(&format!("Aquifer type: {}\n", result.aquifer_type));
    out.push_str(&format!(
        "Analyzed at: {}\n",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("\nEstimated parameters:\n");
    out.push_str(&format!(
        "- hydraulic conductivity: {} {}\n",
        fmt_sci(p.hydraulic_conductivity),
        p.conductivity_units()
    ));
    out.push_str(&format!(
        "- transmissivity        : {} {}\n",
        fmt_sci(p.transmissivity),
        p.transmissivity_units()
    ));

    out.push_str("\nRecovery:\n");
    out.push_str(&format!("- static level        : {:.4}\n", result.static_level));
    out.push_str(&format!("- initial displacement: {:.4}\n", result.initial_displacement));

    out.push_str("\nMethod details:\n");
    out.push_str(&format_details(&result.details));

    out.push_str("\nFit statistics:\n");
    out.push_str(&format!("{:<20} {:>14}\n", "statistic", "value"));
    out.push_str(format!("{:-<20} {:-<14}\n", "", "").trim_end());
    out.push('\n');
    for (label, value) in result.fitting_statistics.rows() {
        out.push_str(format!("{label:<20} {:>14}\n", fmt_stat(value)).trim_end());
        out.push('\n');
    }

    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &result.warnings {
            out.push_str(&format!("! {w}\n"));
        }
    }

    out
}

fn format_details(details: &MethodDetails) -> String {
    match details {
        MethodDetails::BouwerRice {
            t0,
            slope,
            intercept,
            ln_re_rw,
            effective_well_radius,
            d,
            b,
            full_penetration,
            window,
            window_points,
        } => {
            let mut out = String::new();
            out.push_str(&format!("- T0 (s)       : {t0:.4}\n"));
            out.push_str(&format!("- line         : ln(H/H0) = {intercept:.4} + ({slope:.4e}) t\n"));
            out.push_str(&format!("- ln(Re/rw)    : {ln_re_rw:.4}\n"));
            out.push_str(&format!("- r*w          : {effective_well_radius:.4}\n"));
            out.push_str(&format!("- d, b         : {d:.3}, {b:.3}\n"));
            if *full_penetration {
                out.push_str("- screen fully penetrates the aquifer\n");
            }
            out.push_str(&format!(
                "- fit window   : {:.2} <= |H/H0| <= {:.2} ({window_points} points)\n",
                window[0], window[1]
            ));
            out
        }
        MethodDetails::Butler {
            cd,
            mod_factor,
            regime,
            fit_mode,
            effective_casing_radius,
            effective_column_length,
            ln_v7,
            ln_re_rw,
            k_confined,
            k_unconfined,
        } => {
            let mut out = String::new();
            out.push_str(&format!("- Cd           : {cd:.4} ({regime:?})\n"));
            out.push_str(&format!("- mod_factor   : {mod_factor:.4}\n"));
            out.push_str(&format!("- fit          : {fit_mode:?}\n"));
            out.push_str(&format!("- rc,eff       : {effective_casing_radius:.4}\n"));
            out.push_str(&format!("- Le           : {effective_column_length:.4}\n"));
            out.push_str(&format!("- ln(V7)       : {ln_v7:.4}\n"));
            out.push_str(&format!("- ln(Re/rw)    : {}\n", fmt_stat(*ln_re_rw)));
            out.push_str(&format!("- K confined   : {} (working units)\n", fmt_sci(*k_confined)));
            out.push_str(&format!("- K unconfined : {} (working units)\n", fmt_sci(*k_unconfined)));
            out
        }
    }
}

/// One row per test of a batch, successes and failures alike.
pub fn format_batch_summary(outcomes: &[TestOutcome]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:<20} {:>12} {:<8} {:>10} {}\n",
            "test", "method", "K", "units", "R2", "status"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<20} {:-<12} {:-<8} {:-<10} {:-<8}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for o in outcomes {
        let line = match &o.result {
            Ok(r) => format!(
                "{:<24} {:<20} {:>12} {:<8} {:>10} ok\n",
                truncate(&o.name, 24),
                r.method.label(),
                fmt_sci(r.estimated_parameters.hydraulic_conductivity),
                r.estimated_parameters.conductivity_units(),
                fmt_stat(r.fitting_statistics.r_squared),
            ),
            Err(e) => format!(
                "{:<24} {:<20} {:>12} {:<8} {:>10} {} error: {}\n",
                truncate(&o.name, 24),
                "",
                "",
                "",
                "",
                e.kind().label(),
                e
            ),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    out.push_str(&format!("\n{} analyzed, {failed} failed\n", outcomes.len() - failed));
    out
}

fn fmt_sci(v: f64) -> String {
    if v.is_finite() { format!("{v:.4e}") } else { "n/a".to_string() }
}

fn fmt_stat(v: f64) -> String {
    if v.is_finite() { format!("{v:.6}") } else { "n/a".to_string() }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Aquifer, AquiferSpec, SlugWell, WellSpec};
    use crate::error::AppError;
    use crate::solution::{BouwerRice1976, SolutionMethod, TestType};

    fn result() -> AnalysisResult {
        let aquifer = Aquifer::new(AquiferSpec::new("unconfined", 100.0, 50.6, 10.0)).unwrap();
        let time: Vec<f64> = (0..=200).map(|i| i as f64 * 0.1).collect();
        let head = time.iter().map(|t| (-t / 4.0).exp()).collect();
        let well = SlugWell::new(WellSpec::new(0.064, 0.125, 1.52, 28.54), head, time, None, true).unwrap();
        BouwerRice1976::new("MW-1 test", TestType::Slug, aquifer, well)
            .unwrap()
            .analyze()
            .unwrap()
    }

    #[test]
    fn summary_lists_parameters_and_statistics() {
        let text = format_estimated_parameters(&result());
        assert!(text.starts_with("=== Bouwer-Rice (1976) ==="));
        assert!(text.contains("Test: MW-1 test"));
        assert!(text.contains("m/s"));
        assert!(text.contains("m^2/s"));
        assert!(text.contains("R_squared"));
        assert!(text.contains("T0 (s)"));
        assert!(!text.contains("Warnings:"));
    }

    #[test]
    fn batch_summary_reports_failures_inline() {
        let outcomes = vec![
            TestOutcome {
                name: "good".to_string(),
                result: Ok(result()),
            },
            TestOutcome {
                name: "bad".to_string(),
                result: Err(AppError::data("flat record")),
            },
        ];
        let text = format_batch_summary(&outcomes);
        assert!(text.contains("data quality error: flat record"));
        assert!(text.contains("1 analyzed, 1 failed"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
