//! Shared analysis pipelines used by the CLI commands.
//!
//! A single test runs `load -> analyze`. A batch runs every test in parallel
//! and keeps going past tests whose data cannot be analyzed, but stops on a
//! configuration error.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::data::{ResponseModel, SyntheticSlugTest, generate_slug_record};
use crate::domain::{Aquifer, AquiferSpec, AnalysisResult, MethodKind, SlugWell, WellSpec};
use crate::error::AppError;
use crate::io::load_test_definition;
use crate::settings::AnalysisSettings;
use crate::solution::{SlugTest, SolutionMethod, TestType};

/// Outcome of one test in a batch.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub result: Result<AnalysisResult, AppError>,
}

/// Analyze one test.
pub fn run_test(test: &SlugTest) -> Result<AnalysisResult, AppError> {
    info!(test = %test.name(), method = test.kind().label(), "analyzing");
    test.analyze()
}

/// Load a definition file and analyze it.
pub fn run_definition(path: &Path) -> Result<AnalysisResult, AppError> {
    let test = load_test_definition(path)?;
    run_test(&test)
}

/// Analyze already built tests in parallel. Outcomes keep input order.
pub fn run_batch(tests: &[SlugTest]) -> Result<Vec<TestOutcome>, AppError> {
    let outcomes: Vec<TestOutcome> = tests
        .par_iter()
        .map(|test| TestOutcome {
            name: test.name().to_string(),
            result: run_test(test),
        })
        .collect();
    finish_batch(outcomes)
}

/// Load and analyze definition files in parallel.
pub fn run_batch_files(paths: &[PathBuf]) -> Result<Vec<TestOutcome>, AppError> {
    let outcomes: Vec<TestOutcome> = paths
        .par_iter()
        .map(|path| match load_test_definition(path) {
            Ok(test) => TestOutcome {
                name: test.name().to_string(),
                result: run_test(&test),
            },
            Err(e) => TestOutcome {
                name: path.display().to_string(),
                result: Err(e),
            },
        })
        .collect();
    finish_batch(outcomes)
}

fn finish_batch(outcomes: Vec<TestOutcome>) -> Result<Vec<TestOutcome>, AppError> {
    let mut fatal: Vec<String> = Vec::new();
    for o in &outcomes {
        match &o.result {
            Ok(r) => info!(
                test = %o.name,
                k = r.estimated_parameters.hydraulic_conductivity,
                units = %r.estimated_parameters.conductivity_units(),
                "test analyzed"
            ),
            Err(e) if e.kind().aborts_batch() => {
                error!(test = %o.name, error = %e, "configuration error");
                fatal.push(format!("'{}': {}", o.name, e.message()));
            }
            Err(e) => warn!(test = %o.name, kind = e.kind().label(), error = %e, "test skipped"),
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if !fatal.is_empty() {
        error!(total = outcomes.len(), failed, configuration = fatal.len(), "aborting batch");
        return Err(AppError::config(format!(
            "{} of {} tests have configuration errors: {}",
            fatal.len(),
            outcomes.len(),
            fatal.join("; ")
        )));
    }
    info!(total = outcomes.len(), failed, "batch complete");
    Ok(outcomes)
}

/// Two synthetic tests in one unconfined aquifer: a slow exponential
/// recovery for Bouwer-Rice and an underdamped response for Butler.
pub fn demo_tests(seed: u64) -> Result<Vec<SlugTest>, AppError> {
    let aquifer = Aquifer::new(AquiferSpec {
        name: "Demo sand".to_string(),
        ..AquiferSpec::new("unconfined", 100.0, 30.0, 5.0)
    })?;

    let slow = generate_slug_record(&SyntheticSlugTest {
        static_level: 5.0,
        displacement: 0.5,
        model: ResponseModel::Exponential { t0: 12.0 },
        dt: 0.5,
        duration: 90.0,
        noise_std: 0.002,
        seed,
        ..SyntheticSlugTest::default()
    })?;
    let slow_well = SlugWell::new(
        WellSpec {
            name: "MW-1".to_string(),
            ..WellSpec::new(0.025, 0.05, 1.5, 12.0)
        },
        slow.head,
        slow.time,
        None,
        true,
    )?;

    let fast = generate_slug_record(&SyntheticSlugTest {
        static_level: 5.0,
        displacement: 0.8,
        model: ResponseModel::Oscillator { cd: 1.0, mod_factor: 1.5 },
        dt: 0.05,
        duration: 15.0,
        noise_std: 0.001,
        seed: seed.wrapping_add(1),
        ..SyntheticSlugTest::default()
    })?;
    let fast_well = SlugWell::new(
        WellSpec {
            name: "MW-2".to_string(),
            ..WellSpec::new(0.025, 0.05, 1.0, 20.0)
        },
        fast.head,
        fast.time,
        None,
        true,
    )?;

    Ok(vec![
        SlugTest::new(
            MethodKind::BouwerRice1976,
            "MW-1 falling head",
            TestType::Slug,
            aquifer.clone(),
            slow_well,
            AnalysisSettings::default(),
        )?,
        SlugTest::new(
            MethodKind::Butler2003,
            "MW-2 oscillatory",
            TestType::Slug,
            aquifer,
            fast_well,
            AnalysisSettings::default(),
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn test_with_head(name: &str, head: Vec<f64>, time: Vec<f64>) -> SlugTest {
        let aquifer = Aquifer::new(AquiferSpec::new("unconfined", 100.0, 30.0, 5.0)).unwrap();
        let well = SlugWell::new(WellSpec::new(0.025, 0.05, 1.5, 12.0), head, time, None, true).unwrap();
        SlugTest::new(
            MethodKind::BouwerRice1976,
            name,
            TestType::Slug,
            aquifer,
            well,
            AnalysisSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn demo_batch_analyzes_both_methods() {
        let tests = demo_tests(42).unwrap();
        let outcomes = run_batch(&tests).unwrap();
        assert_eq!(outcomes.len(), 2);
        for o in &outcomes {
            let r = o.result.as_ref().unwrap();
            assert!(r.estimated_parameters.hydraulic_conductivity > 0.0, "{}", o.name);
        }
        assert_eq!(outcomes[0].name, "MW-1 falling head");
    }

    #[test]
    fn data_failures_do_not_stop_the_batch() {
        let time: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let good = test_with_head("good", time.iter().map(|t| (-t / 4.0).exp()).collect(), time.clone());
        let flat = test_with_head("flat", vec![1.0; 20], time);

        let outcomes = run_batch(&[good, flat]).unwrap();
        assert!(outcomes[0].result.is_ok());
        let err = outcomes[1].result.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataQuality);
    }

    #[test]
    fn configuration_abort_names_every_offending_test() {
        let time: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let head: Vec<f64> = time.iter().map(|t| (-t / 4.0).exp()).collect();
        let mut tests = vec![test_with_head("good", head.clone(), time.clone())];
        for name in ["cable-a", "cable-b"] {
            let aquifer = Aquifer::new(AquiferSpec::new("unconfined", 100.0, 30.0, 5.0)).unwrap();
            let well = SlugWell::new(WellSpec::new(0.025, 0.05, 1.5, 12.0), head.clone(), time.clone(), None, true).unwrap();
            let settings = AnalysisSettings {
                cable_radius: 0.03,
                ..AnalysisSettings::default()
            };
            tests.push(SlugTest::new(MethodKind::Butler2003, name, TestType::Slug, aquifer, well, settings).unwrap());
        }

        let err = run_batch(&tests).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().starts_with("2 of 3 tests"), "{}", err.message());
        assert!(err.message().contains("'cable-a'"));
        assert!(err.message().contains("'cable-b'"));
        assert!(!err.message().contains("'good'"));
    }

    #[test]
    fn missing_definition_is_reported_per_test() {
        let outcomes = run_batch_files(&[PathBuf::from("/nonexistent/test.toml")]).unwrap();
        assert_eq!(outcomes[0].result.as_ref().unwrap_err().kind(), ErrorKind::Io);
    }
}
