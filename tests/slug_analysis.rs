use slug_curves::app::pipeline::run_batch;
use slug_curves::data::{ResponseModel, SyntheticSlugTest, generate_slug_record};
use slug_curves::domain::{
    Aquifer, AquiferSpec, LengthUnit, MethodDetails, MethodKind, SlugWell, TimeUnit, Unit, WellSpec, convert,
};
use slug_curves::error::ErrorKind;
use slug_curves::fit::{FitMethod, RegressionOptions, fit_regression};
use slug_curves::io::to_json;
use slug_curves::models::damped_oscillator;
use slug_curves::recovery::percentile_static_level;
use slug_curves::settings::AnalysisSettings;
use slug_curves::solution::{BouwerRice1976, Butler2003, SlugTest, SolutionMethod, TestType};

fn reference_aquifer() -> Aquifer {
    let mut spec = AquiferSpec::new("unconfined", 100.0, 50.6, 10.0);
    spec.anisotropy = 1.0;
    Aquifer::new(spec).unwrap()
}

fn reference_well() -> WellSpec {
    WellSpec::new(0.064, 0.125, 1.52, 28.54)
}

#[test]
fn unit_conversions_round_trip() {
    let lengths = [LengthUnit::M, LengthUnit::Ft];
    let times = [TimeUnit::S, TimeUnit::Min, TimeUnit::Hr];
    let mut pairs: Vec<(Unit, Unit)> = Vec::new();
    for a in lengths {
        for b in lengths {
            pairs.push((a.into(), b.into()));
        }
    }
    for a in times {
        for b in times {
            pairs.push((a.into(), b.into()));
        }
    }
    for v in [0.0, 1e-6, 0.125, 50.6, 3600.0, -2.5] {
        for (a, b) in &pairs {
            let back = convert(convert(v, *a, *b).unwrap(), *b, *a).unwrap();
            assert!((back - v).abs() <= 1e-12 * v.abs().max(1.0), "{v} {a} -> {b}");
        }
    }
    let err = convert(1.0, LengthUnit::M.into(), TimeUnit::S.into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn static_level_stays_within_noise_of_truth() {
    let level = 5.0;
    for (i, sigma) in [0.0, 0.01, 0.1].into_iter().enumerate() {
        let rec = generate_slug_record(&SyntheticSlugTest {
            static_level: level,
            displacement: 1.0,
            model: ResponseModel::Exponential { t0: 5.0 },
            dt: 0.5,
            duration: 100.0,
            noise_std: sigma,
            seed: 100 + i as u64,
            ..SyntheticSlugTest::default()
        })
        .unwrap();
        let found = percentile_static_level(&rec.head, 10.0).unwrap();
        assert!((found - level).abs() <= 3.0 * sigma + 0.01, "sigma {sigma}: {found}");
    }
}

#[test]
fn regression_engine_degrades_gracefully_on_one_point() {
    let r = fit_regression(&[1.0], &[1.0], &FitMethod::Linear, &RegressionOptions::default());
    assert!(!r.success);
    assert!(!r.message.is_empty());
    assert!(r.params().is_none());
}

#[test]
fn regression_engine_recovers_an_exact_line() {
    let x: Vec<f64> = (0..25).map(|i| i as f64 * 0.4).collect();
    let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 3.0).collect();
    let r = fit_regression(&x, &y, &FitMethod::Linear, &RegressionOptions::default());
    assert!(r.success);
    let p = r.params().unwrap();
    assert!((p[0] - 3.0).abs() < 1e-9);
    assert!((p[1] - 2.0).abs() < 1e-9);
    assert!((r.stats.as_ref().unwrap().r_squared - 1.0).abs() < 1e-12);
}

#[test]
fn bouwer_rice_recovers_injected_time_lag() {
    for t0 in [3.0, 4.0, 5.0] {
        let time: Vec<f64> = (0..=400).map(|i| 10.0 + i as f64 * 0.1).collect();
        let head: Vec<f64> = time.iter().map(|t| (-t / t0).exp()).collect();
        let well = SlugWell::new(reference_well(), head, time, None, true).unwrap();
        let res = BouwerRice1976::new("BR", TestType::Slug, reference_aquifer(), well)
            .unwrap()
            .analyze()
            .unwrap();

        let MethodDetails::BouwerRice { ln_re_rw, b, .. } = res.details else {
            panic!("expected Bouwer-Rice details");
        };
        let k = res.estimated_parameters.hydraulic_conductivity;
        let t0_fit = 0.064f64.powi(2) * ln_re_rw / (2.0 * b * k);
        assert!((t0_fit - t0).abs() / t0 < 0.03, "T0 {t0}: fitted {t0_fit}");
        assert!(res.fitting_statistics.r_squared > 0.99);
    }
}

#[test]
fn butler_model_is_continuous_across_critical_damping() {
    for t in [0.1, 0.5, 1.0, 3.0] {
        let below = damped_oscillator(t, 1.999, 1.3);
        let at = damped_oscillator(t, 2.0, 1.3);
        let above = damped_oscillator(t, 2.001, 1.3);
        assert!((below - at).abs() < 1e-3, "t = {t}");
        assert!((above - at).abs() < 1e-3, "t = {t}");
    }
}

#[test]
fn butler_reports_conductivity_in_aquifer_units() {
    let rec = generate_slug_record(&SyntheticSlugTest {
        static_level: 2.0,
        displacement: 0.6,
        model: ResponseModel::Oscillator { cd: 1.0, mod_factor: 1.5 },
        dt: 0.05,
        duration: 15.0,
        ..SyntheticSlugTest::default()
    })
    .unwrap();
    // Same record logged in minutes.
    let minutes: Vec<f64> = rec.time.iter().map(|t| t / 60.0).collect();
    let mut spec = WellSpec::new(0.025, 0.05, 1.0, 20.0);
    spec.time_unit = TimeUnit::Min;
    let well = SlugWell::new(spec, rec.head.clone(), minutes, None, true).unwrap();

    let mut aspec = AquiferSpec::new("confined", 100.0, 30.0, 5.0);
    aspec.time_unit = TimeUnit::Min;
    let aquifer = Aquifer::new(aspec).unwrap();
    let per_min = Butler2003::new("B-min", TestType::Slug, aquifer, well).unwrap().analyze().unwrap();

    let well = SlugWell::new(WellSpec::new(0.025, 0.05, 1.0, 20.0), rec.head, rec.time, None, true).unwrap();
    let aquifer = Aquifer::new(AquiferSpec::new("confined", 100.0, 30.0, 5.0)).unwrap();
    let per_s = Butler2003::new("B-s", TestType::Slug, aquifer, well).unwrap().analyze().unwrap();

    assert_eq!(per_min.estimated_parameters.time_unit, TimeUnit::Min);
    let ratio = per_min.estimated_parameters.hydraulic_conductivity / per_s.estimated_parameters.hydraulic_conductivity;
    assert!((ratio - 60.0).abs() < 1e-6 * 60.0, "ratio = {ratio}");

    let MethodDetails::Butler { cd, mod_factor, .. } = per_s.details else {
        panic!("expected Butler details");
    };
    assert!((cd - 1.0).abs() < 0.05);
    assert!((mod_factor - 1.5).abs() < 0.05);
}

#[test]
fn storage_coefficient_contract() {
    let aquifer = Aquifer::new(AquiferSpec::new("unconfined", 100.0, 10.0, 2.0)).unwrap();
    assert_eq!(aquifer.storage_coefficient(), None);

    let mut spec = AquiferSpec::new("unconfined", 100.0, 10.0, 2.0);
    spec.specific_yield = Some(0.2);
    let aquifer = Aquifer::new(spec).unwrap();
    assert!((aquifer.storage_coefficient().unwrap() - 2.0).abs() < 1e-12);
}

#[test]
fn casing_not_smaller_than_borehole_is_rejected() {
    for casing in [0.125, 0.2] {
        let err = SlugWell::new(
            WellSpec::new(casing, 0.125, 1.52, 28.54),
            vec![1.0, 0.5],
            vec![0.0, 1.0],
            None,
            true,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

#[test]
fn batch_aborts_on_configuration_error_only() {
    let time: Vec<f64> = (0..=300).map(|i| i as f64 * 0.1).collect();
    let head: Vec<f64> = time.iter().map(|t| (-t / 4.0).exp()).collect();
    let good = SlugTest::new(
        MethodKind::BouwerRice1976,
        "good",
        TestType::Slug,
        reference_aquifer(),
        SlugWell::new(reference_well(), head.clone(), time.clone(), None, true).unwrap(),
        AnalysisSettings::default(),
    )
    .unwrap();

    let flat = SlugTest::new(
        MethodKind::BouwerRice1976,
        "flat",
        TestType::Slug,
        reference_aquifer(),
        SlugWell::new(reference_well(), vec![1.0; 10], (0..10).map(|i| i as f64).collect(), None, true).unwrap(),
        AnalysisSettings::default(),
    )
    .unwrap();
    let outcomes = run_batch(&[good.clone(), flat]).unwrap();
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[1].result.is_err());

    let cable = SlugTest::new(
        MethodKind::Butler2003,
        "cable",
        TestType::Slug,
        reference_aquifer(),
        SlugWell::new(reference_well(), head, time, None, true).unwrap(),
        AnalysisSettings {
            cable_radius: 0.1,
            ..AnalysisSettings::default()
        },
    )
    .unwrap();
    let err = run_batch(&[good, cable]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.message().contains("cable"));
}

#[test]
fn result_serializes_to_json() {
    let time: Vec<f64> = (0..=300).map(|i| i as f64 * 0.1).collect();
    let head: Vec<f64> = time.iter().map(|t| (-t / 4.0).exp()).collect();
    let well = SlugWell::new(reference_well(), head, time, None, true).unwrap();
    let res = BouwerRice1976::new("json", TestType::Slug, reference_aquifer(), well)
        .unwrap()
        .analyze()
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&to_json(&res).unwrap()).unwrap();
    assert_eq!(value["method"], "bouwer_rice_1976");
    assert_eq!(value["details"]["method"], "bouwer_rice");
    assert!(value["fitting_statistics"]["R_squared"].as_f64().unwrap() > 0.99);
    assert_eq!(value["estimated_parameters"]["length_unit"], "m");
    assert!(value.get("figure").is_none());
}
