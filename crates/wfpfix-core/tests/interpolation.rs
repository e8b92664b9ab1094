use wfpfix_core::{
    CorrectionConfig, CorrectionError, Direction, InterpolationModel,
    InterpolationProfileCorrector, Placement, Profile, ReferenceTuple, Sample, Timestamped,
};

fn identity(value: f64) -> f64 {
    value
}

/// Reference tuples one minute apart with value `start + i * step`.
fn reference_profile(len: usize, start: f64, step: f64) -> Profile<ReferenceTuple> {
    let tuples = (0..len)
        .map(|i| ReferenceTuple::new(60.0 * i as f64, start + step * i as f64))
        .collect();
    Profile::new(tuples).expect("non-empty reference")
}

fn target(values: &[f64]) -> Profile<Sample<()>> {
    let samples = values
        .iter()
        .enumerate()
        .map(|(i, &v)| Sample::new(9_000.0 + i as f64, v, ()))
        .collect();
    Profile::new(samples).expect("non-empty target")
}

fn timestamps<P>(profile: &Profile<Sample<P>>) -> Vec<f64> {
    profile.iter().map(|s| s.timestamp()).collect()
}

#[test]
fn model_boundaries_are_inclusive_and_never_extrapolate() {
    let nodes = vec![
        ReferenceTuple::new(0.0, 10.0),
        ReferenceTuple::new(60.0, 20.0),
        ReferenceTuple::new(120.0, 30.0),
    ];
    let model = InterpolationModel::new(&nodes).expect("model");

    assert_eq!(model.direction(), Direction::Ascending);
    assert_eq!(model.time_for(10.0), Some(0.0));
    assert_eq!(model.time_for(30.0), Some(120.0));
    assert_eq!(model.time_for(25.0), Some(90.0));
    assert_eq!(model.time_for(30.5), None);
    assert_eq!(model.time_for(9.5), None);
    assert_eq!(model.placement(9.5), Placement::Before);
    assert_eq!(model.placement(30.5), Placement::After);
}

#[test]
fn descending_model_interpolates_by_value() {
    let nodes = vec![
        ReferenceTuple::new(0.0, 30.0),
        ReferenceTuple::new(60.0, 20.0),
        ReferenceTuple::new(120.0, 10.0),
    ];
    let model = InterpolationModel::new(&nodes).expect("model");

    assert_eq!(model.direction(), Direction::Descending);
    assert_eq!(model.values(), &[10.0, 20.0, 30.0]);
    assert_eq!(model.time_for(15.0), Some(90.0));
    assert_eq!(model.placement(31.0), Placement::Before);
    assert_eq!(model.placement(9.0), Placement::After);
}

#[test]
fn a_single_distinct_value_is_underdetermined() {
    let nodes = vec![ReferenceTuple::new(0.0, 5.0), ReferenceTuple::new(60.0, 5.0)];
    let err = InterpolationModel::new(&nodes).expect_err("flat model");
    assert!(matches!(err, CorrectionError::ModelUnderdetermined { .. }));
}

#[test]
fn samples_on_model_nodes_get_node_times() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    // 12 tuples, trimmed to values 1..=10 at 60..=600 s.
    let reference = reference_profile(12, 0.0, 1.0);
    let mut profile = target(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(outcome.corrected, "{:?}", outcome.warning);
    let expected: Vec<f64> = (1..=10).map(|i| 60.0 * i as f64).collect();
    assert_eq!(timestamps(&profile), expected);
}

#[test]
fn values_beyond_the_model_use_average_interval() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(12, 0.0, 1.0);
    // -1 and 0 precede the model (which starts at 1), 11 and 12 follow it (ends at 10).
    let mut profile = target(&[-1.0, 0.0, 1.0, 2.0, 3.0, 11.0, 12.0]);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(outcome.corrected);
    assert_eq!(
        timestamps(&profile),
        vec![-60.0, 0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
    );
}

#[test]
fn samples_after_the_model_stop_interpolation() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(12, 0.0, 1.0);
    // 5.0 after the overshoot would be inside the model but is backfilled instead.
    let mut profile = target(&[1.0, 2.0, 11.0, 5.0]);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(outcome.corrected);
    assert_eq!(timestamps(&profile), vec![60.0, 120.0, 180.0, 240.0]);
}

#[test]
fn descending_profile_is_corrected() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    // Values 100, 98, ... trimmed to 98..=80 at 60..=600 s.
    let reference = reference_profile(12, 100.0, -2.0);
    let mut profile = target(&[99.0, 97.0, 95.0, 93.0]);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(outcome.corrected);
    assert_eq!(timestamps(&profile), vec![30.0, 90.0, 150.0, 210.0]);
}

#[test]
fn noise_reversal_inside_the_range_is_filled_by_index() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(12, 0.0, 1.0);
    // 0.5 is before the model start but sits between two assigned samples.
    let mut profile = target(&[2.0, 0.5, 4.0]);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(outcome.corrected);
    assert_eq!(timestamps(&profile), vec![120.0, 180.0, 240.0]);
}

#[test]
fn no_sample_within_model_fails_without_mutation() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(12, 0.0, 1.0);
    let mut profile = target(&[50.0, 60.0]);
    let before = timestamps(&profile);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(!outcome.corrected);
    assert!(matches!(
        outcome.cause,
        Some(CorrectionError::ModelUnderdetermined { .. })
    ));
    assert_eq!(timestamps(&profile), before);
}

#[test]
fn one_assigned_sample_among_many_is_underdetermined() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(12, 0.0, 1.0);
    let mut profile = target(&[5.0, 50.0, 60.0]);
    let before = timestamps(&profile);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(!outcome.corrected);
    assert_eq!(timestamps(&profile), before);
}

#[test]
fn single_sample_profile_is_corrected() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(12, 0.0, 1.0);
    let mut profile = target(&[2.5]);

    let outcome = corrector.correct(&mut profile, &reference);

    assert!(outcome.corrected);
    assert_eq!(timestamps(&profile), vec![150.0]);
}

#[test]
fn correction_is_idempotent() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(40, 3.0, 0.7);
    let mut profile = target(&[2.0, 4.1, 6.3, 9.9, 14.2, 20.0, 31.0, 40.0]);

    assert!(corrector.correct(&mut profile, &reference).corrected);
    let first_pass = timestamps(&profile);

    assert!(corrector.correct(&mut profile, &reference).corrected);
    assert_eq!(timestamps(&profile), first_pass);
}

#[test]
fn model_nodes_respect_decimation_interval() {
    // Decimation interval is tunable; this checks the default spacing holds.
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let tuples = (0..1_000)
        .map(|i| ReferenceTuple::new(i as f64, 0.05 * i as f64))
        .collect();
    let reference = Profile::new(tuples).expect("reference");

    let model = corrector.build_model(&reference).expect("model");

    assert!(model.values().len() > 2);
    for pair in model.times().windows(2) {
        assert!(pair[1] - pair[0] >= 60.0);
    }
}

#[test]
fn built_model_exposes_trimmed_endpoints_and_time_span() {
    let config = CorrectionConfig::default();
    let corrector = InterpolationProfileCorrector::new(&config, &identity);
    let reference = reference_profile(21, 100.0, -1.0);

    let model = corrector.build_model(&reference).expect("model");

    // Two tuples trimmed from each end.
    assert_eq!(model.endpoints(), (98.0, 82.0));
    assert_eq!(model.time_span(), (120.0, 1_080.0));
}
