use lai_sim::{
    analyser::SegmentAnalyser,
    concentration::ConcentrationModel,
    curve::CurveGenerator,
    example_data::{ExampleDataGenerator, EXAMPLE_PARAMETERS},
    hair::HairStrand,
    models::*,
    output::{ResultStore, REPEATED_SUFFIX, SINGLE_SUFFIX},
    parser::ObservationParser,
    superposition::DoseSuperposer,
    LaiSimulator, SimError,
};
use approx::assert_relative_eq;
use tempfile::TempDir;

#[test]
fn test_descriptor_scenario() {
    let descriptors = PkDescriptors::new(1.0, 100.0, 2.0);
    let simulator = LaiSimulator::from_pk_descriptors(
        "scenario",
        &descriptors,
        None,
        &FitParameters::DEFAULT_GUESS,
    )
    .unwrap();

    let curve = simulator.curve().unwrap();
    assert_eq!(curve.len(), 21);
    assert_eq!(curve[0], 0.0);

    let peak_day = curve
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(day, _)| day)
        .unwrap();
    assert_eq!(peak_day, 1);
    assert_relative_eq!(curve[1], 100.0, max_relative = 1e-3);
    assert_relative_eq!(curve[3], 50.0, max_relative = 1e-3);

    let params = simulator.parameters().unwrap();
    assert_ne!(params.m, params.n);
    let (d, m, n) = params.as_tuple();
    assert!(d.is_finite() && m.is_finite() && n.is_finite());
}

#[test]
fn test_half_life_property_across_descriptors() {
    for (tmax, cmax, thalf) in [
        (7.0, 20.0, 30.0),
        (14.0, 50.0, 40.0),
        (4.0, 10.0, 20.0),
        (1.0, 1000.0, 60.0),
        (7.0, 1000.0, 60.0),
    ] {
        let simulator = LaiSimulator::from_pk_descriptors(
            "depot",
            &PkDescriptors::new(tmax, cmax, thalf),
            None,
            &FitParameters::DEFAULT_GUESS,
        )
        .unwrap();
        let params = simulator.parameters().unwrap();

        let at_peak = ConcentrationModel::concentration(tmax, &params).unwrap();
        let one_half_life_later = ConcentrationModel::concentration(tmax + thalf, &params).unwrap();

        assert_relative_eq!(at_peak, cmax, max_relative = 1e-3);
        assert_relative_eq!(one_half_life_later, cmax / 2.0, max_relative = 1e-3);
        assert_eq!(
            simulator.curve().unwrap().len() as i64,
            CurveGenerator::days_in(tmax + 10.0 * thalf)
        );
    }
}

#[test]
fn test_flat_curve_superposition_scenario() {
    let base = vec![5.0; 10];
    let plasma = DoseSuperposer::superpose(&base, 3, 10).unwrap();

    assert_eq!(plasma.len(), 40);
    assert_eq!(plasma[0], 5.0);
    assert_eq!(plasma[10], 5.0);
}

#[test]
fn test_fit_from_observation_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("observations.csv");

    ExampleDataGenerator::generate_dataset(&path, 0.0).unwrap();
    let observations = ObservationParser::parse_file(&path).unwrap();
    let simulator = LaiSimulator::from_observations(
        "example",
        &observations,
        120,
        &FitParameters::DEFAULT_GUESS,
    )
    .unwrap();

    let params = simulator.parameters().unwrap();
    assert_relative_eq!(params.d, EXAMPLE_PARAMETERS.d, max_relative = 1e-3);
    assert_relative_eq!(params.m, EXAMPLE_PARAMETERS.m, max_relative = 1e-3);
    assert_relative_eq!(params.n, EXAMPLE_PARAMETERS.n, max_relative = 1e-3);
    assert_eq!(simulator.curve().unwrap().len(), 120);
}

#[test]
fn test_persistence_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let prefix = temp_dir.path().join("paliperidone");

    let mut simulator = LaiSimulator::from_pk_descriptors(
        "paliperidone",
        &PkDescriptors::new(13.0, 25.0, 35.0),
        Some(180),
        &FitParameters::DEFAULT_GUESS,
    )
    .unwrap();
    simulator.simulate_n(5, 28).unwrap();

    let written = simulator.save(Some(prefix.as_path())).unwrap();
    assert_eq!(written.len(), 2);

    let (days, levels) = ResultStore::load(ResultStore::record_path(&prefix, SINGLE_SUFFIX)).unwrap();
    assert_eq!(levels.as_slice(), simulator.curve().unwrap());
    assert_eq!(days, (0..180).collect::<Vec<usize>>());

    let (days, levels) =
        ResultStore::load(ResultStore::record_path(&prefix, REPEATED_SUFFIX)).unwrap();
    assert_eq!(levels.as_slice(), simulator.plasma().unwrap());
    assert_eq!(days.len(), 180 + 5 * 28);
}

#[test]
fn test_save_requires_name_or_path() {
    let mut simulator = LaiSimulator::new("");
    simulator
        .pk_tune(&PkDescriptors::new(1.0, 100.0, 2.0), None, &FitParameters::DEFAULT_GUESS)
        .unwrap();

    assert!(matches!(
        simulator.save(None),
        Err(SimError::ConfigurationError(_))
    ));
}

#[test]
fn test_hair_troughs_follow_dosing() {
    let mut simulator = LaiSimulator::from_pk_descriptors(
        "monthly",
        &PkDescriptors::new(1.0, 100.0, 2.0),
        Some(28),
        &FitParameters::DEFAULT_GUESS,
    )
    .unwrap();
    let plasma = simulator.simulate_n(3, 28).unwrap().to_vec();
    assert_eq!(plasma.len(), 28 * 4);

    // one segment per week: each dose shows up as a high first week then a decline
    let strand = HairStrand::new(plasma);
    let segments = strand.segment_into_len(7).unwrap();
    assert_eq!(segments.len(), 16);

    let summary = SegmentAnalyser::summarize(&segments).unwrap();
    assert_eq!(summary.normalized_means.len(), 16);
    assert_relative_eq!(
        summary.normalized_means.iter().copied().fold(f64::MIN, f64::max),
        1.0
    );
    assert_eq!(summary.troughs, vec![3, 7, 11]);
}
