//! End-to-end engine behavior on a virtual clock.

use proptest::prelude::*;
use ts_app::{AppError, EngineConfig, SimulateOptions, TitrationEngine, simulate};
use ts_chem::{ReactantKind, ReactantSpec, TitrantSpec};
use ts_results::{
    ExperimentHeader, ExperimentRecord, ExperimentStore, JsonFileStore, ResultsError,
    ResultsResult,
};
use ts_sim::{ManualClock, StartOutcome, TickOutcome};

fn engine_at(start_ms: f64) -> (TitrationEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new(start_ms);
    let engine = TitrationEngine::with_clock(&EngineConfig::default(), clock.clone())
        .expect("default config is valid");
    (engine, clock)
}

/// Advance in nominal ticks until `volume_l` has been dispensed.
fn dispense_to(engine: &mut TitrationEngine<ManualClock>, clock: &ManualClock, volume_l: f64) {
    let period = engine.dispense_config().tick_period_ms;
    while engine.volume_added() < volume_l - 1e-12 {
        clock.advance(period);
        if matches!(engine.tick(), TickOutcome::Completed(_) | TickOutcome::Idle) {
            break;
        }
    }
}

#[test]
fn reference_acid_base_titration() {
    let (mut engine, clock) = engine_at(0.0);
    assert!((engine.current_ph() - 1.0).abs() < 1e-12);

    assert_eq!(engine.start(), StartOutcome::Started);
    dispense_to(&mut engine, &clock, 0.025);
    assert!((engine.volume_added() - 0.025).abs() < 1e-9);
    assert!((engine.current_ph() - 7.0).abs() < 1e-6);

    dispense_to(&mut engine, &clock, 0.050);
    assert!((engine.volume_added() - 0.050).abs() < 1e-9);
    assert!((engine.current_ph() - 12.52).abs() < 0.01);

    let points = engine.titration_points();
    assert!(points.len() > 100);
    assert!(points.windows(2).all(|w| w[1].volume_added > w[0].volume_added));
    assert!(points.windows(2).all(|w| w[1].ph >= w[0].ph));
    assert!(points.iter().all(|p| (0.0..=14.0).contains(&p.ph)));

    let state = engine.current_state();
    assert_eq!(state.moles_of("HCl"), 0.0);
    assert!((state.moles_of("NaOH") - 0.0025).abs() < 1e-6);
    assert!((state.moles_of("H2O") - 0.0025).abs() < 1e-9);
}

#[test]
fn base_analyte_titrated_with_acid() {
    let (mut engine, clock) = engine_at(0.0);
    let analyte = ReactantSpec::new(ReactantKind::Base, 0.1, 0.020).expect("valid analyte");
    let titrant = TitrantSpec::new(ReactantKind::Acid, 0.2).expect("valid titrant");
    engine.reconfigure(analyte, titrant).expect("idle engine");
    assert!((engine.current_ph() - 13.0).abs() < 1e-12);
    assert!((engine.equivalence_volume() - 0.010).abs() < 1e-15);

    engine.start();
    dispense_to(&mut engine, &clock, 0.030);
    let points = engine.titration_points();
    assert!(points.windows(2).all(|w| w[1].ph <= w[0].ph));
    assert!(engine.current_ph() < 2.0);
}

#[test]
fn pause_and_resume_does_not_count_idle_time() {
    let (mut engine, clock) = engine_at(0.0);
    engine.start();
    clock.advance(4_000.0);
    engine.tick();
    engine.stop();

    // A long pause.
    clock.advance(600_000.0);
    engine.start();
    clock.advance(4_000.0);
    engine.tick();

    // 8 s of flow at 0.5 mL/s
    assert!((engine.volume_added() - 4.0e-3).abs() < 1e-12);
}

#[test]
fn zero_volume_analyte_is_a_boundary_not_an_error() {
    let mut cfg = EngineConfig::default();
    cfg.analyte.volume_ml = 0.0;
    let clock = ManualClock::new(0.0);
    let engine = TitrationEngine::with_clock(&cfg, clock).expect("zero volume is allowed");
    assert_eq!(engine.current_ph(), 1.0);
    assert_eq!(engine.equivalence_volume(), 0.0);
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut cfg = EngineConfig::default();
    cfg.analyte.concentration_molar = 0.0;
    assert!(matches!(
        TitrationEngine::with_clock(&cfg, ManualClock::default()),
        Err(AppError::Configuration(_))
    ));
}

struct FailingStore;

impl ExperimentStore for FailingStore {
    fn save(&self, _record: &ExperimentRecord) -> ResultsResult<()> {
        Err(ResultsError::Unavailable {
            message: "disk full".to_string(),
        })
    }

    fn load(&self, id: &str) -> ResultsResult<ExperimentRecord> {
        Err(ResultsError::ExperimentNotFound { id: id.to_string() })
    }

    fn list(&self) -> ResultsResult<Vec<ExperimentHeader>> {
        Ok(Vec::new())
    }

    fn delete(&self, _id: &str) -> ResultsResult<()> {
        Ok(())
    }
}

#[test]
fn failed_save_leaves_run_untouched() {
    let (mut engine, clock) = engine_at(0.0);
    engine.start();
    dispense_to(&mut engine, &clock, 0.010);
    let before = engine.snapshot();

    let err = engine.save_to(&FailingStore, "doomed");
    assert!(matches!(err, Err(AppError::Persistence(_))));

    assert_eq!(engine.snapshot(), before);
    assert!(engine.is_dispensing());
    clock.advance(1_000.0);
    assert!(matches!(engine.tick(), TickOutcome::Advanced(_)));
}

#[test]
fn simulated_run_round_trips_through_file_store() {
    let dir = std::env::temp_dir().join("ts_app_test_round_trip");
    let _ = std::fs::remove_dir_all(&dir);
    let store = JsonFileStore::new(dir).expect("store dir");

    let options = SimulateOptions {
        stop_at_ml: Some(40.0),
        start_ms: Some(1_700_000_000_000.0),
        progress_every: 0,
    };
    let resp = simulate(&EngineConfig::default(), &options).expect("simulation runs");
    let saved = resp.engine.save_to(&store, "round trip").expect("save");

    let loaded = store.load(&saved.id).expect("load");
    assert_eq!(loaded.name, "round trip");
    assert_eq!(loaded.titration_points.len(), saved.titration_points.len());
    assert_eq!(loaded.settings.species, "HCl");
    assert!((loaded.settings.concentration - 0.1).abs() < 1e-15);
    assert!((loaded.final_state.volume_l - resp.engine.current_state().volume_l).abs() < 1e-12);

    let headers = store.list().expect("list");
    assert!(headers.iter().any(|h| h.id == saved.id));

    let csv = ts_results::export_csv(&loaded.titration_points);
    assert_eq!(csv, resp.engine.export_csv());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reset_always_restores_initial_state(
        ops in prop::collection::vec((0u8..4, 0.0f64..20_000.0), 0..30)
    ) {
        let (mut engine, clock) = engine_at(0.0);
        let initial_ph = engine.current_ph();
        let initial_state = engine.current_state();

        for (op, dt) in ops {
            clock.advance(dt);
            match op {
                0 => { engine.start(); }
                1 => { engine.stop(); }
                2 => { engine.tick(); }
                _ => engine.reset(),
            }
            let ph = engine.current_ph();
            prop_assert!((0.0..=14.0).contains(&ph));
            prop_assert!(engine.volume_added() <= engine.dispense_config().max_volume_l);
        }

        engine.reset();
        prop_assert!(engine.titration_points().is_empty());
        prop_assert!(!engine.is_dispensing());
        prop_assert_eq!(engine.current_ph(), initial_ph);
        prop_assert_eq!(engine.current_state(), initial_state);
    }
}
