use std::collections::BTreeMap;
use ts_chem::SolutionState;
use ts_results::*;
use ts_sim::TitrationPoint;

fn record(id: &str, timestamp: f64, points: usize) -> ExperimentRecord {
    ExperimentRecord {
        id: id.to_string(),
        name: format!("experiment {id}"),
        timestamp,
        titration_points: (0..points)
            .map(|i| TitrationPoint {
                volume_added: i as f64 * 1e-3,
                ph: 1.0 + i as f64 * 0.1,
                timestamp: timestamp + i as f64 * 50.0,
            })
            .collect(),
        final_state: SolutionState {
            volume_l: 0.025 + points as f64 * 1e-3,
            temperature_k: 298.15,
            moles: BTreeMap::from([("HCl".to_string(), 0.002), ("H2O".to_string(), 0.0005)]),
        },
        settings: ExperimentSettings {
            initial_volume: 0.025,
            droplet_volume: 2.5e-5,
            species: "HCl".to_string(),
            concentration: 0.1,
        },
    }
}

fn fresh_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn save_and_load_experiment() {
    let store = JsonFileStore::new(fresh_dir("ts_results_test_save")).unwrap();

    let original = record("exp-123", 1_700_000_000_000.0, 5);
    store.save(&original).unwrap();

    let loaded = store.load("exp-123").unwrap();
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.name, original.name);
    assert_eq!(loaded.settings.species, "HCl");
    assert_eq!(loaded.titration_points.len(), 5);
    for (a, b) in loaded.titration_points.iter().zip(&original.titration_points) {
        assert!((a.volume_added - b.volume_added).abs() < 1e-15);
        assert!((a.ph - b.ph).abs() < 1e-12);
    }
    assert_eq!(loaded.final_state.moles.len(), 2);
    assert!((loaded.final_state.moles_of("H2O") - 0.0005).abs() < 1e-15);
}

#[test]
fn save_overwrites_existing_record() {
    let store = JsonFileStore::new(fresh_dir("ts_results_test_overwrite")).unwrap();

    store.save(&record("exp", 1.0, 2)).unwrap();
    store.save(&record("exp", 2.0, 7)).unwrap();

    let loaded = store.load("exp").unwrap();
    assert_eq!(loaded.titration_points.len(), 7);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn list_is_sorted_by_timestamp() {
    let store = JsonFileStore::new(fresh_dir("ts_results_test_list")).unwrap();

    store.save(&record("late", 3_000.0, 1)).unwrap();
    store.save(&record("early", 1_000.0, 4)).unwrap();
    store.save(&record("middle", 2_000.0, 0)).unwrap();
    // Unrelated files in the directory are ignored.
    std::fs::write(store.root_dir().join("notes.txt"), "hello").unwrap();

    let headers = store.list().unwrap();
    let ids: Vec<_> = headers.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["early", "middle", "late"]);
    assert_eq!(headers[0].point_count, 4);
}

#[test]
fn missing_and_invalid_ids() {
    let store = JsonFileStore::new(fresh_dir("ts_results_test_missing")).unwrap();

    assert!(matches!(
        store.load("nope"),
        Err(ResultsError::ExperimentNotFound { .. })
    ));
    assert!(matches!(
        store.load("../outside"),
        Err(ResultsError::InvalidId { .. })
    ));
}

#[test]
fn delete_removes_record() {
    let store = JsonFileStore::new(fresh_dir("ts_results_test_delete")).unwrap();

    store.save(&record("gone", 1.0, 1)).unwrap();
    store.delete("gone").unwrap();
    assert!(store.load("gone").is_err());
    // Deleting twice is fine.
    store.delete("gone").unwrap();
}

#[test]
fn memory_store_behaves_like_file_store() {
    let store = MemoryStore::new();
    store.save(&record("b", 2.0, 1)).unwrap();
    store.save(&record("a", 1.0, 3)).unwrap();

    assert_eq!(store.load("a").unwrap().titration_points.len(), 3);
    let ids: Vec<_> = store.list().unwrap().into_iter().map(|h| h.id).collect();
    assert_eq!(ids, ["a", "b"]);

    store.delete("a").unwrap();
    assert!(matches!(
        store.load("a"),
        Err(ResultsError::ExperimentNotFound { .. })
    ));
}

#[test]
fn exported_csv_matches_saved_curve() {
    let original = record("csv", 1_700_000_000_000.0, 3);
    let path = fresh_dir("ts_results_test_csv");
    std::fs::create_dir_all(&path).unwrap();
    let file = path.join("curve.csv");

    write_csv(&file, &original.titration_points).unwrap();
    let content = std::fs::read_to_string(&file).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    assert_eq!(lines.next(), Some("0.000,1.000,2023-11-14T22:13:20.000Z"));
    assert_eq!(lines.next(), Some("1.000,1.100,2023-11-14T22:13:20.050Z"));
    assert_eq!(lines.next(), Some("2.000,1.200,2023-11-14T22:13:20.100Z"));
    assert_eq!(lines.next(), None);
}
