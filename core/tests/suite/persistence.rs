use core_test_support::TestMemory;
use core_test_support::seed;
use pretty_assertions::assert_eq;
use risolu_core::memory::LookupResult;
use risolu_core::memory::SNAPSHOT_KEY;
use risolu_core::memory::THRESHOLD_KEY;
use tracing_test::traced_test;

#[test]
fn memory_survives_a_restart() {
    let memory = TestMemory::on_disk();
    let mut engine = memory.open();
    seed(&mut engine);
    assert!(engine.dispose());

    let mut reopened = memory.open();
    assert_eq!(reopened.len(), 3);
    assert!(matches!(
        reopened.lookup("RSL-MTR-001", "Martillo de bola 16oz"),
        LookupResult::Exact { usage_count: 2, .. }
    ));
}

#[test]
fn thousand_records_round_trip_through_disk() {
    let memory = TestMemory::on_disk();
    let mut engine = memory.open();
    for idx in 0..1000 {
        engine.commit(
            &format!("RSL-CBL-{idx:04}"),
            &format!("Cable calibre {idx} awg"),
            vec![format!("wire-{idx}"), "cable".to_string()],
            vec![format!("CBL{idx}")],
        );
    }
    let before = engine.store().clone();

    let reopened = memory.open();
    assert_eq!(reopened.store(), &before);
}

#[test]
fn threshold_is_persisted_separately() {
    let memory = TestMemory::in_memory();
    let mut engine = memory.open();
    assert!(engine.set_similarity_threshold(0.9));

    let storage = memory.storage();
    assert_eq!(
        storage.get_item(THRESHOLD_KEY).expect("read threshold"),
        Some("0.9".to_string())
    );
    assert_eq!(memory.open().similarity_threshold(), 0.9);
}

#[test]
fn corrupt_snapshot_starts_empty() {
    let memory = TestMemory::in_memory();
    memory
        .storage()
        .set_item(SNAPSHOT_KEY, "{\"products\": 42}")
        .expect("seed corrupt snapshot");

    let mut engine = memory.open();
    assert!(engine.is_empty());
    engine.commit("A", "B", Vec::new(), Vec::new());
    assert_eq!(memory.open().len(), 1);
}

#[traced_test]
#[test]
fn rejected_write_keeps_in_memory_state() {
    let memory = TestMemory::with_quota(256);
    let mut engine = memory.open();
    for idx in 0..10 {
        engine.commit(
            &format!("Producto {idx}"),
            "descripcion larga para llenar la cuota",
            vec!["sinonimo".to_string()],
            Vec::new(),
        );
    }

    assert_eq!(engine.len(), 10);
    assert!(!engine.flush());
    assert!(logs_contain("synonym memory not persisted"));
    assert!(matches!(
        engine.lookup("Producto 9", "descripcion larga para llenar la cuota"),
        LookupResult::Exact { .. }
    ));
}

#[test]
fn clear_empties_memory_across_restarts() {
    let memory = TestMemory::on_disk();
    let mut engine = memory.open();
    seed(&mut engine);
    assert!(engine.clear());
    assert!(engine.is_empty());
    assert!(memory.open().is_empty());
}
