use core_test_support::TestMemory;
use core_test_support::seed;
use pretty_assertions::assert_eq;
use risolu_core::memory::LookupResult;
use risolu_core::memory::derive_key;
use risolu_core::memory::similarity;

#[test]
fn miss_commit_then_exact_hit() {
    let mut engine = TestMemory::in_memory().open();
    assert_eq!(
        engine.lookup("RSL-MTR-001", "Martillo de bola 16oz"),
        LookupResult::Miss
    );

    engine.commit(
        "RSL-MTR-001",
        "Martillo de bola 16oz",
        vec!["hammer".to_string(), "mazo".to_string()],
        vec!["martillo".to_string()],
    );

    assert_eq!(
        engine.lookup("RSL-MTR-001", "Martillo de bola 16oz"),
        LookupResult::Exact {
            synonyms: vec!["hammer".to_string(), "mazo".to_string()],
            keywords: vec!["martillo".to_string()],
            usage_count: 2,
        }
    );
}

#[test]
fn each_exact_lookup_adds_one_use() {
    let mut engine = TestMemory::in_memory().open();
    seed(&mut engine);
    let key = derive_key(Some("PLC-100"), Some("Controlador lógico programable"));

    for expected in 2..=5 {
        let result = engine.lookup("plc 100", "controlador lógico, programable");
        assert!(matches!(result, LookupResult::Exact { usage_count, .. } if usage_count == expected));
        assert_eq!(
            engine.store().get(&key).map(|record| record.usage_count),
            Some(expected)
        );
    }
}

#[test]
fn near_duplicate_wrench_is_a_similar_hit() {
    let mut engine = TestMemory::in_memory().threshold(0.5).open();
    engine.commit(
        "Llave inglesa 10in",
        "llave ajustable cromada",
        vec!["wrench".to_string()],
        Vec::new(),
    );

    // alias 2/3 ("10" and "in" are too short to count), description 2/5.
    let expected = (2.0 / 3.0 + 2.0 / 5.0) / 2.0;
    match engine.lookup("Llave inglesa 10 in", "llave ajustable acero cromado") {
        LookupResult::Similar {
            synonyms,
            similarity,
            matched_alias,
            usage_count,
            ..
        } => {
            assert_eq!(synonyms, vec!["wrench".to_string()]);
            assert!((similarity - expected).abs() < 1e-9, "{similarity}");
            assert_eq!(matched_alias, "Llave inglesa 10in");
            assert_eq!(usage_count, 2);
        }
        other => panic!("expected a similar hit, got {other:?}"),
    }
}

#[test]
fn near_duplicate_below_default_threshold_misses() {
    let mut engine = TestMemory::in_memory().open();
    engine.commit(
        "Llave inglesa 10in",
        "llave ajustable cromada",
        vec!["wrench".to_string()],
        Vec::new(),
    );
    assert_eq!(
        engine.lookup("Llave inglesa 10 in", "llave ajustable acero cromado"),
        LookupResult::Miss
    );
}

#[test]
fn threshold_boundary_is_inclusive() {
    let mut engine = TestMemory::in_memory().open();
    assert!(engine.set_similarity_threshold(0.75));
    engine.commit(
        "Bomba centrifuga",
        "bomba agua",
        vec!["pump".to_string()],
        Vec::new(),
    );

    // alias 1.0, description 1/2.
    match engine.lookup("Bomba centrifuga", "bomba") {
        LookupResult::Similar { similarity, .. } => assert_eq!(similarity, 0.75),
        other => panic!("expected a similar hit at the boundary, got {other:?}"),
    }

    // One disjoint token widens the union: description 1/3.
    assert_eq!(
        engine.lookup("Bomba centrifuga", "bomba hierro"),
        LookupResult::Miss
    );
}

#[test]
fn similar_hit_counts_as_use_of_the_matched_record() {
    let mut engine = TestMemory::in_memory().threshold(0.5).open();
    let key = engine.commit("Cable UTP", "cable ethernet cat6", Vec::new(), Vec::new());
    assert!(engine.lookup("Cable UTP", "cable ethernet").is_hit());
    assert_eq!(
        engine.store().get(&key).map(|record| record.usage_count),
        Some(2)
    );
    assert_eq!(engine.len(), 1);
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let pairs = [
        ("Martillo de bola", "martillo bola 16oz"),
        ("", "anything"),
        ("Válvula solenoide", "valvula SOLENOIDE"),
        ("abc", "xyz"),
    ];
    for (left, right) in pairs {
        let forward = similarity(Some(left), Some(right));
        let backward = similarity(Some(right), Some(left));
        assert_eq!(forward, backward, "{left} / {right}");
        assert!((0.0..=1.0).contains(&forward));
    }
    assert_eq!(similarity(Some(""), Some("anything")), 0.0);
    assert_eq!(similarity(Some("Válvula solenoide"), Some("valvula SOLENOIDE")), 1.0);
}

#[test]
fn stats_reflect_the_store() {
    let mut engine = TestMemory::in_memory().open();
    seed(&mut engine);
    engine.lookup("PLC-100", "Controlador lógico programable");

    let stats = engine.stats();
    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.unique_aliases, 3);
    assert_eq!(stats.total_synonyms, 6);
    assert_eq!(
        stats.most_used.first().map(|summary| summary.alias.as_str()),
        Some("PLC-100")
    );
}
