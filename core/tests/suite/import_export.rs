use anyhow::Result;
use core_test_support::TestMemory;
use core_test_support::products_json;
use core_test_support::seed;
use core_test_support::write_fixture;
use pretty_assertions::assert_eq;
use risolu_core::MemoryError;
use risolu_core::memory::ExportFormat;
use risolu_core::memory::LookupResult;
use risolu_core::memory::ProductKey;
use risolu_core::memory::SNAPSHOT_KEY;
use tempfile::TempDir;

#[tokio::test]
async fn json_export_imports_into_a_fresh_memory() -> Result<()> {
    let dir = TempDir::new()?;
    let mut source = TestMemory::in_memory().open();
    seed(&mut source);
    let path = dir.path().join(ExportFormat::Json.default_file_name());
    source.export_snapshot(ExportFormat::Json, &path).await?;

    let mut target = TestMemory::in_memory().open();
    let imported = target.import_snapshot(&path).await?;
    assert_eq!(imported, 3);
    assert_eq!(target.store(), source.store());
    Ok(())
}

#[tokio::test]
async fn csv_export_imports_lists_and_counts() -> Result<()> {
    let dir = TempDir::new()?;
    let mut source = TestMemory::in_memory().open();
    seed(&mut source);
    source.lookup("RSL-MTR-001", "Martillo de bola 16oz");
    let path = dir.path().join("nested").join("backup.csv");
    source.export_snapshot(ExportFormat::Csv, &path).await?;

    let mut target = TestMemory::in_memory().open();
    assert_eq!(target.import_snapshot(&path).await?, 3);
    match target.lookup("RSL-MTR-001", "Martillo de bola 16oz") {
        LookupResult::Exact {
            synonyms,
            usage_count,
            ..
        } => {
            assert_eq!(synonyms, vec!["hammer".to_string(), "mazo".to_string()]);
            assert_eq!(usage_count, 3);
        }
        other => panic!("expected an exact hit, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn excel_export_writes_a_workbook() -> Result<()> {
    let dir = TempDir::new()?;
    let mut engine = TestMemory::in_memory().open();
    seed(&mut engine);
    let path = dir.path().join(ExportFormat::Excel.default_file_name());
    engine.export_snapshot(ExportFormat::Excel, &path).await?;

    let bytes = tokio::fs::read(&path).await?;
    assert!(bytes.starts_with(b"PK"));
    Ok(())
}

#[tokio::test]
async fn import_without_products_leaves_store_untouched() -> Result<()> {
    let dir = TempDir::new()?;
    let memory = TestMemory::in_memory();
    let mut engine = memory.open();
    seed(&mut engine);
    let before = engine.store().clone();
    let durable_before = memory.storage().get_item(SNAPSHOT_KEY)?;
    assert!(durable_before.is_some());
    let path = write_fixture(dir.path(), "bad.json", r#"{"items": []}"#);

    let err = engine
        .import_snapshot(&path)
        .await
        .expect_err("missing products must be rejected");
    assert!(matches!(err, MemoryError::ImportFormat(_)));
    assert_eq!(engine.store(), &before);
    assert_eq!(memory.storage().get_item(SNAPSHOT_KEY)?, durable_before);
    Ok(())
}

#[tokio::test]
async fn import_skips_invalid_records_and_overwrites_existing() -> Result<()> {
    let dir = TempDir::new()?;
    let mut engine = TestMemory::in_memory().open();
    seed(&mut engine);
    let existing = "rsl mtr 001|martillo de bola 16oz";
    let contents = products_json(serde_json::json!([
        {
            "key": existing,
            "alias": "RSL-MTR-001",
            "description": "Martillo de bola 16oz",
            "synonyms": ["hammer", "mazo", "martillo"],
            "usageCount": 9
        },
        {"key": "nuevo|producto", "alias": "Nuevo", "description": "Producto"},
        {"alias": "Sin clave", "description": "ignored"},
        {"key": "sin|descripcion", "alias": "Sin descripcion"}
    ]));
    let path = write_fixture(dir.path(), "import.json", &contents);

    assert_eq!(engine.import_snapshot(&path).await?, 2);
    assert_eq!(engine.len(), 4);
    let record = engine
        .store()
        .get(&ProductKey::from_raw(existing))
        .expect("existing record");
    assert_eq!(record.usage_count, 9);
    assert_eq!(record.synonyms.len(), 3);
    let added = engine
        .store()
        .get(&ProductKey::from_raw("nuevo|producto"))
        .expect("new record");
    assert_eq!(added.usage_count, 1);
    assert!(added.synonyms.is_empty());
    Ok(())
}

#[tokio::test]
async fn import_is_persisted() -> Result<()> {
    let dir = TempDir::new()?;
    let memory = TestMemory::in_memory();
    let mut engine = memory.open();
    let contents = products_json(serde_json::json!([
        {"key": "a|b", "alias": "A", "description": "B", "synonyms": ["x"]}
    ]));
    let path = write_fixture(dir.path(), "import.json", &contents);
    engine.import_snapshot(&path).await?;

    assert_eq!(memory.open().len(), 1);
    Ok(())
}

#[tokio::test]
async fn imported_records_are_deduplicated_and_counted() -> Result<()> {
    let dir = TempDir::new()?;
    let mut engine = TestMemory::in_memory().open();
    let contents = products_json(serde_json::json!([
        {
            "key": "a|b",
            "alias": "A",
            "description": "B",
            "synonyms": ["hammer", "hammer", "mazo"],
            "usageCount": 0
        }
    ]));
    let path = write_fixture(dir.path(), "dupes.json", &contents);
    assert_eq!(engine.import_snapshot(&path).await?, 1);

    let record = engine
        .store()
        .get(&ProductKey::from_raw("a|b"))
        .expect("imported record");
    assert_eq!(record.synonyms, vec!["hammer".to_string(), "mazo".to_string()]);
    assert_eq!(record.usage_count, 1);

    let csv = "Clave,Alias,Descripción,Sinónimos,Palabras Clave,Fecha Creación,Veces Usado\n\
        c|d,C,D,x; x; y,,,2\n";
    let path = write_fixture(dir.path(), "dupes.csv", csv);
    assert_eq!(engine.import_snapshot(&path).await?, 1);
    let record = engine
        .store()
        .get(&ProductKey::from_raw("c|d"))
        .expect("csv record");
    assert_eq!(record.synonyms, vec!["x".to_string(), "y".to_string()]);
    Ok(())
}
