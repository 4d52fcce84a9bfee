use chrono::{TimeZone, Utc};
use shopdoc_render::output::{FileNameHint, FixedClock};
use shopdoc_render::*;
use std::sync::Arc;
use tempfile::TempDir;

fn hint() -> FileNameHint<'static> {
    FileNameHint {
        kind: DocumentKind::Estimate,
        number: "EST/5",
        format: PaperFormat::A5,
        copy_label: "STANDARD",
    }
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()))
}

#[tokio::test]
async fn test_filesystem_sink_writes_under_category() {
    let dir = TempDir::new().unwrap();
    let writer = OutputWriter::new("http://localhost:5000", Arc::new(FileSystemSink::new(dir.path())))
        .with_clock(clock());

    let locator = writer.write(&hint(), b"%PDF-1.7".to_vec()).await.unwrap();

    let expected = dir
        .path()
        .join("uploads/estimates/estimate_EST-5_A5_STANDARD_1700000000000.pdf");
    assert_eq!(locator.stored_at, expected);
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.7");
    assert!(!expected.with_file_name(format!("{}.part", locator.file_name)).exists());
    assert_eq!(
        locator.url,
        "http://localhost:5000/uploads/estimates/estimate_EST-5_A5_STANDARD_1700000000000.pdf"
    );
}

#[tokio::test]
async fn test_prepare_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let writer = OutputWriter::new("http://localhost", Arc::new(FileSystemSink::new(dir.path())));

    writer.prepare().await;
    writer.prepare().await;

    for category in ["jobsheets", "invoices", "estimates"] {
        assert!(dir.path().join("uploads").join(category).is_dir());
    }
}

#[tokio::test]
async fn test_prepare_swallows_errors() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();

    // Creating directories under a regular file fails; prepare only logs it
    let writer = OutputWriter::new("http://localhost", Arc::new(FileSystemSink::new(&blocker)));
    writer.prepare().await;
}

#[tokio::test]
async fn test_write_failure_is_fatal_and_leaves_nothing() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("storage");
    std::fs::write(&blocker, "file").unwrap();

    let writer = OutputWriter::new("http://localhost", Arc::new(FileSystemSink::new(&blocker)))
        .with_clock(clock());
    let result = writer.write(&hint(), b"%PDF".to_vec()).await;

    match result {
        Err(RenderError::Output { path, .. }) => {
            assert!(path.ends_with("estimate_EST-5_A5_STANDARD_1700000000000.pdf"));
            assert!(!path.exists());
        }
        other => panic!("Expected output error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_engine_writes_real_files() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        storage_root: dir.path().to_path_buf(),
        fonts_directory: dir.path().join("fonts"),
        logos_directory: dir.path().join("logos"),
        ..Default::default()
    };
    let engine = RenderEngine::new(&config).unwrap().with_clock(clock());
    engine.prepare().await;

    let record = EstimateRecord {
        estimate_number: "EST-1".into(),
        ..Default::default()
    };
    let generated = engine
        .generate(DocumentRequest::estimate(record, PaperFormat::Thermal2))
        .await
        .unwrap();

    let bytes = std::fs::read(&generated.locator.stored_at).unwrap();
    assert_eq!(bytes.len(), generated.byte_len);
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert_eq!(generated.locator.file_name, "estimate_EST-1_THERMAL-2_STANDARD_1700000000000.pdf");
}
