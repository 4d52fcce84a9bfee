use shopdoc_render::{EngineConfig, EstimateRecord, InvoiceRecord, MemorySink, PaperFormat};
use shopdoc_runtime::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

fn engine(sink: &MemorySink) -> RenderEngine {
    RenderEngine::new(&EngineConfig::default())
        .unwrap()
        .with_sink(Arc::new(sink.clone()))
}

fn estimate(number: &str) -> DocumentRequest {
    let record = EstimateRecord {
        estimate_number: number.to_string(),
        ..Default::default()
    };
    DocumentRequest::estimate(record, PaperFormat::A4)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jobs_complete_and_report_in_order() {
    let sink = MemorySink::new();
    let options = WorkerOptions {
        deadline: Some(Duration::from_secs(60)),
        max_concurrent: 2,
    };
    let mut worker = RenderWorker::spawn(engine(&sink), options).unwrap();

    let mut submitted = HashSet::new();
    for i in 0..5 {
        submitted.insert(worker.submit(estimate(&format!("EST-{i}"))).unwrap());
    }
    let invoice = InvoiceRecord {
        invoice_number: "INV-1".into(),
        ..Default::default()
    };
    submitted.insert(
        worker
            .submit(DocumentRequest::invoice(invoice, PaperFormat::Thermal, None))
            .unwrap(),
    );

    let mut started = HashSet::new();
    let mut finished = HashMap::new();
    while finished.len() < submitted.len() {
        let update = worker.next_update().await.unwrap();
        let job = update.job().unwrap();
        if let RenderUpdate::Started { .. } = update {
            started.insert(job);
        } else {
            assert!(started.contains(&job), "final update before start");
            assert!(update.is_final());
            finished.insert(job, update);
        }
    }

    for update in finished.values() {
        match update {
            RenderUpdate::Complete { locator, page_count, .. } => {
                assert_eq!(*page_count, 1);
                assert!(sink.get(&locator.relative_path).await.is_some());
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }
    assert_eq!(sink.paths().await.len(), 6);

    let remaining = worker.shutdown().await;
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_prepare_command_acknowledged() {
    let sink = MemorySink::new();
    let mut worker = RenderWorker::spawn(engine(&sink), WorkerOptions::default()).unwrap();

    worker.prepare().unwrap();
    assert!(matches!(worker.next_update().await, Some(RenderUpdate::Prepared)));
    assert_eq!(sink.prepared_directories().await.len(), 3);
}

#[tokio::test]
async fn test_job_ids_are_unique() {
    let sink = MemorySink::new();
    let worker = RenderWorker::spawn(engine(&sink), WorkerOptions::default()).unwrap();

    let first = worker.submit(estimate("EST-A")).unwrap();
    let second = worker.submit(estimate("EST-B")).unwrap();
    assert_ne!(first, second);
    assert!(second > first);

    let updates = worker.shutdown().await;
    let complete = updates
        .iter()
        .filter(|u| matches!(u, RenderUpdate::Complete { .. }))
        .count();
    assert_eq!(complete, 2);
}

#[test]
fn test_spawn_rejects_bad_options() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();
    let sink = MemorySink::new();
    let options = WorkerOptions {
        max_concurrent: 0,
        ..Default::default()
    };
    assert!(matches!(
        RenderWorker::spawn(engine(&sink), options),
        Err(RuntimeError::Options(_))
    ));
}
