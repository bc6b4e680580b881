//! Orchestrator integration tests.
//!
//! Tests verify:
//! - Trigger filtering (event name, key suffix) with no side effects
//! - Original lookup, backfill skip and not-found handling
//! - Upload selection and destination keys
//! - Scratch cleanup after success, failure and cancellation
//! - Partial upload reporting

use std::time::Duration;

use zoomify_tiler::error::{IoError, ProcessError, TileError};
use zoomify_tiler::event::{EventNameMatch, S3Event};
use zoomify_tiler::orchestrator::{OrchestratorConfig, TileOutcome};
use zoomify_tiler::tile::ZoomifyTiler;

use super::test_utils::{
    is_png, jpeg_image, png_image, Harness, ListRequest, MockObjectStore, MockTiler, BUCKET,
};

const PUT: &str = "ObjectCreated:Put";
const MARKER: &str = "albums/7/tiles/";

fn album_store() -> MockObjectStore {
    MockObjectStore::new()
        .with_object("albums/7/", "")
        .with_object("albums/7/display-1.jpg", "display")
        .with_object("albums/7/original-1.jpg", "original bytes")
        .with_object(MARKER, "")
}

fn expect_tiled(outcome: TileOutcome) -> zoomify_tiler::TileReport {
    match outcome {
        TileOutcome::Tiled(report) => report,
        other => panic!("expected a tiled outcome, got {:?}", other),
    }
}

// =============================================================================
// Trigger Filter
// =============================================================================

#[tokio::test]
async fn test_key_without_tiles_suffix_is_ignored() {
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(album_store(), tiler);

    for key in ["albums/7/original-1.jpg", "albums/7/tiles", "albums/7/tiles/x.png"] {
        let event = S3Event::single(PUT, BUCKET, key);
        let outcomes = harness.orchestrator.handle_event(&event).await.unwrap();
        assert_eq!(outcomes, vec![TileOutcome::Ignored]);
    }

    assert_eq!(harness.store.call_count().await, 0);
    assert!(calls.lock().unwrap().is_empty());
    assert!(harness.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_other_event_names_are_ignored() {
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(album_store(), tiler);

    for name in [
        "ObjectCreated:Copy",
        "ObjectCreated:CompleteMultipartUpload",
        "ObjectRemoved:Delete",
        "",
    ] {
        let event = S3Event::single(name, BUCKET, MARKER);
        let outcomes = harness.orchestrator.handle_event(&event).await.unwrap();
        assert_eq!(outcomes, vec![TileOutcome::Ignored]);
    }

    assert_eq!(harness.store.call_count().await, 0);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_s3_prefixed_event_name_depends_on_match_rule() {
    let event = S3Event::single("s3:ObjectCreated:Put", BUCKET, MARKER);

    let lenient = Harness::new(album_store(), MockTiler::new());
    let outcomes = lenient.orchestrator.handle_event(&event).await.unwrap();
    assert!(matches!(outcomes[0], TileOutcome::Tiled(_)));

    let strict = Harness::with_config(
        album_store(),
        MockTiler::new(),
        OrchestratorConfig::default().with_event_name_match(EventNameMatch::Exact),
    );
    let outcomes = strict.orchestrator.handle_event(&event).await.unwrap();
    assert_eq!(outcomes, vec![TileOutcome::Ignored]);
    assert_eq!(strict.store.call_count().await, 0);

    let exact = S3Event::single(PUT, BUCKET, MARKER);
    let outcomes = strict.orchestrator.handle_event(&exact).await.unwrap();
    assert!(matches!(outcomes[0], TileOutcome::Tiled(_)));
}

#[tokio::test]
async fn test_empty_document_yields_no_outcomes() {
    let harness = Harness::new(album_store(), MockTiler::new());
    let event = S3Event::from_json(r#"{"Records":[]}"#).unwrap();

    assert!(harness.orchestrator.handle_event(&event).await.unwrap().is_empty());
    assert_eq!(harness.store.call_count().await, 0);
}

// =============================================================================
// Original Lookup
// =============================================================================

#[tokio::test]
async fn test_original_is_downloaded_and_tiled() {
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(album_store(), tiler);

    let event = S3Event::single(PUT, BUCKET, MARKER);
    let mut outcomes = harness.orchestrator.handle_event(&event).await.unwrap();
    let report = expect_tiled(outcomes.remove(0));

    assert_eq!(report.bucket, BUCKET);
    assert_eq!(report.key, MARKER);
    assert_eq!(report.original_key, "albums/7/original-1.jpg");
    assert_eq!(harness.store.get_count(), 1);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, b"original bytes");
    assert!(calls[0].1.starts_with(harness.scratch.path()));
    assert!(calls[0].1.ends_with("tiled"));
}

#[tokio::test]
async fn test_listing_uses_prefix_as_marker_and_bounded_page() {
    let harness = Harness::new(album_store(), MockTiler::new());

    let event = S3Event::single(PUT, BUCKET, MARKER);
    harness.orchestrator.handle_event(&event).await.unwrap();

    assert_eq!(
        harness.store.list_requests().await,
        vec![ListRequest {
            bucket: BUCKET.to_string(),
            prefix: "albums/7/".to_string(),
            start_after: Some("albums/7/".to_string()),
            max_keys: 5,
        }]
    );
}

#[tokio::test]
async fn test_original_outside_first_page_is_not_found() {
    let store = MockObjectStore::new()
        .with_object("albums/7/a-1.jpg", "x")
        .with_object("albums/7/a-2.jpg", "x")
        .with_object("albums/7/a-3.jpg", "x")
        .with_object("albums/7/a-4.jpg", "x")
        .with_object("albums/7/a-5.jpg", "x")
        .with_object("albums/7/original-1.jpg", "x");
    let harness = Harness::new(store, MockTiler::new());

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::OriginalNotFound { .. }));
}

#[tokio::test]
async fn test_first_original_in_key_order_wins() {
    let store = MockObjectStore::new()
        .with_object("albums/7/original-b.jpg", "second")
        .with_object("albums/7/original-a.jpg", "first");
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(store, tiler);

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();

    assert_eq!(
        expect_tiled(outcomes.remove(0)).original_key,
        "albums/7/original-a.jpg"
    );
    assert_eq!(calls.lock().unwrap()[0].0, b"first");
}

#[tokio::test]
async fn test_backfill_original_is_skipped() {
    let store = MockObjectStore::new()
        .with_object("albums/7/backfill-original-1.jpg", "legacy")
        .with_object("albums/7/display.jpg", "d");
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(store, tiler);

    let outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![TileOutcome::Skipped {
            key: MARKER.to_string(),
            original_key: "albums/7/backfill-original-1.jpg".to_string(),
        }]
    );
    assert_eq!(harness.store.get_count(), 0);
    assert_eq!(harness.store.put_count(), 0);
    assert!(calls.lock().unwrap().is_empty());
    assert!(harness.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_missing_original_is_not_found() {
    let store = MockObjectStore::new().with_object("albums/7/display.jpg", "d");
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(store, tiler);

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    match err {
        ProcessError::OriginalNotFound { bucket, prefix } => {
            assert_eq!(bucket, BUCKET);
            assert_eq!(prefix, "albums/7/");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(harness.store.put_count(), 0);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_url_encoded_marker_key_is_decoded() {
    let store = MockObjectStore::new().with_object("summer trip/original-1.jpg", "x");
    let harness = Harness::new(store, MockTiler::new());

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, "summer+trip/tiles/"))
        .await
        .unwrap();

    let report = expect_tiled(outcomes.remove(0));
    assert_eq!(report.key, "summer trip/tiles/");
    assert!(harness
        .store
        .object("summer trip/tiles/ImageProperties.xml")
        .await
        .is_some());
}

// =============================================================================
// Storage Failures
// =============================================================================

#[tokio::test]
async fn test_listing_failure_propagates() {
    let harness = Harness::new(album_store().with_failing_lists(), MockTiler::new());

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Storage(IoError::Connection(_))));
}

#[tokio::test]
async fn test_download_failure_propagates() {
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(album_store().with_failing_gets(), tiler);

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Storage(IoError::S3(_))));
    assert!(calls.lock().unwrap().is_empty());
    assert!(harness.scratch_entries().is_empty());
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_only_xml_and_png_are_uploaded_under_marker_key() {
    let harness = Harness::new(album_store(), MockTiler::new());

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();
    let report = expect_tiled(outcomes.remove(0));

    assert_eq!(report.planned, 4);
    assert_eq!(report.uploaded, 4);
    assert!(report.failures.is_empty());
    assert!(report.is_complete());

    assert_eq!(
        harness.store.keys_under(MARKER).await,
        vec![
            "albums/7/tiles/".to_string(),
            "albums/7/tiles/ImageProperties.xml".to_string(),
            "albums/7/tiles/TileGroup0/0-0-0.png".to_string(),
            "albums/7/tiles/TileGroup0/1-0-0.png".to_string(),
            "albums/7/tiles/TileGroup0/1-1-0.png".to_string(),
        ]
    );

    let xml = harness
        .store
        .object("albums/7/tiles/ImageProperties.xml")
        .await
        .unwrap();
    assert_eq!(xml.content_type.as_deref(), Some("application/xml"));
    assert_eq!(xml.body.as_ref(), b"<IMAGE_PROPERTIES />");

    let tile = harness
        .store
        .object("albums/7/tiles/TileGroup0/1-1-0.png")
        .await
        .unwrap();
    assert_eq!(tile.content_type.as_deref(), Some("image/png"));
    assert_eq!(tile.body.as_ref(), b"png-2");
}

#[tokio::test]
async fn test_failed_uploads_are_reported() {
    let store = album_store().with_failing_put("albums/7/tiles/TileGroup0/1-0-0.png");
    let harness = Harness::new(store, MockTiler::new());

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();
    let report = expect_tiled(outcomes.remove(0));

    assert_eq!(report.planned, 4);
    assert_eq!(report.uploaded, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key, "albums/7/tiles/TileGroup0/1-0-0.png");
    assert!(report.failures[0].message.contains("rejected"));
    assert!(!report.is_complete());

    // Remaining uploads still went through
    assert!(harness
        .store
        .object("albums/7/tiles/TileGroup0/1-1-0.png")
        .await
        .is_some());
    assert!(report.scratch_removed);
    assert!(harness.scratch_entries().is_empty());
}

// =============================================================================
// Scratch Cleanup
// =============================================================================

#[tokio::test]
async fn test_scratch_removed_after_success() {
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(album_store(), tiler);

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();

    assert!(expect_tiled(outcomes.remove(0)).scratch_removed);
    assert!(harness.scratch_entries().is_empty());

    let output = calls.lock().unwrap()[0].1.clone();
    assert!(!output.exists());
    let scratch_dir = output.parent().unwrap();
    assert!(scratch_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("7-"));
}

#[tokio::test]
async fn test_scratch_removed_after_tiling_failure() {
    let tiler = MockTiler::failing(TileError::Decode {
        message: "unsupported".to_string(),
    });
    let harness = Harness::new(album_store(), tiler);

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Tiling(TileError::Decode { .. })));
    assert_eq!(harness.store.put_count(), 0);
    assert!(harness.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_tiler_panic_becomes_task_error() {
    let harness = Harness::new(album_store(), MockTiler::panicking());

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Tiling(TileError::Task(_))));
    assert!(harness.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_scratch_removed_when_invocation_is_dropped_mid_tile() {
    let tiler = MockTiler::slow(Duration::from_millis(300));
    let calls = tiler.calls();
    let harness = Harness::new(album_store(), tiler);
    let event = S3Event::single(PUT, BUCKET, MARKER);

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        harness.orchestrator.handle_event(&event),
    )
    .await;
    assert!(result.is_err(), "invocation should still be tiling");

    // The detached tiler finishes writing well before this
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(
        harness.scratch_entries().is_empty(),
        "left behind: {:?}",
        harness.scratch_entries()
    );
    assert_eq!(harness.store.put_count(), 0);
}

#[tokio::test]
async fn test_concurrent_invocations_for_same_image_do_not_share_scratch() {
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(album_store(), tiler);
    let event = S3Event::single(PUT, BUCKET, MARKER);

    let (a, b) = tokio::join!(
        harness.orchestrator.handle_event(&event),
        harness.orchestrator.handle_event(&event)
    );
    assert!(a.unwrap()[0].is_complete());
    assert!(b.unwrap()[0].is_complete());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].1, calls[1].1);
    assert!(harness.scratch_entries().is_empty());
}

// =============================================================================
// Multiple Records
// =============================================================================

#[tokio::test]
async fn test_records_processed_in_order_until_failure() {
    let store = album_store().with_object("albums/8/display.jpg", "no original here");
    let tiler = MockTiler::new();
    let calls = tiler.calls();
    let harness = Harness::new(store, tiler);

    let json = serde_json::json!({
        "Records": [
            { "eventName": "ObjectRemoved:Delete", "s3": { "bucket": { "name": BUCKET }, "object": { "key": MARKER } } },
            { "eventName": PUT, "s3": { "bucket": { "name": BUCKET }, "object": { "key": MARKER } } },
            { "eventName": PUT, "s3": { "bucket": { "name": BUCKET }, "object": { "key": "albums/8/tiles/" } } },
            { "eventName": PUT, "s3": { "bucket": { "name": BUCKET }, "object": { "key": MARKER } } }
        ]
    })
    .to_string();
    let event = S3Event::from_json(&json).unwrap();

    let err = harness.orchestrator.handle_event(&event).await.unwrap_err();
    assert!(matches!(err, ProcessError::OriginalNotFound { ref prefix, .. } if prefix == "albums/8/"));

    // Only the second record was tiled; the fourth never ran
    assert_eq!(calls.lock().unwrap().len(), 1);
}

// =============================================================================
// Real Tiler
// =============================================================================

#[tokio::test]
async fn test_end_to_end_with_zoomify_tiler() {
    let store = MockObjectStore::new().with_object("albums/7/original-1.png", png_image(300, 200));
    let harness = Harness::new(store, ZoomifyTiler::new());

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();
    let report = expect_tiled(outcomes.remove(0));

    assert_eq!((report.width, report.height), (300, 200));
    assert_eq!(report.tiers, 2);
    assert_eq!(report.tiles_written, 3);
    assert_eq!(report.uploaded, 4);

    assert_eq!(
        harness.store.keys_under(MARKER).await,
        vec![
            "albums/7/tiles/ImageProperties.xml".to_string(),
            "albums/7/tiles/TileGroup0/0-0-0.png".to_string(),
            "albums/7/tiles/TileGroup0/1-0-0.png".to_string(),
            "albums/7/tiles/TileGroup0/1-1-0.png".to_string(),
        ]
    );

    let xml = harness
        .store
        .object("albums/7/tiles/ImageProperties.xml")
        .await
        .unwrap();
    let xml = String::from_utf8(xml.body.to_vec()).unwrap();
    assert!(xml.contains("WIDTH=\"300\""));
    assert!(xml.contains("HEIGHT=\"200\""));
    assert!(xml.contains("NUMTILES=\"3\""));

    let edge = harness
        .store
        .object("albums/7/tiles/TileGroup0/1-1-0.png")
        .await
        .unwrap();
    assert!(is_png(&edge.body));
    let edge = image::load_from_memory(&edge.body).unwrap();
    assert_eq!((edge.width(), edge.height()), (44, 200));

    assert!(harness.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_end_to_end_jpeg_original() {
    let store = MockObjectStore::new().with_object("albums/7/original-1.jpg", jpeg_image(64, 64));
    let harness = Harness::new(store, ZoomifyTiler::new());

    let mut outcomes = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap();
    let report = expect_tiled(outcomes.remove(0));

    assert_eq!(report.tiers, 1);
    assert_eq!(report.uploaded, 2);
}

#[tokio::test]
async fn test_end_to_end_undecodable_original() {
    let store = MockObjectStore::new().with_object("albums/7/original-1.jpg", "not an image");
    let harness = Harness::new(store, ZoomifyTiler::new());

    let err = harness
        .orchestrator
        .handle_event(&S3Event::single(PUT, BUCKET, MARKER))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Tiling(TileError::Decode { .. })));
    assert_eq!(harness.store.put_count(), 0);
    assert!(harness.scratch_entries().is_empty());
}
