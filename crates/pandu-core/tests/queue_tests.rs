//! Batch behaviour against scripted backends.
//!
//! Covers the dispatch rules end to end through `StudioSession`:
//! - results come back in prompt order, one request at a time
//! - ordinary failures are recorded and the batch continues
//! - an authorization failure stops the batch and leaves the rest pending

use pandu_core::{
    GenerationError, GenerationQueue, ImageStatus, QueueEvent, StudioError, UiAspectRatio,
    AUTHORIZATION_ABORT_MESSAGE,
};
use pandu_test_utils::{png_data_url, session_with_prompts, ScriptedGenerator};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::test]
async fn prompts_dispatched_in_order() {
    let backend = Arc::new(ScriptedGenerator::new());
    let queue = GenerationQueue::new(backend.clone());
    let mut session = session_with_prompts(&["one", "two", "three"]);

    let report = session.generate_all(&queue).await.unwrap();

    let sent: Vec<String> = backend.calls().into_iter().map(|c| c.prompt).collect();
    assert_eq!(sent, vec!["one", "two", "three"]);
    assert_eq!(report.succeeded, 3);
    assert!(session
        .results()
        .iter()
        .all(|r| r.image_url.as_deref() == Some(png_data_url().as_str())));
}

#[tokio::test]
async fn ordinary_failure_does_not_stop_batch() {
    let backend = Arc::new(
        ScriptedGenerator::new()
            .then_ok()
            .then_err(GenerationError::NoImageData)
            .then_err(GenerationError::Api {
                status: 500,
                message: "internal".into(),
            }),
    );
    let queue = GenerationQueue::new(backend.clone());
    let mut session = session_with_prompts(&["a", "b", "c", "d"]);

    let report = session.generate_all(&queue).await.unwrap();

    let statuses: Vec<ImageStatus> = session.results().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ImageStatus::Success,
            ImageStatus::Error,
            ImageStatus::Error,
            ImageStatus::Success
        ]
    );
    assert_eq!(backend.call_count(), 4);
    assert_eq!(report.failed, 2);
    assert!(report.aborted.is_none());
    assert_eq!(
        session.results()[1].error.as_deref(),
        Some("No image data found in response")
    );
}

#[tokio::test]
async fn forbidden_stops_batch() {
    let backend = Arc::new(ScriptedGenerator::new().then_ok().then_err(GenerationError::Api {
        status: 403,
        message: "The caller does not have permission".into(),
    }));
    let queue = GenerationQueue::new(backend.clone());
    let mut session = session_with_prompts(&["a", "b", "c"]);

    let report = session.generate_all(&queue).await.unwrap();

    assert_eq!(backend.call_count(), 2);
    assert_eq!(session.results()[0].status, ImageStatus::Success);
    assert_eq!(session.results()[1].status, ImageStatus::Error);
    assert_eq!(session.results()[2].status, ImageStatus::Pending);
    assert_eq!(report.not_attempted, 1);
    assert_eq!(report.aborted.as_deref(), Some(AUTHORIZATION_ABORT_MESSAGE));
    assert!(!session.is_generating());
    assert_eq!(session.status_line(), "1 images ready");
}

#[tokio::test]
async fn permission_denied_on_first_prompt_sends_nothing_else() {
    let backend = Arc::new(
        ScriptedGenerator::new().then_err(GenerationError::PermissionDenied("PERMISSION_DENIED".into())),
    );
    let queue = GenerationQueue::new(backend.clone());
    let mut session = session_with_prompts(&["a", "b"]);

    let report = session.generate_all(&queue).await.unwrap();

    assert_eq!(backend.call_count(), 1);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.not_attempted, 1);
}

#[tokio::test]
async fn references_and_ratio_reach_backend() {
    let backend = Arc::new(ScriptedGenerator::new());
    let queue = GenerationQueue::new(backend.clone());
    let mut session = session_with_prompts(&["scene"]).with_aspect_ratio(UiAspectRatio::Custom);

    session.generate_all(&queue).await.unwrap();

    let call = &backend.calls()[0];
    assert_eq!(call.reference_images.len(), 1);
    assert_eq!(call.reference_images[0].mime_type, "image/png");
    assert_eq!(call.aspect_ratio.to_api().as_str(), "1:1");
}

#[tokio::test]
async fn blank_batch_never_reaches_backend() {
    let backend = Arc::new(ScriptedGenerator::new());
    let queue = GenerationQueue::new(backend.clone());
    let mut session = session_with_prompts(&["   ", ""]);

    let err = session.generate_all(&queue).await.unwrap_err();
    assert!(matches!(err, StudioError::NoPrompts));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn abort_event_emitted() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let backend = Arc::new(ScriptedGenerator::new().then_err(GenerationError::MissingApiKey));
    let queue = GenerationQueue::new(backend).with_events(tx);
    let mut session = session_with_prompts(&["a", "b"]);

    session.generate_all(&queue).await.unwrap();
    drop(queue);

    let mut aborted_at = None;
    let mut finished = None;
    while let Some(event) = rx.recv().await {
        match event {
            QueueEvent::Aborted { index, .. } => aborted_at = Some(index),
            QueueEvent::Finished(report) => finished = Some(report),
            _ => {}
        }
    }
    assert_eq!(aborted_at, Some(0));
    assert_eq!(finished.map(|r| r.not_attempted), Some(1));
}
