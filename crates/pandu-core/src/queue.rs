//! Generation queue
//!
//! Sequential dispatch of one request per prompt:
//! - one request in flight at a time, in prompt order
//! - each result moves pending -> loading -> success | error
//! - an authorization failure stops the batch; later results stay pending
//! - no retries
//!
//! Progress is reported through an optional channel so a front end can render
//! status changes while the batch runs.

use crate::error::{StudioError, AUTHORIZATION_ABORT_MESSAGE};
use crate::generator::{GenerateImageParams, ImageGenerator};
use crate::types::{BatchReport, GeneratedImage, ImageId, ImageStatus, ReferenceImage, UiAspectRatio};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Progress notifications emitted while a batch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// Batch accepted
    Started { total: usize },
    /// A result changed status
    StatusChanged {
        index: usize,
        id: ImageId,
        status: ImageStatus,
    },
    /// Batch stopped early
    Aborted { index: usize, reason: String },
    /// Batch over
    Finished(BatchReport),
}

/// Sequential dispatcher over an `ImageGenerator`
#[derive(Clone)]
pub struct GenerationQueue {
    generator: Arc<dyn ImageGenerator>,
    events: Option<mpsc::UnboundedSender<QueueEvent>>,
}

impl std::fmt::Debug for GenerationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationQueue")
            .field("generator", &self.generator.name())
            .field("events", &self.events.is_some())
            .finish()
    }
}

impl GenerationQueue {
    /// Create a queue over a backend
    #[inline]
    #[must_use]
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            events: None,
        }
    }

    /// Report progress on a channel
    #[inline]
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<QueueEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Backend name
    #[inline]
    #[must_use]
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// One pending result per prompt
    #[must_use]
    pub fn plan(prompts: &[String]) -> Vec<GeneratedImage> {
        prompts.iter().map(GeneratedImage::pending).collect()
    }

    /// Run the batch over `results`, updating them in place
    ///
    /// # Errors
    /// `StudioError::InvalidTransition` if a result is not `Pending` when its turn comes.
    /// Backend failures are recorded on the result, not returned.
    pub async fn run(
        &self,
        results: &mut [GeneratedImage],
        references: &[ReferenceImage],
        aspect_ratio: UiAspectRatio,
    ) -> Result<BatchReport, StudioError> {
        let start = Instant::now();
        tracing::info!(
            total = results.len(),
            references = references.len(),
            aspect_ratio = %aspect_ratio,
            backend = self.generator.name(),
            "starting generation batch"
        );
        self.emit(QueueEvent::Started {
            total: results.len(),
        });

        let mut aborted = None;

        for (index, item) in results.iter_mut().enumerate() {
            item.start()?;
            self.emit_status(index, item);

            let params = GenerateImageParams::new(item.prompt.clone(), aspect_ratio)
                .with_references(references.to_vec());

            match self.generator.generate(params).await {
                Ok(image_url) => {
                    item.succeed(image_url)?;
                    tracing::debug!(index, id = %item.id, "generation succeeded");
                    self.emit_status(index, item);
                }
                Err(err) => {
                    tracing::error!(index, id = %item.id, error = %err, "generation failed");
                    item.fail(err.to_string())?;
                    self.emit_status(index, item);

                    if err.is_authorization() {
                        tracing::warn!(index, "authorization failure, aborting batch");
                        self.emit(QueueEvent::Aborted {
                            index,
                            reason: AUTHORIZATION_ABORT_MESSAGE.to_string(),
                        });
                        aborted = Some(AUTHORIZATION_ABORT_MESSAGE.to_string());
                        break;
                    }
                }
            }
        }

        let report = BatchReport::from_results(results, aborted);
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            not_attempted = report.not_attempted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generation batch finished"
        );
        self.emit(QueueEvent::Finished(report.clone()));
        Ok(report)
    }

    fn emit_status(&self, index: usize, item: &GeneratedImage) {
        self.emit(QueueEvent::StatusChanged {
            index,
            id: item.id,
            status: item.status,
        });
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(tx) = &self.events {
            // receiver may have gone away; progress is best-effort
            let _ = tx.send(event);
        }
    }
}
