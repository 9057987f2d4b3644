//! Studio session
//!
//! Everything the user has entered plus the current result list. Lives for one run
//! of the front end; nothing is persisted.

use crate::error::StudioError;
use crate::prompts::PromptList;
use crate::queue::GenerationQueue;
use crate::roster::CharacterRoster;
use crate::types::{BatchReport, GeneratedImage, ImageId, ImageStatus, UiAspectRatio};

/// Application state
#[derive(Debug, Clone, Default)]
pub struct StudioSession {
    /// Character slots
    pub roster: CharacterRoster,
    /// Prompt rows
    pub prompts: PromptList,
    /// Requested framing
    pub aspect_ratio: UiAspectRatio,
    results: Vec<GeneratedImage>,
    is_generating: bool,
}

impl StudioSession {
    /// Create a fresh session
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With aspect ratio
    #[inline]
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: UiAspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Results of the latest batch
    #[inline]
    #[must_use]
    pub fn results(&self) -> &[GeneratedImage] {
        &self.results
    }

    /// Check if a batch is running
    #[inline]
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    /// Generate one image per valid prompt
    ///
    /// Replaces the previous results with a fresh pending list, then runs the queue.
    /// The generating flag is lowered when the batch ends or its future is dropped;
    /// a dropped batch leaves its results as they stood.
    ///
    /// # Errors
    /// - `StudioError::NoPrompts` when every prompt is blank (results untouched)
    /// - `StudioError::AlreadyGenerating` while a batch is running
    pub async fn generate_all(
        &mut self,
        queue: &GenerationQueue,
    ) -> Result<BatchReport, StudioError> {
        if self.is_generating {
            return Err(StudioError::AlreadyGenerating);
        }

        let prompts = self.prompts.valid_prompts();
        if prompts.is_empty() {
            return Err(StudioError::NoPrompts);
        }

        let references = self.roster.selected_references();
        self.results = GenerationQueue::plan(&prompts);

        let _flag = GeneratingFlag::raise(&mut self.is_generating);
        queue
            .run(&mut self.results, &references, self.aspect_ratio)
            .await
    }

    /// Number of successful results
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ImageStatus::Success)
            .count()
    }

    /// Look up a result together with its position
    #[must_use]
    pub fn preview(&self, id: &ImageId) -> Option<(usize, &GeneratedImage)> {
        self.results.iter().enumerate().find(|(_, r)| r.id == *id)
    }

    /// One-line status for the results header
    #[must_use]
    pub fn status_line(&self) -> String {
        if self.is_generating {
            "Generating your storyboards...".to_string()
        } else {
            format!("{} images ready", self.success_count())
        }
    }
}

/// Holds the generating flag up for the lifetime of a batch
struct GeneratingFlag<'a>(&'a mut bool);

impl<'a> GeneratingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for GeneratingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generator::{GenerateImageParams, ImageGenerator};
    use crate::types::{CharacterId, ReferenceImage};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records the params it receives
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<GenerateImageParams>>,
    }

    #[async_trait]
    impl ImageGenerator for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn generate(&self, params: GenerateImageParams) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(params);
            Ok("data:image/png;base64,AA==".to_string())
        }
    }

    /// Never answers
    struct Stalled;

    #[async_trait]
    impl ImageGenerator for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn generate(&self, _params: GenerateImageParams) -> Result<String, GenerationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn running_batch_rejects_another() {
        let queue = GenerationQueue::new(Arc::new(Recorder::default()));
        let mut session = StudioSession::new();
        session.prompts.update(0, "a scene").unwrap();
        session.is_generating = true;

        assert_eq!(session.status_line(), "Generating your storyboards...");
        let err = session.generate_all(&queue).await.unwrap_err();
        assert!(matches!(err, StudioError::AlreadyGenerating));
        assert!(session.results().is_empty());
    }

    #[tokio::test]
    async fn dropped_batch_lowers_flag() {
        let mut session = StudioSession::new();
        session.prompts.update(0, "first").unwrap();
        session.prompts.push("second").unwrap();

        let stalled = GenerationQueue::new(Arc::new(Stalled));
        let outcome =
            tokio::time::timeout(Duration::from_millis(20), session.generate_all(&stalled)).await;
        assert!(outcome.is_err());
        assert!(!session.is_generating());
        assert_eq!(session.results()[0].status, ImageStatus::Loading);
        assert_eq!(session.results()[1].status, ImageStatus::Pending);

        let queue = GenerationQueue::new(Arc::new(Recorder::default()));
        let report = session.generate_all(&queue).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(session.status_line(), "2 images ready");
    }

    #[tokio::test]
    async fn blank_prompts_rejected_without_touching_results() {
        let mut session = StudioSession::new();
        let queue = GenerationQueue::new(Arc::new(Recorder::default()));

        let err = session.generate_all(&queue).await.unwrap_err();
        assert!(matches!(err, StudioError::NoPrompts));
        assert!(session.results().is_empty());
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn sends_selected_references_and_ratio() {
        let recorder = Arc::new(Recorder::default());
        let queue = GenerationQueue::new(recorder.clone());

        let mut session = StudioSession::new().with_aspect_ratio(UiAspectRatio::Custom);
        session
            .roster
            .attach(CharacterId::slot(2), ReferenceImage::new("Ym9i", "image/jpeg"))
            .unwrap();
        session.prompts.update(0, "bob on a boat").unwrap();
        session.prompts.push("   ").unwrap();
        session.prompts.push("bob on a bike").unwrap();

        let report = session.generate_all(&queue).await.unwrap();
        assert_eq!(report.total, 2);
        assert!(report.is_clean());
        assert_eq!(session.status_line(), "2 images ready");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].prompt, "bob on a bike");
        assert_eq!(seen[0].reference_images.len(), 1);
        assert_eq!(seen[0].reference_images[0].mime_type, "image/jpeg");
        assert_eq!(seen[0].aspect_ratio, UiAspectRatio::Custom);
    }

    #[tokio::test]
    async fn new_batch_replaces_results() {
        let queue = GenerationQueue::new(Arc::new(Recorder::default()));
        let mut session = StudioSession::new();
        session.prompts.update(0, "first").unwrap();
        session.generate_all(&queue).await.unwrap();
        let first_id = session.results()[0].id;

        session.prompts.update(0, "second").unwrap();
        session.generate_all(&queue).await.unwrap();
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.results()[0].prompt, "second");
        assert!(session.preview(&first_id).is_none());

        let id = session.results()[0].id;
        let (index, image) = session.preview(&id).unwrap();
        assert_eq!(index, 0);
        assert!(image.is_downloadable());
    }
}
