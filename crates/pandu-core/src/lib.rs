//! Pandu Core - consistent-character image generation
//!
//! The state and control flow behind Studio Pandu:
//! - Holds up to four character references and a batch of prompts
//! - Dispatches one generation request per prompt, strictly in order
//! - Tracks each result through pending, loading, success or error
//! - Stops the batch on authorization failures
//! - Writes successful images to disk
//!
//! # Example
//!
//! ```rust,ignore
//! use pandu_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<dyn ImageGenerator>) -> Result<(), StudioError> {
//! let mut session = StudioSession::new();
//! session.roster.attach(CharacterId::slot(1), load_reference("hero.png").await?)?;
//! session.prompts.update(0, "The hero crossing a rope bridge at dusk")?;
//!
//! let queue = GenerationQueue::new(backend);
//! let report = session.generate_all(&queue).await?;
//! println!("{} of {} images ready", report.succeeded, report.total);
//!
//! download_all(session.results(), "out").await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod prompts;
pub mod queue;
pub mod reference;
pub mod roster;
pub mod session;
pub mod types;

// Re-exports for convenience
pub use config::{ApiConfig, StudioConfig};
pub use error::{GenerationError, StudioError, AUTHORIZATION_ABORT_MESSAGE};
pub use export::{decode_data_url, download, download_all, filename_for_today, generate_filename};
pub use generator::{GenerateImageParams, ImageGenerator};
pub use prompts::{PromptList, MAX_PROMPTS};
pub use queue::{GenerationQueue, QueueEvent};
pub use reference::load_reference;
pub use roster::{CharacterRoster, MAX_CHARACTERS};
pub use session::StudioSession;
pub use types::{
    AspectRatio, AspectRatioChoice, BatchReport, Character, CharacterId, GeneratedImage, ImageId,
    ImageStatus, ReferenceImage, UiAspectRatio, ASPECT_RATIO_CHOICES,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Pandu Core
    pub use crate::{
        download_all, load_reference, BatchReport, CharacterId, GenerateImageParams,
        GenerationError, GenerationQueue, ImageGenerator, ImageStatus, StudioConfig,
        StudioError, StudioSession, UiAspectRatio,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
