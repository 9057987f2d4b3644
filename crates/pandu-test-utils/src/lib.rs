//! Testing utilities for Studio Pandu workspace
//!
//! Scripted generators, fixtures, and session builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pandu_core::{
    CharacterId, GenerateImageParams, GenerationError, ImageGenerator, ReferenceImage,
    StudioSession,
};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Smallest valid PNG: 1x1 transparent pixel
pub const TINY_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn tiny_png_base64() -> String {
    STANDARD.encode(TINY_PNG)
}

pub fn png_data_url() -> String {
    format!("data:image/png;base64,{}", tiny_png_base64())
}

pub fn png_reference() -> ReferenceImage {
    ReferenceImage::new(tiny_png_base64(), "image/png")
}

/// Session with the given prompts and a reference in slot 1
pub fn session_with_prompts(prompts: &[&str]) -> StudioSession {
    let mut session = StudioSession::new();
    session
        .roster
        .attach(CharacterId::slot(1), png_reference())
        .unwrap();
    for (i, prompt) in prompts.iter().enumerate() {
        if i == 0 {
            session.prompts.update(0, *prompt).unwrap();
        } else {
            session.prompts.push(*prompt).unwrap();
        }
    }
    session
}

/// Generator that replays a script of outcomes, one per call
///
/// Once the script runs out every call succeeds with `png_data_url()`.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<GenerateImageParams>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self) -> Self {
        self.script.lock().push_back(Ok(png_data_url()));
        self
    }

    pub fn then_err(self, error: GenerationError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Params of every call so far, in order
    pub fn calls(&self) -> Vec<GenerateImageParams> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, params: GenerateImageParams) -> Result<String, GenerationError> {
        self.calls.lock().push(params);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(png_data_url()))
    }
}
