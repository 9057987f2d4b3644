//! Gemini backend for Studio Pandu
//!
//! Implements `pandu_core::ImageGenerator` over the `generateContent` REST endpoint:
//! character references go out as inline image parts ahead of the prompt, and the
//! first inline image of the first candidate comes back as a `data:` URL.

pub mod client;
pub mod wire;

pub use client::{classify_failure, GeminiClient, GeminiConfig};
