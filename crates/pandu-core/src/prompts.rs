//! Prompt list
//!
//! Editable list of scene descriptions. Never empty: removing the last entry leaves a
//! single blank prompt behind.

use crate::error::StudioError;

/// Maximum number of prompts in one batch
pub const MAX_PROMPTS: usize = 20;

/// Ordered prompt list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptList {
    prompts: Vec<String>,
}

impl PromptList {
    /// Create a list with one blank prompt
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            prompts: vec![String::new()],
        }
    }

    /// Build from existing prompt texts
    ///
    /// # Errors
    /// `StudioError::TooManyPrompts` when more than `MAX_PROMPTS` are given
    pub fn from_prompts<I, S>(prompts: I) -> Result<Self, StudioError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prompts: Vec<String> = prompts.into_iter().map(Into::into).collect();
        if prompts.len() > MAX_PROMPTS {
            return Err(StudioError::TooManyPrompts(MAX_PROMPTS));
        }
        if prompts.is_empty() {
            return Ok(Self::new());
        }
        Ok(Self { prompts })
    }

    /// All prompts, including blank ones
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.prompts
    }

    /// Number of prompt rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Check if another prompt can be added
    #[inline]
    #[must_use]
    pub fn can_add(&self) -> bool {
        self.prompts.len() < MAX_PROMPTS
    }

    /// Append a blank prompt
    ///
    /// # Errors
    /// `StudioError::TooManyPrompts` at capacity
    pub fn add(&mut self) -> Result<usize, StudioError> {
        self.push(String::new())
    }

    /// Append a prompt with text, returning its index
    ///
    /// # Errors
    /// `StudioError::TooManyPrompts` at capacity
    pub fn push(&mut self, text: impl Into<String>) -> Result<usize, StudioError> {
        if !self.can_add() {
            return Err(StudioError::TooManyPrompts(MAX_PROMPTS));
        }
        self.prompts.push(text.into());
        Ok(self.prompts.len() - 1)
    }

    /// Replace a prompt's text
    ///
    /// # Errors
    /// `StudioError::PromptIndex` if out of range
    pub fn update(&mut self, index: usize, text: impl Into<String>) -> Result<(), StudioError> {
        let len = self.prompts.len();
        let slot = self
            .prompts
            .get_mut(index)
            .ok_or(StudioError::PromptIndex { index, len })?;
        *slot = text.into();
        Ok(())
    }

    /// Remove a prompt; the last one is replaced by a blank prompt
    ///
    /// # Errors
    /// `StudioError::PromptIndex` if out of range
    pub fn remove(&mut self, index: usize) -> Result<String, StudioError> {
        if index >= self.prompts.len() {
            return Err(StudioError::PromptIndex {
                index,
                len: self.prompts.len(),
            });
        }
        let removed = self.prompts.remove(index);
        if self.prompts.is_empty() {
            self.prompts.push(String::new());
        }
        Ok(removed)
    }

    /// Prompts with visible text, in order, untrimmed
    #[must_use]
    pub fn valid_prompts(&self) -> Vec<String> {
        self.prompts
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect()
    }
}

impl Default for PromptList {
    fn default() -> Self {
        Self::new()
    }
}
