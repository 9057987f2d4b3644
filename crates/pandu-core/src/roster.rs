//! Character roster
//!
//! Fixed set of reference slots. Uploading into a slot selects it; only slots that are
//! both selected and filled contribute references to a request.

use crate::error::StudioError;
use crate::types::{Character, CharacterId, ReferenceImage};

/// Number of character slots
pub const MAX_CHARACTERS: usize = 4;

/// The four character slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRoster {
    slots: Vec<Character>,
}

impl CharacterRoster {
    /// Create the initial roster: four empty slots, the first one selected
    #[must_use]
    pub fn new() -> Self {
        let slots = (1..=MAX_CHARACTERS as u8)
            .map(|n| {
                let mut c = Character::empty(CharacterId::slot(n));
                c.selected = n == 1;
                c
            })
            .collect();
        Self { slots }
    }

    /// All slots in order
    #[inline]
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.slots
    }

    /// Look up a slot
    ///
    /// # Errors
    /// `StudioError::UnknownCharacter` if no such slot
    pub fn get(&self, id: CharacterId) -> Result<&Character, StudioError> {
        self.slots
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StudioError::UnknownCharacter(id.to_string()))
    }

    fn get_mut(&mut self, id: CharacterId) -> Result<&mut Character, StudioError> {
        self.slots
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StudioError::UnknownCharacter(id.to_string()))
    }

    /// Change a slot's display name
    ///
    /// # Errors
    /// `StudioError::UnknownCharacter` if no such slot
    pub fn rename(&mut self, id: CharacterId, name: impl Into<String>) -> Result<(), StudioError> {
        self.get_mut(id)?.name = name.into();
        Ok(())
    }

    /// Flip a slot's selection
    ///
    /// # Errors
    /// `StudioError::UnknownCharacter` if no such slot
    pub fn toggle(&mut self, id: CharacterId) -> Result<bool, StudioError> {
        let c = self.get_mut(id)?;
        c.selected = !c.selected;
        Ok(c.selected)
    }

    /// Set a slot's selection
    ///
    /// # Errors
    /// `StudioError::UnknownCharacter` if no such slot
    pub fn set_selected(&mut self, id: CharacterId, selected: bool) -> Result<(), StudioError> {
        self.get_mut(id)?.selected = selected;
        Ok(())
    }

    /// Store a reference image in a slot and select it
    ///
    /// # Errors
    /// `StudioError::UnknownCharacter` if no such slot
    pub fn attach(&mut self, id: CharacterId, reference: ReferenceImage) -> Result<(), StudioError> {
        let c = self.get_mut(id)?;
        tracing::debug!(slot = %id, mime = %reference.mime_type, "reference attached");
        c.reference = Some(reference);
        c.selected = true;
        Ok(())
    }

    /// Remove a slot's reference image
    ///
    /// # Errors
    /// `StudioError::UnknownCharacter` if no such slot
    pub fn clear(&mut self, id: CharacterId) -> Result<Option<ReferenceImage>, StudioError> {
        Ok(self.get_mut(id)?.reference.take())
    }

    /// First slot without a reference image
    #[must_use]
    pub fn next_free_slot(&self) -> Option<CharacterId> {
        self.slots
            .iter()
            .find(|c| c.reference.is_none())
            .map(|c| c.id)
    }

    /// Attach to the next free slot, optionally naming it
    ///
    /// # Errors
    /// `StudioError::RosterFull` if every slot has an image
    pub fn attach_next(
        &mut self,
        name: Option<String>,
        reference: ReferenceImage,
    ) -> Result<CharacterId, StudioError> {
        let id = self
            .next_free_slot()
            .ok_or(StudioError::RosterFull(MAX_CHARACTERS))?;
        if let Some(name) = name {
            self.rename(id, name)?;
        }
        self.attach(id, reference)?;
        Ok(id)
    }

    /// References that go with a request: selected slots with an image, in slot order
    #[must_use]
    pub fn selected_references(&self) -> Vec<ReferenceImage> {
        self.slots
            .iter()
            .filter(|c| c.is_active())
            .filter_map(|c| c.reference.clone())
            .collect()
    }
}

impl Default for CharacterRoster {
    fn default() -> Self {
        Self::new()
    }
}
