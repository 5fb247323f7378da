use crate::performance::HeldNotes;
use num_derive::{FromPrimitive, ToPrimitive};
use wmidi::Note;

/// Trait for selecting which [`Note`] to play when many keys are held.
pub trait ProvideNote {
    /// Selects the [`Note`] to sound from `notes`, which are ordered from earliest to latest press.
    fn provide_note(&self, notes: impl Iterator<Item = Note>) -> Option<Note>;
}

/// Determines which note the monophonic voice sounds when more than one key is held.
///
/// When a note is released, it is replaced by the next note (if any) based on the selected mode. The discriminants are
/// the values persisted in [`SettingsSlot::KeyMode`](super::SettingsSlot::KeyMode).
#[derive(Clone, Copy, Debug, Default, FromPrimitive, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyMode {
    /// The highest held note sounds.
    Top,
    /// The lowest held note sounds.
    #[default]
    Bottom,
    /// The most recently pressed note sounds.
    Last,
}
impl super::CycleConfig for KeyMode {}

impl KeyMode {
    /// Selects the note to sound from the keys in `notes`.
    pub fn select(&self, notes: &HeldNotes) -> Option<Note> {
        self.provide_note(notes.iter())
    }
}

impl ProvideNote for KeyMode {
    fn provide_note(&self, notes: impl Iterator<Item = Note>) -> Option<Note> {
        match self {
            KeyMode::Top => notes.max(),
            KeyMode::Bottom => notes.min(),
            KeyMode::Last => notes.last(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord() -> HeldNotes {
        let mut notes = HeldNotes::new();
        notes.press(Note::E4);
        notes.press(Note::G4);
        notes.press(Note::B4);
        notes.press(Note::C4);

        notes
    }

    #[test]
    fn top() {
        assert_eq!(
            Some(Note::B4),
            KeyMode::Top.select(&chord()),
            "Expected left but got right"
        );
    }

    #[test]
    fn bottom() {
        assert_eq!(
            Some(Note::C4),
            KeyMode::Bottom.select(&chord()),
            "Expected left but got right"
        );
    }

    #[test]
    fn last() {
        let mut notes = chord();
        notes.press(Note::F4);
        assert_eq!(
            Some(Note::F4),
            KeyMode::Last.select(&notes),
            "Expected left but got right"
        );
    }

    #[test]
    fn no_keys() {
        assert_eq!(None, KeyMode::Last.select(&HeldNotes::new()));
    }
}
