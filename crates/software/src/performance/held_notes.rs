//! Provides [`HeldNotes`], the keys currently depressed on the controller while neither performance engine is
//! consuming them. On a monophonic voice many keys might be held, but only one sounds; the
//! [`KeyMode`](crate::configuration::KeyMode) decides which.

use tinyvec::{ArrayVec, array_vec};
use wmidi::{Note, U7};

/// Per the General MIDI Level 2 specification, compliant devices "must be capable of supplying polyphony of
/// 32 or more allocated notes simultaneously." Thus, this is the capacity of [`HeldNotes`].
const GM2_SIMUL_NOTE_NUM: usize = 32;

/// The keys currently held, in the order they were pressed.
///
/// Internally this uses [`U7`] because [`tinyvec`] requires that items implement [`Default`], which [`Note`] doesn't.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeldNotes {
    data: ArrayVec<[U7; GM2_SIMUL_NOTE_NUM]>,
}

impl Default for HeldNotes {
    fn default() -> Self {
        Self::new()
    }
}

impl HeldNotes {
    /// Construct an empty `HeldNotes`.
    pub fn new() -> Self {
        Self { data: array_vec!() }
    }

    /// Registers a key press. Ignored when the key is (somehow) already held or when no space is left.
    pub fn press(&mut self, note: Note) {
        let u7 = U7::from_u8_lossy(note as u8);
        if self.data.len() != self.data.capacity() && !self.data.contains(&u7) {
            self.data.push(u7);
        }
    }

    /// Registers a key release. Returns `true` if the key was held.
    pub fn release(&mut self, note: Note) -> bool {
        let u7 = U7::from_u8_lossy(note as u8);
        let before = self.data.len();
        self.data.retain(|&n| n != u7);
        self.data.len() != before
    }

    /// Releases every key.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Determine if any key is held.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an [`Iterator`] over the held [`Note`]s, earliest press first.
    pub fn iter(&self) -> impl Iterator<Item = Note> + '_ {
        self.data.iter().map(|&i| Note::from(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord() -> HeldNotes {
        let mut notes = HeldNotes::new();
        notes.press(Note::E4);
        notes.press(Note::C4);
        notes.press(Note::G4);
        notes
    }

    #[test]
    fn press_appends_in_order() {
        let notes = chord();
        let mut iter = notes.iter();
        assert_eq!(Some(Note::E4), iter.next());
        assert_eq!(Some(Note::C4), iter.next());
        assert_eq!(Some(Note::G4), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn duplicate_press_is_ignored() {
        let expected = chord();
        let mut actual = chord();
        actual.press(Note::C4);
        assert_eq!(expected, actual, "Expected left but got right");
    }

    #[test]
    fn press_ignores_rather_than_overflow() {
        let mut notes = HeldNotes::new();
        for n in 0..GM2_SIMUL_NOTE_NUM as u8 {
            notes.press(Note::from_u8_lossy(40 + n));
        }
        notes.press(Note::C1);
        assert_eq!(GM2_SIMUL_NOTE_NUM, notes.iter().count());
        assert!(notes.iter().all(|n| n != Note::C1));
    }

    #[test]
    fn release() {
        let mut notes = chord();
        assert!(notes.release(Note::C4));
        assert!(!notes.release(Note::C4), "Second release of the same key is a no-op");
        assert_eq!(2, notes.iter().count());
        notes.clear();
        assert!(notes.is_empty());
    }
}
