use super::{HeldNotes, gate_cycle::Gate};
use crate::{configuration::KeyMode, output::OutputStage};
use wmidi::Note;

/// Plays held keys straight through to the voice when neither engine is consuming them.
///
/// Key presses and releases only update the held set; [`tick`](Self::tick) then reconciles the output with the note the
/// [`KeyMode`] selects. The first key opens the gate and fires the trigger, a change of note while keys stay held is
/// played legato (note select only), and releasing the last key closes the gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyboardVoice {
    held: HeldNotes,
    key_mode: KeyMode,
    sounding: Option<Note>,
    gate: Gate,
}

impl KeyboardVoice {
    /// Constructs a silent [`KeyboardVoice`].
    pub fn new(key_mode: KeyMode) -> Self {
        Self {
            held: HeldNotes::new(),
            key_mode,
            sounding: None,
            gate: Gate::default(),
        }
    }

    /// The note priority in effect.
    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    /// Changes the note priority; takes effect on the next tick.
    pub fn set_key_mode(&mut self, key_mode: KeyMode) {
        self.key_mode = key_mode;
    }

    /// The note currently sounding, if any.
    pub fn sounding(&self) -> Option<Note> {
        self.sounding
    }

    /// Registers a key press.
    pub fn note_on(&mut self, note: Note) {
        self.held.press(note);
    }

    /// Registers a key release.
    pub fn note_off(&mut self, note: Note) {
        self.held.release(note);
    }

    /// Releases every key.
    pub fn all_notes_off(&mut self) {
        self.held.clear();
    }

    /// Brings the output in line with the held keys.
    pub fn tick(&mut self, out: &mut impl OutputStage) {
        let selected = self.key_mode.select(&self.held);
        match (self.sounding, selected) {
            (None, Some(note)) => self.gate.open(note, out),
            (Some(previous), Some(note)) if previous != note => out.note_select(note),
            (Some(_), None) => self.gate.close(out),
            _ => {}
        }
        self.sounding = selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{OutputEvent, RecordingOutput, note_events};
    use std::vec;

    #[test]
    fn first_key_opens_gate() {
        let mut voice = KeyboardVoice::new(KeyMode::Bottom);
        let mut out = RecordingOutput::default();
        voice.note_on(Note::C4);
        voice.tick(&mut out);
        assert_eq!(note_events(Note::C4), out.take());
        voice.tick(&mut out);
        assert!(out.take().is_empty(), "Nothing changed, nothing emitted");
    }

    #[test]
    fn priority_change_is_legato() {
        let mut voice = KeyboardVoice::new(KeyMode::Bottom);
        let mut out = RecordingOutput::default();
        voice.note_on(Note::E4);
        voice.tick(&mut out);
        out.take();

        voice.note_on(Note::C4);
        voice.tick(&mut out);
        assert_eq!(vec![OutputEvent::NoteSelect(Note::C4)], out.take());

        voice.note_on(Note::G4);
        voice.tick(&mut out);
        assert!(out.take().is_empty(), "A higher key doesn't displace the bottom one");

        voice.note_off(Note::C4);
        voice.tick(&mut out);
        assert_eq!(vec![OutputEvent::NoteSelect(Note::E4)], out.take());
        assert_eq!(Some(Note::E4), voice.sounding());
    }

    #[test]
    fn last_key_released_closes_gate() {
        let mut voice = KeyboardVoice::new(KeyMode::Last);
        let mut out = RecordingOutput::default();
        voice.note_on(Note::E4);
        voice.note_on(Note::C4);
        voice.tick(&mut out);
        assert_eq!(note_events(Note::C4), out.take());

        voice.all_notes_off();
        voice.tick(&mut out);
        assert_eq!(vec![OutputEvent::Gate(false)], out.take());
        assert_eq!(None, voice.sounding());
    }

    #[test]
    fn key_mode_change_applies_on_tick() {
        let mut voice = KeyboardVoice::new(KeyMode::Top);
        let mut out = RecordingOutput::default();
        voice.note_on(Note::E4);
        voice.note_on(Note::C4);
        voice.tick(&mut out);
        assert_eq!(note_events(Note::E4), out.take());

        voice.set_key_mode(KeyMode::Bottom);
        voice.tick(&mut out);
        assert_eq!(vec![OutputEvent::NoteSelect(Note::C4)], out.take());
    }
}
