//! The outbound side of the core: note, gate and trigger events for the CV/gate hardware.

mod keyboard;
pub use keyboard::*;

use wmidi::Note;

/// Receives the note and gate events the performance engines emit.
///
/// Implementations translate events into hardware signals: a pitch control voltage for the selected note, a gate held
/// high while the note sounds, and a short trigger pulse that restarts the envelope generators. Every method must
/// return promptly; they are called from the control loop.
pub trait OutputStage {
    /// Selects the note whose pitch the oscillators should track.
    fn note_select(&mut self, note: Note);

    /// Raises or lowers the gate.
    fn gate(&mut self, on: bool);

    /// Fires a trigger pulse.
    fn trigger(&mut self);
}
