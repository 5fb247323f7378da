//! The arpeggiator: plays the held notes one after another, in the order they were pressed, at the panel's step rate.

use super::gate_cycle::{EngineTiming, Gate, GateCycle, GateEdge, GatePhase};
use crate::{output::OutputStage, parameters::ParameterStore, time_base::Micros};
use tinyvec::ArrayVec;
use wmidi::{Note, U7};

/// Most notes the arpeggiator records. Further notes are ignored rather than replacing recorded ones.
pub const ARP_CAPACITY: usize = 24;

/// Where the arpeggiator is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArpState {
    /// Notes pass the arpeggiator by.
    Disabled,
    /// Enabled with no notes held; the next note-on starts a fresh recording.
    Armed,
    /// Notes are held: the buffer keeps recording new notes and plays back what it holds.
    Playing,
}

/// Records held notes and steps through them with a fixed gate duty cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct ArpeggiatorEngine {
    state: ArpState,
    /// Recorded notes, oldest first. [`U7`] stands in for [`Note`] because tinyvec needs `Default` items.
    notes: ArrayVec<[U7; ARP_CAPACITY]>,
    /// Index of the note sounding (or last sounded). Always `< notes.len()` while notes are recorded.
    cursor: usize,
    timing: EngineTiming,
    cycle: GateCycle,
    gate: Gate,
}

impl Default for ArpeggiatorEngine {
    fn default() -> Self {
        Self::new(EngineTiming::default())
    }
}

impl ArpeggiatorEngine {
    /// Constructs a disabled [`ArpeggiatorEngine`].
    pub fn new(timing: EngineTiming) -> Self {
        Self {
            state: ArpState::Disabled,
            notes: ArrayVec::new(),
            cursor: 0,
            timing,
            cycle: GateCycle::new(),
            gate: Gate::default(),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ArpState {
        self.state
    }

    /// Returns `true` unless the arpeggiator is disabled.
    pub fn is_enabled(&self) -> bool {
        self.state != ArpState::Disabled
    }

    /// Returns `true` while notes are held and being played back.
    pub fn is_playing(&self) -> bool {
        self.state == ArpState::Playing
    }

    /// The recorded notes, oldest first.
    pub fn notes(&self) -> impl Iterator<Item = Note> + '_ {
        self.notes.iter().map(|&n| Note::from(n))
    }

    /// Index of the note currently (or last) sounded.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Phase of the running gate cycle.
    pub fn phase(&self) -> GatePhase {
        self.cycle.phase()
    }

    /// Turns the arpeggiator on. Has no effect if it is already on.
    pub fn enable(&mut self) {
        if self.state == ArpState::Disabled {
            info!("Arpeggiator enabled");
            self.state = ArpState::Armed;
        }
    }

    /// Turns the arpeggiator off and forgets the recorded notes. A gate left high is lowered on the next tick.
    pub fn disable(&mut self) {
        if self.state != ArpState::Disabled {
            info!("Arpeggiator disabled");
            self.stop();
            self.state = ArpState::Disabled;
        }
    }

    /// Flips between [`enable`](Self::enable) and [`disable`](Self::disable).
    pub fn toggle(&mut self) {
        if self.is_enabled() {
            self.disable();
        } else {
            self.enable();
        }
    }

    /// Records a note. The first note after the arpeggiator was armed starts a fresh buffer with this note at index 0;
    /// later notes are appended while space remains.
    pub fn note_on(&mut self, note: Note) {
        let u7 = U7::from_u8_lossy(note as u8);
        match self.state {
            ArpState::Disabled => {}
            ArpState::Armed => {
                self.notes.clear();
                self.notes.push(u7);
                self.cursor = 0;
                self.cycle.restart();
                self.state = ArpState::Playing;
                info!("Arpeggiator recording from note {}", u8::from(u7));
            }
            ArpState::Playing if self.notes.len() < ARP_CAPACITY => {
                self.notes.push(u7);
                debug!("Arpeggiator recorded note {} at index {}", u8::from(u7), self.notes.len() - 1);
            }
            ArpState::Playing => {
                warn!("Arpeggiator full; ignoring note {}", u8::from(u7));
            }
        }
    }

    /// Removes the first recorded occurrence of `note`, keeping the remaining notes in order. Removing the last note
    /// stops playback and re-arms the arpeggiator.
    ///
    /// When the removed note sits at or before the cursor, the cursor steps back by one (wrapping to the last note), so
    /// the step after the note currently sounding is still the one that followed it before the removal.
    pub fn note_off(&mut self, note: Note) {
        if self.state != ArpState::Playing {
            return;
        }
        let u7 = U7::from_u8_lossy(note as u8);
        let Some(index) = self.notes.iter().position(|&n| n == u7) else {
            return;
        };
        self.notes.remove(index);

        let len = self.notes.len();
        if len == 0 {
            info!("Arpeggiator released");
            self.stop();
        } else if !self.cycle.is_running() {
            self.cursor = 0;
        } else if index <= self.cursor {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    /// Forgets every recorded note ("all notes off"). The arpeggiator stays enabled.
    pub fn all_notes_off(&mut self) {
        if self.state == ArpState::Playing {
            info!("Arpeggiator cleared by all notes off");
            self.stop();
        }
    }

    /// Advances the gate cycle to `now`, reading the step rate from `params`.
    ///
    /// At the start of each step the cursor moves on (wrapping) and the note under it is selected, the gate raised and
    /// the trigger fired; once the gate share of the step has passed, the gate is lowered. The very first step after
    /// recording starts plays index 0. Nothing is emitted while no notes are held, except the single gate-off owed
    /// by an engine that was stopped with its gate high.
    pub fn tick(&mut self, now: Micros, params: &impl ParameterStore, out: &mut impl OutputStage) {
        if self.state != ArpState::Playing || self.notes.is_empty() {
            self.gate.close(out);
            return;
        }

        let timing = self.timing.resolve(params);
        while let Some(edge) = self.cycle.advance(now, timing) {
            match edge {
                GateEdge::Start => {
                    self.cursor = 0;
                    self.sound(out);
                }
                GateEdge::Rise => {
                    self.cursor = (self.cursor + 1) % self.notes.len();
                    self.sound(out);
                }
                GateEdge::Fall => self.gate.close(out),
            }
        }
    }

    fn sound(&mut self, out: &mut impl OutputStage) {
        let note = Note::from(self.notes[self.cursor]);
        debug!("Arpeggiator step {}: note {}", self.cursor, u8::from(note));
        self.gate.open(note, out);
    }

    /// Empties the buffer and re-arms. The gate, if high, is left for the next tick to lower.
    fn stop(&mut self) {
        self.notes.clear();
        self.cursor = 0;
        self.cycle.restart();
        self.state = ArpState::Armed;
    }
}
