//! The performance layer: the arpeggiator, the step sequencer and the plain keyboard voice, plus [`Performance`],
//! which routes MIDI and panel input to them and ticks them from the control loop.

mod arpeggiator;
pub use arpeggiator::*;

mod gate_cycle;
pub use gate_cycle::{
    EngineTiming, FASTEST_STEP_MICROS, GateCycle, GateEdge, GatePhase, StepTiming, step_micros_for_rate,
};

mod held_notes;
pub use held_notes::*;

mod keyboard;
pub use keyboard::*;

mod sequencer;
pub use sequencer::*;

use crate::{
    configuration::KeyMode,
    control_surface::{ControlChange, ControlInputs, ControlScanner, DigitalControl},
    midi::{self, MidiEvent},
    output::OutputStage,
    parameters::{self, ParameterStore},
    time_base::Micros,
};

/// Owns the performance engines and the parameters they read, and drives them from one control loop.
///
/// Incoming notes go to the sequencer track that is recording, if any; otherwise to the arpeggiator while it is
/// enabled; otherwise straight to the [`KeyboardVoice`].
#[derive(Clone, Debug, PartialEq)]
pub struct Performance<P> {
    params: P,
    arpeggiator: ArpeggiatorEngine,
    sequencer: StepSequencerEngine,
    keyboard: KeyboardVoice,
}

impl<P: ParameterStore> Performance<P> {
    /// Constructs a [`Performance`] with both engines idle.
    pub fn new(params: P, key_mode: KeyMode) -> Self {
        Self {
            params,
            arpeggiator: ArpeggiatorEngine::default(),
            sequencer: StepSequencerEngine::default(),
            keyboard: KeyboardVoice::new(key_mode),
        }
    }

    /// The parameter store.
    pub fn params(&self) -> &P {
        &self.params
    }

    /// The arpeggiator.
    pub fn arpeggiator(&self) -> &ArpeggiatorEngine {
        &self.arpeggiator
    }

    /// The step sequencer.
    pub fn sequencer(&self) -> &StepSequencerEngine {
        &self.sequencer
    }

    /// The keyboard voice.
    pub fn keyboard(&self) -> &KeyboardVoice {
        &self.keyboard
    }

    /// Changes the note priority of the keyboard voice.
    pub fn set_key_mode(&mut self, key_mode: KeyMode) {
        self.keyboard.set_key_mode(key_mode);
    }

    /// Acts on an incoming MIDI event.
    pub fn handle_midi(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn(note, _) => {
                if let Some(track) = self.sequencer.record_target() {
                    self.sequencer.capture_step(track, Step::Note(note));
                } else if self.arpeggiator.is_enabled() {
                    self.arpeggiator.note_on(note);
                } else {
                    self.keyboard.note_on(note);
                }
            }
            MidiEvent::NoteOff(note) => {
                self.arpeggiator.note_off(note);
                self.keyboard.note_off(note);
            }
            MidiEvent::AllNotesOff => {
                info!("All notes off");
                self.arpeggiator.all_notes_off();
                self.keyboard.all_notes_off();
            }
            MidiEvent::ControlChange(function, value) => match midi::parameter_for(function) {
                Some(id) => self.params.set(id, midi::scale_controller(value)),
                None => debug!("Ignoring unmapped controller {}", u8::from(function)),
            },
        }
    }

    /// Acts on a scanned panel change: potentiometers update their parameter, and presses of the performance buttons
    /// drive the engines. Releases and the other switches are ignored here.
    pub fn handle_change(&mut self, change: ControlChange) {
        if parameters::apply_change(&mut self.params, change) {
            return;
        }
        let ControlChange::Button {
            control,
            pressed: true,
        } = change
        else {
            return;
        };

        match control {
            DigitalControl::Button9 => {
                self.arpeggiator.toggle();
                // held keys now belong to the arpeggiator (or to nobody)
                self.keyboard.all_notes_off();
            }
            DigitalControl::Button12 => {
                if let Some(track) = self.sequencer.record_target() {
                    self.sequencer.capture_step(track, Step::Rest);
                }
            }
            DigitalControl::Button13 => self.toggle_recording(TrackId::One),
            DigitalControl::Button14 => self.toggle_playing(TrackId::One),
            DigitalControl::Button15 => self.toggle_recording(TrackId::Two),
            DigitalControl::Button16 => self.toggle_playing(TrackId::Two),
            _ => {}
        }
    }

    fn toggle_recording(&mut self, track: TrackId) {
        if self.sequencer.state(track) == TrackState::Recording {
            self.sequencer.stop_recording(track);
        } else {
            self.sequencer.start_recording(track);
        }
    }

    fn toggle_playing(&mut self, track: TrackId) {
        if self.sequencer.state(track) == TrackState::Playing {
            self.sequencer.stop(track);
        } else {
            self.sequencer.start_playing(track);
        }
    }

    /// Advances the keyboard voice and both engines to `now`.
    ///
    /// The voice is monophonic, so every engine writes to the same note CV and gate, in the order keyboard, arpeggiator,
    /// sequencer. Each engine only tracks the gate it raised itself: whichever engine writes last wins, and one engine's
    /// gate-off lowers the gate even while another engine's step is still sounding.
    pub fn tick(&mut self, now: Micros, out: &mut impl OutputStage) {
        self.keyboard.tick(out);
        self.arpeggiator.tick(now, &self.params, out);
        self.sequencer.tick(now, &self.params, out);
    }

    /// One pass of the control loop: scans the next slice of the panel, applies what changed, then ticks.
    pub fn poll<I: ControlInputs>(
        &mut self,
        now: Micros,
        scanner: &mut ControlScanner<I>,
        out: &mut impl OutputStage,
    ) {
        scanner.scan_once(now);
        for change in scanner.changes() {
            self.handle_change(change);
        }
        self.tick(now, out);
    }
}
