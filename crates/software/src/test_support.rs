//! Recording fakes of the collaborator traits, shared by the unit tests.

use crate::{
    configuration::{Persistence, SettingsSlot},
    control_surface::{AnalogControl, ControlInputs, DIGITAL_INPUTS, MUX_LINES, MuxBank},
    output::OutputStage,
    parameters::{PanelParameters, ParamId, ParameterStore},
    time_base::Micros,
};
use std::vec::Vec;
use wmidi::Note;

/// A front end whose potentiometers and buttons are plain arrays.
#[derive(Debug)]
pub struct FakeInputs {
    pub selected: Option<u8>,
    pub analog: [[u16; MUX_LINES as usize]; 2],
    pub buttons: [bool; DIGITAL_INPUTS as usize],
    /// Alternately added to and subtracted from each conversion.
    pub noise: u16,
    pub conversions: u32,
    pub buttons_read: Vec<u8>,
}

impl Default for FakeInputs {
    fn default() -> Self {
        Self {
            selected: None,
            analog: [[0; MUX_LINES as usize]; 2],
            // Default only covers arrays of up to 32 elements
            buttons: [false; DIGITAL_INPUTS as usize],
            noise: 0,
            conversions: 0,
            buttons_read: Vec::new(),
        }
    }
}

impl FakeInputs {
    pub fn set_knob(&mut self, control: AnalogControl, value: u16) {
        let address = control.address();
        self.analog[bank_index(address.bank)][usize::from(address.line)] = value;
    }
}

fn bank_index(bank: MuxBank) -> usize {
    match bank {
        MuxBank::One => 0,
        MuxBank::Two => 1,
    }
}

impl ControlInputs for FakeInputs {
    fn select_line(&mut self, line: u8) {
        self.selected = Some(line);
    }

    fn convert(&mut self, bank: MuxBank) -> u16 {
        let line = self.selected.expect("a line should be selected before converting");
        let value = self.analog[bank_index(bank)][usize::from(line)];
        self.conversions += 1;
        if self.conversions % 2 == 0 {
            value.saturating_add(self.noise)
        } else {
            value.saturating_sub(self.noise)
        }
    }

    fn read_button(&mut self, bit: u8) -> bool {
        self.buttons_read.push(bit);
        self.buttons[usize::from(bit)]
    }
}

/// Everything an engine asked the output stage to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputEvent {
    NoteSelect(Note),
    Gate(bool),
    Trigger,
}

#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub events: Vec<OutputEvent>,
}

impl RecordingOutput {
    /// Returns and forgets the events recorded so far.
    pub fn take(&mut self) -> Vec<OutputEvent> {
        core::mem::take(&mut self.events)
    }
}

impl OutputStage for RecordingOutput {
    fn note_select(&mut self, note: Note) {
        self.events.push(OutputEvent::NoteSelect(note));
    }

    fn gate(&mut self, on: bool) {
        self.events.push(OutputEvent::Gate(on));
    }

    fn trigger(&mut self) {
        self.events.push(OutputEvent::Trigger);
    }
}

/// The events a sounding step produces.
pub fn note_events(note: Note) -> Vec<OutputEvent> {
    std::vec![
        OutputEvent::NoteSelect(note),
        OutputEvent::Gate(true),
        OutputEvent::Trigger
    ]
}

/// Byte-addressed settings memory, erased to 0xFF like a fresh EEPROM.
#[derive(Debug)]
pub struct MemoryPersistence {
    pub bytes: [u8; 8],
    pub writes: Vec<(SettingsSlot, u8)>,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self {
            bytes: [0xFF; 8],
            writes: Vec::new(),
        }
    }
}

impl Persistence for MemoryPersistence {
    fn load_byte(&self, slot: SettingsSlot) -> u8 {
        self.bytes[slot.offset()]
    }

    fn store_byte(&mut self, slot: SettingsSlot, value: u8) {
        self.bytes[slot.offset()] = value;
        self.writes.push((slot, value));
    }
}

/// Panel parameters with the step rate knob set to `raw`.
pub fn params_with_rate(raw: u16) -> PanelParameters {
    let mut params = PanelParameters::default();
    params.set(ParamId::Knob(AnalogControl::LfoRate), raw);
    params
}

/// Rate knob position that yields a 250ms step.
pub const RATE_250_MS: u16 = 823;

/// Calls `tick` at every timestamp in `times`, collecting what was emitted at each one.
pub fn tick_at<F>(times: &[u32], mut tick: F) -> Vec<(u32, Vec<OutputEvent>)>
where
    F: FnMut(Micros, &mut RecordingOutput),
{
    let mut output = RecordingOutput::default();
    times
        .iter()
        .map(|&t| {
            tick(Micros(t), &mut output);
            (t, output.take())
        })
        .collect()
}
