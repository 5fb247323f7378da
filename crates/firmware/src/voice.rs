//! Drives the voice's CV/gate inputs: the keyboard CV from DAC channel 1, and the gate and S-trigger from GPIO.

use defmt::*;
use embassy_stm32::{
    dac::{DacCh1, DacCh2, Value},
    gpio::Output,
    mode::Async,
    peripherals::DAC1,
};
use measurements::Voltage;
use source_voice_lib::{output::{KeyboardCv, OutputStage}, time_base::Micros};
use wmidi::Note;

/// How long the trigger output stays high after [`OutputStage::trigger`].
const TRIGGER_MICROS: u32 = 1_000;

/// Helper function to convert a keyboard CV to a <abbr name="digital-to-analog converter">DAC</abbr> value.
///
/// The reference voltage and resolution are those of the F767's on-chip DAC. Scaling the output to the voice's
/// exponential converters is left to the analog gain stage after it.
fn voltage_to_dac_value(voltage: Voltage) -> Value {
    const REFERENCE_VOLTS: f64 = 10.0 / 3.0;
    const FULL_SCALE: f64 = 4095.0;

    let fraction = (voltage.as_volts() / REFERENCE_VOLTS).clamp(0.0, 1.0);
    // casting to u16 truncates, which is well inside the DAC's resolution
    Value::Bit12Right((fraction * FULL_SCALE) as u16)
}

/// The hardware [`OutputStage`].
pub struct Voice {
    cv: DacCh1<'static, DAC1, Async>,
    /// Unused, but dropping it would disable the DAC; see <https://github.com/embassy-rs/embassy/issues/4577>.
    _spare_cv: DacCh2<'static, DAC1, Async>,
    gate: Output<'static>,
    trigger: Output<'static>,
    keyboard: KeyboardCv,
    trigger_state: TriggerState,
}

#[derive(Clone, Copy, PartialEq)]
enum TriggerState {
    Low,
    /// Raised since the last call to [`Voice::service`].
    Raised,
    High(Micros),
}

impl Voice {
    /// Constructs a [`Voice`] with every output low.
    pub fn new(
        cv: DacCh1<'static, DAC1, Async>,
        spare_cv: DacCh2<'static, DAC1, Async>,
        mut gate: Output<'static>,
        mut trigger: Output<'static>,
    ) -> Self {
        gate.set_low();
        trigger.set_low();
        Self {
            cv,
            _spare_cv: spare_cv,
            gate,
            trigger,
            // three octaves at one volt per octave fit under the DAC's reference voltage
            keyboard: KeyboardCv::new(Note::C2..=Note::C5, Voltage::from_volts(1.0)),
            trigger_state: TriggerState::Low,
        }
    }

    /// Ends the trigger pulse once it has lasted long enough. Call once per control loop iteration.
    pub fn service(&mut self, now: Micros) {
        match self.trigger_state {
            TriggerState::Low => {}
            TriggerState::Raised => self.trigger_state = TriggerState::High(now),
            TriggerState::High(since) => {
                if now.has_elapsed(since, TRIGGER_MICROS) {
                    self.trigger.set_low();
                    self.trigger_state = TriggerState::Low;
                }
            }
        }
    }
}

impl OutputStage for Voice {
    fn note_select(&mut self, note: Note) {
        if !self.keyboard.can_voice(note) {
            debug!("Note {} is out of range; folding it by octaves", note.to_str());
        }
        let voltage = self.keyboard.voltage(note);
        let value = voltage_to_dac_value(voltage);
        trace!("Sending {} to DAC for note {}", value, note.to_str());
        self.cv.set(value);
    }

    fn gate(&mut self, on: bool) {
        if on {
            self.gate.set_high();
        } else {
            self.gate.set_low();
        }
    }

    fn trigger(&mut self) {
        self.trigger.set_high();
        self.trigger_state = TriggerState::Raised;
    }
}
