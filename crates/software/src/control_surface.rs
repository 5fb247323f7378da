//! Scanning of the panel's potentiometers and buttons.
//!
//! The panel has far more controls than the microcontroller has pins: 32 potentiometer lines are read through two
//! 16-channel analog multiplexers and 48 buttons/switches through a chain of shift registers. [`ControlScanner`] spreads
//! the work across calls to [`ControlScanner::scan_once`], one multiplexer line per call, so a single call stays short and
//! other duties of the control loop can interleave. Only changes leave the scanner; raw samples never do.

mod analog;
mod channel;
mod debounce;

pub use analog::ADC_MAX;
pub use channel::*;

use crate::time_base::{self, Micros};
use analog::AnalogChannel;
use debounce::Debouncer;
use embassy_time::Duration;
use tinyvec::ArrayVec;

/// Most changes the scanner holds before they are drained.
///
/// A single call to [`ControlScanner::scan_once`] produces at most five changes (two potentiometers and three buttons),
/// so this only fills up if the consumer stops draining.
pub const CHANGE_QUEUE_LEN: usize = 16;

/// Hardware front end the scanner reads through.
pub trait ControlInputs {
    /// Drives the address lines shared by both analog multiplexers.
    fn select_line(&mut self, line: u8);

    /// Performs a single analog conversion on the output of `bank`, for the currently selected line.
    fn convert(&mut self, bank: MuxBank) -> u16;

    /// Samples position `bit` of the shift-register chain. `true` means pressed (or switched on).
    fn read_button(&mut self, bit: u8) -> bool;
}

/// Tuning of the scanner's filters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScannerConfig {
    /// Smallest change in a potentiometer reading that is reported. Values below 1 are treated as 1.
    pub quantization_step: u16,
    /// Conversions averaged into each potentiometer reading. Values below 1 are treated as 1.
    pub oversampling: u8,
    /// How long a button must hold its new level before the transition is reported.
    pub debounce: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            quantization_step: 10,
            oversampling: 16,
            debounce: Duration::from_millis(30),
        }
    }
}

/// A change notification produced by the scanner.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlChange {
    /// A potentiometer settled on a new value, `0..=ADC_MAX`.
    Knob {
        /// The potentiometer.
        control: AnalogControl,
        /// Its new value.
        value: u16,
    },
    /// A button or switch changed level.
    Button {
        /// The button.
        control: DigitalControl,
        /// `true` when pressed.
        pressed: bool,
    },
}

// tinyvec requires Default for its items; the value is never observed
impl Default for ControlChange {
    fn default() -> Self {
        Self::Knob {
            control: AnalogControl::KbGlide,
            value: 0,
        }
    }
}

/// Round-robin scanner over every control on the panel.
pub struct ControlScanner<I> {
    inputs: I,
    config: ScannerConfig,
    /// The multiplexer line the next call will read.
    line: u8,
    analog: [AnalogChannel; AnalogControl::COUNT],
    digital: [Debouncer; DIGITAL_INPUTS as usize],
    pending: ArrayVec<[ControlChange; CHANGE_QUEUE_LEN]>,
}

impl<I: ControlInputs> ControlScanner<I> {
    /// Constructs a [`ControlScanner`] that starts at line 0 with every channel unread.
    pub fn new(inputs: I, config: ScannerConfig) -> Self {
        Self {
            inputs,
            config,
            line: 0,
            analog: [AnalogChannel::default(); AnalogControl::COUNT],
            digital: [Debouncer::default(); DIGITAL_INPUTS as usize],
            pending: ArrayVec::new(),
        }
    }

    /// Reads the next multiplexer line: the potentiometer on that line of each bank, then the three buttons that share
    /// the line's slot in the round robin (`line`, `line + 16` and `line + 32`). Lines and bits that have no control
    /// wired to them are skipped. Changes are queued for [`changes`](Self::changes).
    pub fn scan_once(&mut self, now: Micros) {
        let line = self.line;
        self.line = (line + 1) % MUX_LINES;

        self.inputs.select_line(line);
        for bank in MuxBank::ALL {
            let Some(control) = AnalogControl::at(bank, line) else {
                continue;
            };
            if self.is_full() {
                warn!("Change queue full; deferring potentiometer on line {}", line);
                continue;
            }
            let reading = self.read_oversampled(bank);
            let step = self.config.quantization_step.max(1);
            if let Some(value) = self.analog[control as usize].update(reading, step) {
                trace!("Potentiometer on line {} settled at {}", line, value);
                self.pending.push(ControlChange::Knob { control, value });
            }
        }

        let hold = time_base::interval(self.config.debounce);
        for bit in (line..DIGITAL_INPUTS).step_by(usize::from(MUX_LINES)) {
            let Some(control) = DigitalControl::at(bit) else {
                continue;
            };
            if self.is_full() {
                warn!("Change queue full; deferring button {}", bit);
                continue;
            }
            let level = self.inputs.read_button(bit);
            if let Some(pressed) = self.digital[usize::from(bit)].update(level, now, hold) {
                debug!("Button {} pressed: {}", bit, pressed);
                self.pending.push(ControlChange::Button { control, pressed });
            }
        }
    }

    /// Drains the queued changes, oldest first.
    pub fn changes(&mut self) -> impl Iterator<Item = ControlChange> + '_ {
        self.pending.drain(..)
    }

    /// The value last reported for `control`, or `None` while the control is still settling after startup.
    pub fn value(&self, control: AnalogControl) -> Option<u16> {
        self.analog[control as usize].reported()
    }

    /// Gives access to the hardware front end.
    pub fn inputs_mut(&mut self) -> &mut I {
        &mut self.inputs
    }

    fn is_full(&self) -> bool {
        self.pending.len() == self.pending.capacity()
    }

    /// Averages several conversions to suppress electrical noise on the multiplexer output.
    fn read_oversampled(&mut self, bank: MuxBank) -> u16 {
        let count = self.config.oversampling.max(1);
        let sum: u32 = (0..count)
            .map(|_| u32::from(self.inputs.convert(bank).min(ADC_MAX)))
            .sum();
        // the mean of values that are each at most ADC_MAX fits in u16
        (sum / u32::from(count)) as u16
    }
}
