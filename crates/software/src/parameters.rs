//! The named numeric parameters derived from the panel, and the store that holds them.

use crate::control_surface::{ADC_MAX, AnalogControl, ControlChange};

/// Largest value a parameter can hold; parameters share the 10-bit range of the potentiometers that feed them.
pub const PARAM_MAX: u16 = ADC_MAX;

/// Identifies a parameter in a [`ParameterStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamId {
    /// The value of a panel potentiometer (or of the MIDI controller mapped onto it).
    Knob(AnalogControl),
    /// The mod wheel, which only arrives over MIDI.
    ModWheel,
}

impl ParamId {
    /// How many distinct parameters exist.
    pub const COUNT: usize = AnalogControl::COUNT + 1;

    fn index(self) -> usize {
        match self {
            ParamId::Knob(control) => control as usize,
            ParamId::ModWheel => AnalogControl::COUNT,
        }
    }
}

/// Named numeric parameters: the sink of scanned panel values and the source of the rates the performance engines run at.
pub trait ParameterStore {
    /// Returns the current value of `id`.
    fn get(&self, id: ParamId) -> u16;

    /// Sets `id` to `value`.
    fn set(&mut self, id: ParamId, value: u16);
}

/// A [`ParameterStore`] holding every parameter in a flat array.
///
/// Values above [`PARAM_MAX`] are clamped on the way in, so readers never see an out-of-range value.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelParameters {
    values: [u16; ParamId::COUNT],
}

impl Default for PanelParameters {
    fn default() -> Self {
        Self {
            values: [0; ParamId::COUNT],
        }
    }
}

impl ParameterStore for PanelParameters {
    fn get(&self, id: ParamId) -> u16 {
        self.values[id.index()]
    }

    fn set(&mut self, id: ParamId, value: u16) {
        self.values[id.index()] = value.min(PARAM_MAX);
    }
}

/// Writes a scanned potentiometer value into `store`. Returns `false` for changes that don't map to a parameter
/// (buttons are actions, not values, and are handled by the performance layer).
pub fn apply_change(store: &mut impl ParameterStore, change: ControlChange) -> bool {
    match change {
        ControlChange::Knob { control, value } => {
            store.set(ParamId::Knob(control), value);
            true
        }
        ControlChange::Button { .. } => false,
    }
}
