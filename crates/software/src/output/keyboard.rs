use core::ops::RangeInclusive;
use measurements::Voltage;
use wmidi::Note;

/// Describes how the voice's keyboard CV input expects notes: which notes it can play and how many volts separate
/// one octave from the next.
///
/// The conversion is the ideal exponential-converter scale; trimming the DAC output against the real oscillators is
/// done in hardware.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardCv {
    playable_range: RangeInclusive<Note>,
    voltage_per_octave: Voltage,
}

impl KeyboardCv {
    /// Constructs a [`KeyboardCv`].
    ///
    /// The bookend [`Note`]s of the range should be ordered as on a keyboard, lowest first.
    pub fn new(playable_range: RangeInclusive<Note>, voltage_per_octave: Voltage) -> Self {
        Self {
            playable_range,
            voltage_per_octave,
        }
    }

    /// Returns `true` if `note` lies within the playable range.
    pub fn can_voice(&self, note: Note) -> bool {
        self.playable_range.contains(&note)
    }

    fn voltage_per_half_step(&self) -> Voltage {
        self.voltage_per_octave / 12.0
    }

    /// Returns the [`Voltage`] that makes the voice play `note`.
    ///
    /// Notes outside the playable range are folded by octaves into it, so an arpeggio played too high or too low keeps its
    /// shape instead of piling up on the bookend notes.
    pub fn voltage(&self, note: Note) -> Voltage {
        let low = u8::from(*self.playable_range.start());
        let high = u8::from(*self.playable_range.end());
        let mut key = u8::from(note);
        while key < low && key + 12 <= high {
            key += 12;
        }
        while key > high && key - 12 >= low {
            key -= 12;
        }
        let nth_key = key.clamp(low, high) - low;
        nth_key as f64 * self.voltage_per_half_step()
    }
}
