use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// Number of address lines on each analog multiplexer.
pub const MUX_LINES: u8 = 16;

/// Number of inputs on the shift-register chain that carries the panel buttons and switches.
pub const DIGITAL_INPUTS: u8 = 48;

/// Identifies one of the two analog multiplexers. Both share the same address lines and feed separate ADC inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxBank {
    /// Oscillator 1, filter, LFO and master controls.
    One,
    /// Oscillator 2 and the two envelope generators.
    Two,
}

impl MuxBank {
    /// Both banks, in scan order.
    pub const ALL: [MuxBank; 2] = [MuxBank::One, MuxBank::Two];
}

/// Physical location of an analog control: which multiplexer it is wired to and on which line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogAddress {
    /// The multiplexer.
    pub bank: MuxBank,
    /// The multiplexer line, `0..MUX_LINES`.
    pub line: u8,
}

const fn at(bank: MuxBank, line: u8) -> AnalogAddress {
    AnalogAddress { bank, line }
}

/// The potentiometers on the panel.
///
/// Lines 10–15 of the first multiplexer and 13–15 of the second are not wired to anything and have no identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogControl {
    /// Keyboard glide time.
    KbGlide,
    /// Modulation LFO rate; also the step rate of the performance engines.
    LfoRate,
    /// Oscillator 1 mixer level.
    Osc1Level,
    /// Filter cutoff frequency.
    Cutoff,
    /// Filter emphasis (resonance).
    Emphasis,
    /// Filter contour amount.
    ContourAmount,
    /// Oscillator 1 pulse width.
    Osc1PulseWidth,
    /// Oscillator 1 pulse width modulation depth.
    Osc1Pwm,
    /// Noise mixer level.
    Noise,
    /// Master volume.
    Volume,
    /// Oscillator 2 mixer level.
    Osc2Level,
    /// Filter envelope attack.
    FilterAttack,
    /// Filter envelope decay.
    FilterDecay,
    /// Filter envelope sustain.
    FilterSustain,
    /// Filter envelope release.
    FilterRelease,
    /// Oscillator 2 interval (detune against oscillator 1).
    Interval,
    /// Oscillator 2 pulse width.
    Osc2PulseWidth,
    /// Oscillator 2 pulse width modulation depth.
    Osc2Pwm,
    /// Amplifier envelope attack.
    AmpAttack,
    /// Amplifier envelope decay.
    AmpDecay,
    /// Amplifier envelope sustain.
    AmpSustain,
    /// Amplifier envelope release.
    AmpRelease,
    /// Rate of the LFO dedicated to pulse width modulation.
    PwLfoRate,
}

/// Addresses of every [`AnalogControl`], indexed by the control's discriminant.
const ANALOG_ADDRESSES: [AnalogAddress; AnalogControl::COUNT] = [
    at(MuxBank::One, 0),
    at(MuxBank::One, 1),
    at(MuxBank::One, 2),
    at(MuxBank::One, 3),
    at(MuxBank::One, 4),
    at(MuxBank::One, 5),
    at(MuxBank::One, 6),
    at(MuxBank::One, 7),
    at(MuxBank::One, 8),
    at(MuxBank::One, 9),
    at(MuxBank::Two, 0),
    at(MuxBank::Two, 1),
    at(MuxBank::Two, 2),
    at(MuxBank::Two, 3),
    at(MuxBank::Two, 4),
    at(MuxBank::Two, 5),
    at(MuxBank::Two, 6),
    at(MuxBank::Two, 7),
    at(MuxBank::Two, 8),
    at(MuxBank::Two, 9),
    at(MuxBank::Two, 10),
    at(MuxBank::Two, 11),
    at(MuxBank::Two, 12),
];

impl AnalogControl {
    /// How many potentiometers the panel has.
    pub const COUNT: usize = 23;

    /// Where this control is wired.
    pub fn address(self) -> AnalogAddress {
        ANALOG_ADDRESSES[self as usize]
    }

    /// Looks up the control wired to `line` of `bank`, if any.
    pub fn at(bank: MuxBank, line: u8) -> Option<Self> {
        ANALOG_ADDRESSES
            .iter()
            .position(|&address| address == AnalogAddress { bank, line })
            .and_then(|index| Self::from_usize(index))
    }
}

/// The buttons and switches on the panel, numbered by their position on the shift-register chain.
///
/// Inputs 6, 7 and 23 are not connected and have no identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DigitalControl {
    /// Oscillator 1 footage 32'.
    Osc1Foot32 = 0,
    /// Oscillator 1 footage 16'.
    Osc1Foot16 = 1,
    /// Oscillator 1 footage 8'.
    Osc1Foot8 = 2,
    /// Oscillator 1 sawtooth wave.
    Osc1Saw = 3,
    /// Oscillator 1 triangle wave.
    Osc1Triangle = 4,
    /// Oscillator 1 pulse wave.
    Osc1Pulse = 5,
    /// Single envelope trigger (legato).
    SingleTrigger = 8,
    /// Multiple envelope trigger.
    MultipleTrigger = 9,
    /// LFO triangle wave.
    LfoTriangle = 10,
    /// LFO square wave.
    LfoSquare = 11,
    /// Oscillator sync off.
    SyncOff = 12,
    /// Oscillator sync on.
    SyncOn = 13,
    /// Keyboard octave 0.
    Octave0 = 14,
    /// Keyboard octave +1.
    Octave1 = 15,
    /// Filter keyboard tracking off.
    KbOff = 16,
    /// Filter keyboard tracking half.
    KbHalf = 17,
    /// Filter keyboard tracking full.
    KbFull = 18,
    /// Oscillator 2 footage 8'.
    Osc2Foot8 = 19,
    /// Oscillator 2 sawtooth wave.
    Osc2Saw = 20,
    /// Oscillator 2 triangle wave.
    Osc2Triangle = 21,
    /// Oscillator 2 pulse wave.
    Osc2Pulse = 22,
    /// LFO to oscillators off.
    LfoOscOff = 24,
    /// LFO to oscillators on.
    LfoOscOn = 25,
    /// Oscillator 2 footage 32'.
    Osc2Foot32 = 26,
    /// Oscillator 2 footage 16'.
    Osc2Foot16 = 27,
    /// Mixer level mode 1.
    Level1 = 28,
    /// Mixer level mode 2.
    Level2 = 29,
    /// LFO to filter off.
    LfoVcfOff = 30,
    /// LFO to filter on.
    LfoVcfOn = 31,
    /// Programmer button 1.
    Button1 = 32,
    /// Programmer button 2.
    Button2 = 33,
    /// Programmer button 3.
    Button3 = 34,
    /// Programmer button 4.
    Button4 = 35,
    /// Programmer button 5.
    Button5 = 36,
    /// Programmer button 6.
    Button6 = 37,
    /// Programmer button 7.
    Button7 = 38,
    /// Programmer button 8.
    Button8 = 39,
    /// Programmer button 9: arpeggiator on/off.
    Button9 = 40,
    /// Programmer button 10.
    Button10 = 41,
    /// Programmer button 11.
    Button11 = 42,
    /// Programmer button 12: insert a rest while recording a sequence.
    Button12 = 43,
    /// Programmer button 13: record sequence 1.
    Button13 = 44,
    /// Programmer button 14: play sequence 1.
    Button14 = 45,
    /// Programmer button 15: record sequence 2.
    Button15 = 46,
    /// Programmer button 16: play sequence 2.
    Button16 = 47,
}

impl DigitalControl {
    /// Position of this control on the shift-register chain.
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// Looks up the control wired to position `bit` of the shift-register chain, if any.
    pub fn at(bit: u8) -> Option<Self> {
        Self::from_u8(bit)
    }
}
