/// A byte of non-volatile settings memory.
///
/// The discriminant is the byte's offset in the settings area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SettingsSlot {
    /// The MIDI receive channel; 0 means omni.
    MidiChannel = 0,
    /// The [`KeyMode`](super::KeyMode).
    KeyMode = 1,
    /// Pitch bend range in semitones.
    PitchBend = 2,
    /// Mod wheel depth.
    ModWheelDepth = 3,
    /// The [`EncoderDirection`](super::EncoderDirection).
    EncoderDirection = 4,
    /// The patch loaded at power-up.
    LastPatch = 5,
}

impl SettingsSlot {
    /// Every slot, in offset order.
    pub const ALL: [SettingsSlot; 6] = [
        SettingsSlot::MidiChannel,
        SettingsSlot::KeyMode,
        SettingsSlot::PitchBend,
        SettingsSlot::ModWheelDepth,
        SettingsSlot::EncoderDirection,
        SettingsSlot::LastPatch,
    ];

    /// Number of bytes the settings area spans.
    pub const COUNT: usize = Self::ALL.len();

    /// Byte offset of the slot in the settings area.
    pub fn offset(self) -> usize {
        self as usize
    }
}

/// Byte-addressed non-volatile storage for settings.
pub trait Persistence {
    /// Reads the raw byte in `slot`. Erased memory reads as whatever the medium erases to.
    fn load_byte(&self, slot: SettingsSlot) -> u8;

    /// Writes `value` to `slot`.
    fn store_byte(&mut self, slot: SettingsSlot, value: u8);

    /// Reads `slot`, substituting `default` when the stored byte lies outside `min..=max` (e.g. never written).
    fn load_bounded_byte(&self, slot: SettingsSlot, min: u8, max: u8, default: u8) -> u8 {
        let value = self.load_byte(slot);
        if (min..=max).contains(&value) {
            value
        } else {
            debug!("Settings slot {} out of range; using default", slot);
            default
        }
    }
}
