use super::{CycleConfig, EncoderDirection, KeyMode, Persistence, SettingsSlot};
use crate::midi::ReceiveChannel;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};

const MIDI_CHANNEL_LABELS: [&str; 17] = [
    "All", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
];
const SEMITONE_LABELS: [&str; 12] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];
const ENCODER_LABELS: [&str; 2] = ["Type 1", "Type 2"];
const KEY_MODE_LABELS: [&str; 3] = ["Top", "Bottom", "Last"];

const DEFAULT_PITCH_BEND: u8 = 2;
const DEFAULT_MOD_WHEEL_DEPTH: u8 = 1;
const DEFAULT_LAST_PATCH: u8 = 1;

/// The persisted user settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// MIDI receive channel, 1-16, or 0 for omni.
    pub midi_channel: u8,
    /// Pitch bend range in semitones, 1-12.
    pub pitch_bend_range: u8,
    /// Mod wheel depth, 1-12.
    pub mod_wheel_depth: u8,
    /// How the encoder counts.
    pub encoder_direction: EncoderDirection,
    /// Which held key sounds.
    pub key_mode: KeyMode,
    /// The patch loaded at power-up, 1-255.
    pub last_patch: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            midi_channel: 0,
            pitch_bend_range: DEFAULT_PITCH_BEND,
            mod_wheel_depth: DEFAULT_MOD_WHEEL_DEPTH,
            encoder_direction: EncoderDirection::default(),
            key_mode: KeyMode::default(),
            last_patch: DEFAULT_LAST_PATCH,
        }
    }
}

impl Settings {
    /// Loads every setting from `persistence`. A slot holding an out-of-range byte (such as erased memory) yields that
    /// setting's default.
    pub fn restore(persistence: &impl Persistence) -> Self {
        let defaults = Self::default();
        let settings = Self {
            midi_channel: persistence.load_bounded_byte(SettingsSlot::MidiChannel, 0, 16, defaults.midi_channel),
            pitch_bend_range: persistence.load_bounded_byte(SettingsSlot::PitchBend, 1, 12, DEFAULT_PITCH_BEND),
            mod_wheel_depth: persistence.load_bounded_byte(
                SettingsSlot::ModWheelDepth,
                1,
                12,
                DEFAULT_MOD_WHEEL_DEPTH,
            ),
            encoder_direction: EncoderDirection::from_stored(persistence.load_bounded_byte(
                SettingsSlot::EncoderDirection,
                0,
                1,
                EncoderDirection::default().to_stored(),
            ))
            .unwrap_or_default(),
            key_mode: KeyMode::from_u8(persistence.load_bounded_byte(
                SettingsSlot::KeyMode,
                0,
                2,
                KeyMode::default() as u8,
            ))
            .unwrap_or_default(),
            last_patch: persistence.load_bounded_byte(SettingsSlot::LastPatch, 1, u8::MAX, DEFAULT_LAST_PATCH),
        };
        info!("Restored settings: {}", settings);
        settings
    }

    /// The channel filter for incoming MIDI.
    pub fn receive_channel(&self) -> ReceiveChannel {
        ReceiveChannel::from_setting(self.midi_channel)
    }

    /// Records `patch` as the one to load at power-up. Patch 0 doesn't exist and is ignored.
    pub fn store_last_patch(&mut self, patch: u8, persistence: &mut impl Persistence) {
        if patch != 0 && patch != self.last_patch {
            self.last_patch = patch;
            persistence.store_byte(SettingsSlot::LastPatch, patch);
        }
    }
}

/// The entries of the settings menu.
///
/// Each option knows its name, the names of its values, and how to read and write the [`Settings`] field behind it.
#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsOption {
    /// [`Settings::midi_channel`]
    MidiChannel,
    /// [`Settings::pitch_bend_range`]
    PitchBend,
    /// [`Settings::mod_wheel_depth`]
    ModWheelDepth,
    /// [`Settings::encoder_direction`]
    EncoderDirection,
    /// [`Settings::key_mode`]
    KeyMode,
}
impl CycleConfig for SettingsOption {}

impl SettingsOption {
    /// The option's menu label.
    pub fn label(&self) -> &'static str {
        match self {
            SettingsOption::MidiChannel => "MIDI Ch.",
            SettingsOption::PitchBend => "Pitch Bend",
            SettingsOption::ModWheelDepth => "MW Depth",
            SettingsOption::EncoderDirection => "Encoder",
            SettingsOption::KeyMode => "Key Mode",
        }
    }

    /// Labels of the values the option can take, indexed like [`current_index`](Self::current_index).
    pub fn value_labels(&self) -> &'static [&'static str] {
        match self {
            SettingsOption::MidiChannel => &MIDI_CHANNEL_LABELS,
            SettingsOption::PitchBend | SettingsOption::ModWheelDepth => &SEMITONE_LABELS,
            SettingsOption::EncoderDirection => &ENCODER_LABELS,
            SettingsOption::KeyMode => &KEY_MODE_LABELS,
        }
    }

    fn slot(&self) -> SettingsSlot {
        match self {
            SettingsOption::MidiChannel => SettingsSlot::MidiChannel,
            SettingsOption::PitchBend => SettingsSlot::PitchBend,
            SettingsOption::ModWheelDepth => SettingsSlot::ModWheelDepth,
            SettingsOption::EncoderDirection => SettingsSlot::EncoderDirection,
            SettingsOption::KeyMode => SettingsSlot::KeyMode,
        }
    }

    /// Index into [`value_labels`](Self::value_labels) of the value `settings` holds.
    pub fn current_index(&self, settings: &Settings) -> usize {
        let index = match self {
            SettingsOption::MidiChannel => settings.midi_channel,
            SettingsOption::PitchBend => settings.pitch_bend_range.saturating_sub(1),
            SettingsOption::ModWheelDepth => settings.mod_wheel_depth.saturating_sub(1),
            SettingsOption::EncoderDirection => settings.encoder_direction as u8,
            SettingsOption::KeyMode => settings.key_mode as u8,
        };
        usize::from(index)
    }

    /// Label of the value `settings` holds.
    pub fn current_label(&self, settings: &Settings) -> &'static str {
        self.value_labels()
            .get(self.current_index(settings))
            .copied()
            .unwrap_or("?")
    }

    /// Selects the value at `index`, updating `settings` and storing it through `persistence`. Returns `false`, changing
    /// nothing, if `index` is out of range.
    pub fn apply(&self, index: usize, settings: &mut Settings, persistence: &mut impl Persistence) -> bool {
        let Some(byte) = u8::try_from(index)
            .ok()
            .filter(|_| index < self.value_labels().len())
        else {
            warn!("Ignoring out of range value {} for {}", index, self.label());
            return false;
        };

        match self {
            SettingsOption::MidiChannel => settings.midi_channel = byte,
            SettingsOption::PitchBend => settings.pitch_bend_range = byte + 1,
            SettingsOption::ModWheelDepth => settings.mod_wheel_depth = byte + 1,
            SettingsOption::EncoderDirection => {
                settings.encoder_direction = EncoderDirection::from_u8(byte).unwrap_or_default()
            }
            SettingsOption::KeyMode => settings.key_mode = KeyMode::from_u8(byte).unwrap_or_default(),
        }
        let stored = match self {
            SettingsOption::PitchBend | SettingsOption::ModWheelDepth => byte + 1,
            SettingsOption::EncoderDirection => settings.encoder_direction.to_stored(),
            _ => byte,
        };
        persistence.store_byte(self.slot(), stored);
        info!("{} set to {}", self.label(), self.value_labels()[index]);
        true
    }

    /// Moves the option's value one step forward, wrapping past the last value.
    pub fn step(&self, settings: &mut Settings, persistence: &mut impl Persistence) {
        let next = (self.current_index(settings) + 1) % self.value_labels().len();
        self.apply(next, settings, persistence);
    }

    /// Index of this option in menu order.
    pub fn position(&self) -> usize {
        self.to_usize().unwrap_or_default()
    }
}
