//! Decoding of incoming USB-MIDI into the few events the voice responds to.

use crate::{
    control_surface::AnalogControl,
    parameters::{PARAM_MAX, ParamId},
};
use wmidi::{Channel, ControlFunction, MidiMessage, Note, U7};

/// The MIDI messages the voice acts on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MidiEvent {
    /// A key was pressed with the given velocity (never 0).
    NoteOn(Note, U7),
    /// A key was released. A note-on with velocity 0 arrives as this too.
    NoteOff(Note),
    /// Controller 123: release everything.
    AllNotesOff,
    /// Any other controller.
    ControlChange(ControlFunction, U7),
}

/// Which MIDI channels the voice listens to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReceiveChannel {
    /// Every channel.
    #[default]
    Omni,
    /// Only this channel.
    Only(Channel),
}

impl ReceiveChannel {
    /// Interprets the persisted MIDI channel setting: 1-16 selects that channel, anything else listens to all of them.
    pub fn from_setting(setting: u8) -> Self {
        match setting {
            1..=16 => Channel::from_index(setting - 1).map_or(ReceiveChannel::Omni, ReceiveChannel::Only),
            _ => ReceiveChannel::Omni,
        }
    }

    /// Returns `true` if messages on `channel` should be acted on.
    pub fn accepts(&self, channel: Channel) -> bool {
        match self {
            ReceiveChannel::Omni => true,
            ReceiveChannel::Only(only) => *only == channel,
        }
    }
}

/// Decodes `data`, which holds one or more 32-bit USB-MIDI Event Packets, into the events the voice acts on.
///
/// Truncated or malformed packets are logged and skipped, as are messages on channels `channel` doesn't accept and
/// message types the voice has no use for.
pub fn events(data: &[u8], channel: ReceiveChannel) -> impl Iterator<Item = MidiEvent> + '_ {
    data.chunks(4).filter_map(move |packet| {
        if packet.len() != 4 {
            warn!("USB-MIDI Event Packets must always be 32 bits long");
            return None;
        }
        // the zeroth byte is the Packet Header, which carries nothing of interest; the remaining three bytes hold the
        // MIDI message
        match MidiMessage::from_bytes(&packet[1..]) {
            Ok(message) => decode(&message, channel),
            Err(_) => {
                debug!("Skipping malformed USB-MIDI packet {}", packet);
                None
            }
        }
    })
}

fn decode(message: &MidiMessage, filter: ReceiveChannel) -> Option<MidiEvent> {
    let event = match *message {
        MidiMessage::NoteOn(channel, note, velocity) if filter.accepts(channel) => {
            if u8::from(velocity) == 0 {
                MidiEvent::NoteOff(note)
            } else {
                MidiEvent::NoteOn(note, velocity)
            }
        }
        MidiMessage::NoteOff(channel, note, _) if filter.accepts(channel) => MidiEvent::NoteOff(note),
        MidiMessage::ControlChange(channel, function, value) if filter.accepts(channel) => {
            if function == ControlFunction::ALL_NOTES_OFF {
                MidiEvent::AllNotesOff
            } else {
                MidiEvent::ControlChange(function, value)
            }
        }
        _ => return None,
    };
    Some(event)
}

/// The parameter controller `function` sets, if any. The numbering broadly follows the General MIDI assignments.
pub fn parameter_for(function: ControlFunction) -> Option<ParamId> {
    use AnalogControl::*;

    let control = match u8::from(function) {
        1 => return Some(ParamId::ModWheel),
        7 => Volume,
        8 => KbGlide,
        16 => Osc1PulseWidth,
        17 => Osc2PulseWidth,
        18 => Osc1Pwm,
        19 => Osc2Pwm,
        23 => Noise,
        44 => FilterRelease,
        45 => FilterAttack,
        46 => FilterSustain,
        47 => FilterDecay,
        48 => ContourAmount,
        72 | 98 => AmpRelease,
        73 | 95 => AmpAttack,
        74 => Cutoff,
        75 | 96 => AmpDecay,
        77 => LfoRate,
        79 | 97 => AmpSustain,
        81 => Osc2Level,
        90 => PwLfoRate,
        93 => Interval,
        94 => Emphasis,
        103 => Osc1Level,
        _ => return None,
    };
    Some(ParamId::Knob(control))
}

/// Widens a 7-bit controller value to the 10-bit parameter range, mapping 0 to 0 and 127 to [`PARAM_MAX`].
pub fn scale_controller(value: U7) -> u16 {
    let value = u16::from(u8::from(value));
    ((value << 3) | (value >> 4)).min(PARAM_MAX)
}
