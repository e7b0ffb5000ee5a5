use crate::{
    io::midi::MidiEvent,
    synth::message::{ControllerKind, SynthMessage},
};

pub const CC_MOD_WHEEL: u8 = 1;
pub const CC_EXPRESSION: u8 = 11;
pub const CC_SUSTAIN: u8 = 64;
pub const CC_ALL_NOTES_OFF: u8 = 123;

pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }
    match midi {
        // Velocity 0 is a note-off by convention.
        MidiEvent::NoteOn { key, velocity: 0, .. } => Some(SynthMessage::NoteOff {
            note: key,
            velocity: 0,
        }),
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff { key, velocity, .. } => Some(SynthMessage::NoteOff {
            note: key,
            velocity,
        }),
        MidiEvent::ControlChange {
            controller, value, ..
        } => {
            let kind = match controller {
                CC_MOD_WHEEL => ControllerKind::ModWheel,
                CC_EXPRESSION => ControllerKind::Expression,
                CC_SUSTAIN => ControllerKind::Sustain,
                CC_ALL_NOTES_OFF => return Some(SynthMessage::AllNotesOff),
                _ => return None,
            };
            Some(SynthMessage::Controller {
                kind,
                value: value as f32 / 127.0,
            })
        }
        _ => None,
    }
}
