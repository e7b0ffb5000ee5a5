#[cfg(feature = "rtrb")]
use rtrb::Consumer;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Performance controllers routed into the shared parameter snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    Sustain,
    Expression,
    ModWheel,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    /// `value` is normalised to 0.0..=1.0.
    Controller { kind: ControllerKind, value: f32 },
    AllNotesOff,
}

/// A message tagged with the sample offset, relative to the start of the
/// current `Engine::process` call, at which it takes effect.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimedMessage {
    pub offset: usize,
    pub message: SynthMessage,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
