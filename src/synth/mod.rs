// Purpose: Voice pool, energy lifecycle, shared instrument parameters
// This layer sits above the dsp model and feeds the block renderer

pub mod manager;
pub mod message;
pub mod params;
pub mod voice;

pub use manager::VoiceManager;
pub use message::{ControllerKind, MessageReceiver, SynthMessage, TimedMessage};
pub use params::{InstrumentParameters, Param, SharedParameters};
pub use voice::{Voice, VoiceState};
