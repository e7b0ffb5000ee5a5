// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

pub use converter::midi_to_synth;
pub use midi::MidiEvent;
