//! Phrase - a list of timed notes turned into sample-offset messages

use dulcimer::synth::SynthMessage;

const ARPEGGIO: [u8; 8] = [48, 55, 60, 64, 67, 72, 76, 79];

#[derive(Debug, Clone, Copy)]
pub struct NoteEvent {
    pub note: u8,
    pub velocity: u8,
    pub start: f64,
    pub length: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Phrase {
    pub notes: Vec<NoteEvent>,
}

impl Phrase {
    pub fn from_notes(notes: &[u8], step: f64, hold: f64, velocity: u8) -> Self {
        let step = step.max(0.0);
        let hold = hold.max(0.0);
        let velocity = velocity.clamp(1, 127);
        Self {
            notes: notes
                .iter()
                .enumerate()
                .map(|(i, &note)| NoteEvent {
                    note: note.min(127),
                    velocity,
                    start: i as f64 * step,
                    length: hold,
                })
                .collect(),
        }
    }

    pub fn arpeggio(step: f64, hold: f64, velocity: u8) -> Self {
        Self::from_notes(&ARPEGGIO, step, hold, velocity)
    }

    /// Time of the last note-off, in seconds.
    pub fn duration(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.start + n.length)
            .fold(0.0, f64::max)
    }

    /// All note-on and note-off messages as `(sample, message)`, sorted.
    pub fn messages(&self, sample_rate: f64) -> Vec<(u64, SynthMessage)> {
        let at = |secs: f64| (secs * sample_rate).round() as u64;
        let mut out: Vec<(u64, SynthMessage)> = self
            .notes
            .iter()
            .flat_map(|n| {
                [
                    (
                        at(n.start),
                        SynthMessage::NoteOn {
                            note: n.note,
                            velocity: n.velocity,
                        },
                    ),
                    (
                        at(n.start + n.length),
                        SynthMessage::NoteOff {
                            note: n.note,
                            velocity: 0,
                        },
                    ),
                ]
            })
            .collect();
        out.sort_by_key(|(sample, _)| *sample);
        out
    }
}
