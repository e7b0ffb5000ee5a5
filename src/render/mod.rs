// Purpose: Block rendering. Map every (voice, sample) pair to a stereo frame,
// then reduce the frames into one clipped stereo block.

pub mod executor;
pub mod renderer;

pub use executor::{ParallelExecutor, SequentialExecutor};
#[cfg(feature = "rayon")]
pub use executor::RayonExecutor;
pub use renderer::BlockRenderer;

/// One stereo sample, `[left, right]`.
pub type Frame = [f64; 2];

/// Output samples never leave `-CLIP_LEVEL..=CLIP_LEVEL`.
pub const CLIP_LEVEL: f64 = 0.99;

/// Planar stereo output of one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBlock {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBlock {
    pub fn new(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Resize to `len` samples, all zero.
    pub fn clear(&mut self, len: usize) {
        self.left.clear();
        self.left.resize(len, 0.0);
        self.right.clear();
        self.right.resize(len, 0.0);
    }

    pub fn is_silent(&self) -> bool {
        self.left.iter().chain(&self.right).all(|&s| s == 0.0)
    }

    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }
}

/// Size of the groups handed to the executor.
///
/// `preferred` is capped at the total unit count; when the result does not
/// divide the total evenly the block length is used instead, which always
/// does.
pub fn work_group_size(block_len: usize, active_voices: usize, preferred: usize) -> usize {
    let total = block_len * active_voices;
    if total == 0 {
        return block_len.max(1);
    }
    let group = preferred.clamp(1, total);
    if total % group != 0 {
        block_len
    } else {
        group
    }
}

#[inline]
pub fn clip(sample: f64) -> f64 {
    sample.clamp(-CLIP_LEVEL, CLIP_LEVEL)
}

/// Sum the frames of every voice at sample `index`, scale by `gain`, clip.
#[inline]
pub(crate) fn reduce_sample(units: &[Frame], block_len: usize, index: usize, gain: f64) -> Frame {
    let mut sum = [0.0; 2];
    for frame in units.iter().skip(index).step_by(block_len.max(1)) {
        sum[0] += frame[0];
        sum[1] += frame[1];
    }
    [clip(sum[0] * gain), clip(sum[1] * gain)]
}
