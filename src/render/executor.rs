#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::{reduce_sample, Frame};

/// Runs the two stages of block rendering.
///
/// `map` fills every slot of `units` with `unit(index)`, in groups of
/// `group_size` (which always divides `units.len()`). `reduce` sums voice
/// frames per sample position. Both return only after all work is done.
pub trait ParallelExecutor: Send {
    fn map(&self, units: &mut [Frame], group_size: usize, unit: &(dyn Fn(usize) -> Frame + Sync));

    /// `units` holds `units.len() / out.len()` voices of `out.len()` samples each.
    fn reduce(&self, units: &[Frame], gain: f64, out: &mut [Frame]) {
        let block_len = out.len();
        for (i, frame) in out.iter_mut().enumerate() {
            *frame = reduce_sample(units, block_len, i, gain);
        }
    }

    fn name(&self) -> &'static str;
}

/// Evaluates every unit on the calling thread, in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl ParallelExecutor for SequentialExecutor {
    fn map(&self, units: &mut [Frame], group_size: usize, unit: &(dyn Fn(usize) -> Frame + Sync)) {
        for (g, group) in units.chunks_mut(group_size.max(1)).enumerate() {
            let base = g * group_size;
            for (j, slot) in group.iter_mut().enumerate() {
                *slot = unit(base + j);
            }
        }
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Spreads work groups over a rayon pool.
///
/// Without an explicit pool the global one is used.
#[cfg(feature = "rayon")]
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

#[cfg(feature = "rayon")]
impl RayonExecutor {
    pub fn new() -> Self {
        Self { pool: None }
    }

    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dulcimer-render-{i}"))
            .build()?;
        Ok(Self { pool: Some(pool) })
    }

    fn run<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

#[cfg(feature = "rayon")]
impl ParallelExecutor for RayonExecutor {
    fn map(&self, units: &mut [Frame], group_size: usize, unit: &(dyn Fn(usize) -> Frame + Sync)) {
        let group_size = group_size.max(1);
        self.run(|| {
            units
                .par_chunks_mut(group_size)
                .enumerate()
                .for_each(|(g, group)| {
                    let base = g * group_size;
                    for (j, slot) in group.iter_mut().enumerate() {
                        *slot = unit(base + j);
                    }
                });
        });
    }

    fn reduce(&self, units: &[Frame], gain: f64, out: &mut [Frame]) {
        let block_len = out.len();
        self.run(|| {
            out.par_iter_mut()
                .enumerate()
                .for_each(|(i, frame)| *frame = reduce_sample(units, block_len, i, gain));
        });
    }

    fn name(&self) -> &'static str {
        "rayon"
    }
}
