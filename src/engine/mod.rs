// Purpose: Render boundary. Owns the voice manager, delivers timed events and
// pulls blocks for the host.

pub mod scheduler;

use self::scheduler::Scheduler;
use crate::{
    config::EngineConfig,
    error::ConfigError,
    render::{BlockRenderer, ParallelExecutor, StereoBlock},
    synth::{
        manager::VoiceManager,
        message::{MessageReceiver, SynthMessage, TimedMessage},
        params::SharedParameters,
    },
};

pub struct Engine {
    manager: VoiceManager,
    scheduler: Scheduler,
    params: SharedParameters,
    block_size: usize,
    sample_rate: f64,
}

impl Engine {
    /// Build an engine with the default executor for the enabled features.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        #[cfg(feature = "rayon")]
        let executor: Box<dyn ParallelExecutor> = match config.render_threads {
            Some(threads) if threads > 0 => {
                Box::new(crate::render::RayonExecutor::with_threads(threads)?)
            }
            _ => Box::new(crate::render::RayonExecutor::new()),
        };
        #[cfg(not(feature = "rayon"))]
        let executor: Box<dyn ParallelExecutor> = Box::new(crate::render::SequentialExecutor);
        Self::with_executor(config, executor)
    }

    pub fn with_executor(
        config: EngineConfig,
        executor: Box<dyn ParallelExecutor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let params = SharedParameters::new(config.instrument);
        let renderer = BlockRenderer::new(
            executor,
            config.sample_rate,
            config.block_size,
            config.max_voices,
            config.preferred_group_size,
        );
        let manager = VoiceManager::new(&config, params.clone(), renderer);

        tracing::info!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            voices = config.max_voices,
            executor = manager.executor_name(),
            "engine ready"
        );

        Ok(Self {
            manager,
            scheduler: Scheduler::new(),
            params,
            block_size: config.block_size,
            sample_rate: config.sample_rate,
        })
    }

    /// Handle for reading and setting instrument parameters from any thread.
    pub fn parameters(&self) -> SharedParameters {
        self.params.clone()
    }

    /// Queue `message` to take effect `offset` samples into the next
    /// `process` call.
    pub fn schedule(&mut self, offset: usize, message: SynthMessage) {
        self.scheduler.enqueue(TimedMessage { offset, message });
    }

    /// Drain `rx`, queueing everything at the start of the next `process` call.
    pub fn receive<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            self.schedule(0, message);
        }
    }

    /// Fill planar `left`/`right` with consecutive blocks. Only the common
    /// length of the two buffers is written.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let mut start = 0;
        while start < len {
            let n = (len - start).min(self.block_size);
            let block = self.render(n);
            left[start..start + n].copy_from_slice(&block.left[..n]);
            right[start..start + n].copy_from_slice(&block.right[..n]);
            start += n;
        }
    }

    /// Render one full block.
    pub fn render_block(&mut self) -> &StereoBlock {
        self.render(self.block_size)
    }

    fn render(&mut self, len: usize) -> &StereoBlock {
        self.manager.begin_block(len);
        let len = self.manager.block_len();
        for i in 0..len {
            while let Some(message) = self.scheduler.pop_due(i) {
                self.dispatch(message);
            }
            self.manager.update_voice_damping_and_energy(i);
        }
        self.scheduler.tick(len);

        // Freeing before the pull would drop the last samples of a dying voice.
        self.manager.get_block_of_samples();
        self.manager.set_free_inaudible_voices();
        self.manager.last_block()
    }

    fn dispatch(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn { note, velocity: 0 } => self.manager.on_note_off(note, 0),
            SynthMessage::NoteOn { note, velocity } => self.manager.on_note_on(note, velocity),
            SynthMessage::NoteOff { note, velocity } => self.manager.on_note_off(note, velocity),
            SynthMessage::Controller { kind, value } => {
                self.manager.on_controller_change(kind, value as f64)
            }
            SynthMessage::AllNotesOff => {
                self.scheduler.clear();
                self.manager.all_notes_off();
            }
        }
    }

    pub fn voice_manager(&self) -> &VoiceManager {
        &self.manager
    }

    pub fn active_voice_count(&self) -> usize {
        self.manager.active_voice_count()
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
