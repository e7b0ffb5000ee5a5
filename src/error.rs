use thiserror::Error;

/// Reasons an [`crate::EngineConfig`] cannot be turned into an engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sample rate must be positive and finite (got {0})")]
    InvalidSampleRate(f64),
    #[error("block size must be between 1 and {max} (got {got})")]
    InvalidBlockSize { got: usize, max: usize },
    #[error("voice pool needs at least one voice")]
    NoVoices,
    #[error("preferred work group size must be at least 1")]
    InvalidGroupSize,
    #[error("render pool needs at least one thread")]
    NoRenderThreads,
    #[error("release damping must be positive and finite (got {0})")]
    InvalidReleaseDamping(f64),
    #[error("release ramp must be non-negative and finite (got {0} s)")]
    InvalidReleaseRamp(f64),
    #[cfg(feature = "rayon")]
    #[error("failed to build render thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
