use thiserror::Error;

/// Errors raised while dispatching work across the pool
#[derive(Error, Debug)]
pub enum ParallelError {
    /// Invalid dispatch configuration, reported before any worker starts
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The task returned an error for one work item
    #[error("task failed on work item {index}: {source:#}")]
    Task {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// The task panicked while evaluating one work item
    #[error("task panicked on work item {index}: {message}")]
    Panic { index: usize, message: String },

    /// The per-chunk setup callback failed for the chunk starting at `index`
    #[error("setup failed for chunk starting at work item {index}: {source:#}")]
    Setup {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to spawn worker thread {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker pool shut down with {outstanding} chunk(s) unreported")]
    Disconnected { outstanding: usize },

    #[error("a worker thread panicked outside of a task")]
    Teardown,
}

impl ParallelError {
    /// Position of the failing work item, for task-level failures
    pub fn index(&self) -> Option<usize> {
        match self {
            ParallelError::Task { index, .. }
            | ParallelError::Panic { index, .. }
            | ParallelError::Setup { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ParallelError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ParallelError>;
