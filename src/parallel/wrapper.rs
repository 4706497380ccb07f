//! Function wrapper that turns a per-element task into a whole-sequence call

use super::core::{DispatchConfig, Dispatcher};
use super::error::Result;
use super::progress::ProgressMode;
use super::work::{expand, expand_indexed};

/// Wrap `task` so it can be applied to a whole input sequence in parallel.
///
/// ```
/// use parallelize::parallelize;
///
/// let square = parallelize(|x: u64| -> anyhow::Result<u64> { Ok(x * x) }).workers(2);
/// assert_eq!(square.call(vec![1, 2, 3]).unwrap(), vec![1, 4, 9]);
///
/// let label = parallelize(|(s, i): (&str, usize)| -> anyhow::Result<String> {
///     Ok(format!("{i}:{s}"))
/// });
/// assert_eq!(label.call_indexed(vec!["a", "b"]).unwrap(), vec!["0:a", "1:b"]);
/// ```
pub fn parallelize<F>(task: F) -> Parallelized<F> {
    Parallelized::new(task)
}

/// A task paired with the configuration used to dispatch it
#[derive(Debug, Clone)]
pub struct Parallelized<F> {
    task: F,
    config: DispatchConfig,
    sequential: bool,
}

impl<F> Parallelized<F> {
    pub fn new(task: F) -> Self {
        Self {
            task,
            config: DispatchConfig::default(),
            sequential: false,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn progress(mut self, mode: ProgressMode) -> Self {
        self.config.progress = mode;
        self
    }

    /// Evaluate on the calling thread instead of a worker pool
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    fn dispatcher(&self) -> Result<Dispatcher> {
        if self.sequential {
            Dispatcher::sequential(self.config.clone())
        } else {
            Dispatcher::new(self.config.clone())
        }
    }

    /// Apply the task to every element, returning results in input order
    pub fn call<T, R>(&self, data: Vec<T>) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> anyhow::Result<R> + Sync,
    {
        self.dispatcher()?.run(expand(data), &self.task)
    }

    /// Apply the task to every `(element, position)` pair
    pub fn call_indexed<T, R>(&self, data: Vec<T>) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn((T, usize)) -> anyhow::Result<R> + Sync,
    {
        self.dispatcher()?.run(expand_indexed(data), &self.task)
    }

    /// Consume the wrapper into a plain function over whole sequences
    pub fn into_fn<T, R>(self) -> impl Fn(Vec<T>) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> anyhow::Result<R> + Sync,
    {
        move |data: Vec<T>| self.call(data)
    }

    /// Like [`Parallelized::into_fn`], with index injection
    pub fn into_indexed_fn<T, R>(self) -> impl Fn(Vec<T>) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn((T, usize)) -> anyhow::Result<R> + Sync,
    {
        move |data: Vec<T>| self.call_indexed(data)
    }
}
